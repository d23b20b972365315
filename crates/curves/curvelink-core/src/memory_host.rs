//! In-memory keyframe host.
//!
//! A small scene model that satisfies the [`KeyframeHost`] contract without a
//! content-creation application: objects with keyable attributes, namespaces,
//! keyframe curves, undo chunk bookkeeping and a log of every paste. Used by
//! the load pipeline tests and handy for offline tooling.

use std::collections::BTreeMap;

use hashbrown::HashSet;
use indexmap::IndexMap;

use crate::host::{HostError, KeyframeHost, PasteArgs, PasteOption, TimeRange};
use crate::naming::{AttrRef, NodeRef};

/// Keys of one curve, by frame.
pub type Keys = BTreeMap<i64, f64>;

/// One recorded paste call.
#[derive(Clone, Debug, PartialEq)]
pub struct PasteRecord {
    pub curve: String,
    pub dst: AttrRef,
    pub args: PasteArgs,
}

/// Undo bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UndoStats {
    pub flushes: usize,
    pub opened: usize,
    pub closed: usize,
}

impl UndoStats {
    pub fn depth(&self) -> usize {
        self.opened.saturating_sub(self.closed)
    }
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    objects: IndexMap<String, Vec<String>>,
    namespaces: HashSet<String>,
    curves: IndexMap<String, Keys>,
    animation: IndexMap<AttrRef, Keys>,
    current_time: i64,
    undo: UndoStats,
    pastes: Vec<PasteRecord>,
    failing: HashSet<AttrRef>,
    failing_ops: HashSet<&'static str>,
    focus: Option<String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scene object with keyable attributes; its namespace is registered.
    pub fn with_object(mut self, name: &str, attrs: &[&str]) -> Self {
        self.add_object(name, attrs);
        self
    }

    pub fn add_object(&mut self, name: &str, attrs: &[&str]) {
        let namespace = NodeRef::new(name).namespace().to_string();
        if !namespace.is_empty() {
            self.namespaces.insert(namespace);
        }
        self.objects
            .insert(name.to_string(), attrs.iter().map(|a| a.to_string()).collect());
    }

    pub fn remove_attribute(&mut self, object: &str, attr: &str) {
        if let Some(attrs) = self.objects.get_mut(object) {
            attrs.retain(|a| a != attr);
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespaces.insert(namespace.to_string());
        self
    }

    pub fn set_current_time(&mut self, time: i64) {
        self.current_time = time;
    }

    /// Make every paste onto `attr` fail.
    pub fn fail_paste_on(&mut self, attr: AttrRef) {
        self.failing.insert(attr);
    }

    /// Make every call of a host operation (`"insert_keyframe"`, ...) fail.
    pub fn fail_operation(&mut self, operation: &'static str) {
        self.failing_ops.insert(operation);
    }

    /// Pre-existing animation on a destination attribute.
    pub fn set_animation(&mut self, attr: AttrRef, keys: &[(i64, f64)]) {
        self.animation.insert(attr, keys.iter().copied().collect());
    }

    pub fn animation(&self, attr: &AttrRef) -> Option<&Keys> {
        self.animation.get(attr)
    }

    pub fn curve_keys(&self, curve: &str) -> Option<&Keys> {
        self.curves.get(curve)
    }

    pub fn pastes(&self) -> &[PasteRecord] {
        &self.pastes
    }

    pub fn undo(&self) -> UndoStats {
        self.undo
    }

    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    fn name_taken(&self, name: &str) -> bool {
        self.objects.contains_key(name) || self.curves.contains_key(name)
    }

    fn unique_name(&self, requested: &str) -> String {
        if !self.name_taken(requested) {
            return requested.to_string();
        }
        (1..)
            .map(|i| format!("{requested}{i}"))
            .find(|candidate| !self.name_taken(candidate))
            .unwrap_or_else(|| requested.to_string())
    }

    fn check(&self, operation: &'static str) -> Result<(), HostError> {
        if self.failing_ops.contains(operation) {
            return Err(HostError::new(operation, "injected failure"));
        }
        Ok(())
    }

    fn curve_mut(&mut self, curve: &str, operation: &'static str) -> Result<&mut Keys, HostError> {
        self.check(operation)?;
        self.curves
            .get_mut(curve)
            .ok_or_else(|| HostError::new(operation, format!("no curve named {curve}")))
    }
}

/// Value held at `time`: the previous key, else the first key, else 0.
fn held_value(keys: &Keys, time: i64) -> f64 {
    keys.range(..=time)
        .next_back()
        .or_else(|| keys.iter().next())
        .map(|(_, v)| *v)
        .unwrap_or(0.0)
}

impl KeyframeHost for MemoryHost {
    fn create_curve(&mut self, name: &str) -> Result<String, HostError> {
        self.check("create_curve")?;
        let namespace = NodeRef::new(name).namespace().to_string();
        if !namespace.is_empty() && !self.namespaces.contains(&namespace) {
            return Err(HostError::new(
                "create_curve",
                format!("namespace {namespace} does not exist"),
            ));
        }
        let actual = self.unique_name(name);
        self.curves.insert(actual.clone(), Keys::new());
        Ok(actual)
    }

    fn set_keyframe(&mut self, curve: &str, time: i64, value: f64) -> Result<(), HostError> {
        self.curve_mut(curve, "set_keyframe")?.insert(time, value);
        Ok(())
    }

    fn insert_keyframe(&mut self, curve: &str, time: i64) -> Result<(), HostError> {
        let keys = self.curve_mut(curve, "insert_keyframe")?;
        if !keys.contains_key(&time) {
            let value = held_value(keys, time);
            keys.insert(time, value);
        }
        Ok(())
    }

    fn list_objects(&self, prefix: &str) -> Vec<String> {
        self.objects
            .keys()
            .chain(self.curves.keys())
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn delete_objects(&mut self, names: &[String]) -> Result<(), HostError> {
        for name in names {
            let removed = self.objects.shift_remove(name).is_some()
                || self.curves.shift_remove(name).is_some();
            if !removed {
                return Err(HostError::new(
                    "delete_objects",
                    format!("no object named {name}"),
                ));
            }
        }
        Ok(())
    }

    fn namespace_exists(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }

    fn create_namespace(&mut self, namespace: &str) -> Result<(), HostError> {
        if !self.namespaces.insert(namespace.to_string()) {
            return Err(HostError::new(
                "create_namespace",
                format!("namespace {namespace} already exists"),
            ));
        }
        Ok(())
    }

    fn remove_namespace(&mut self, namespace: &str) -> Result<(), HostError> {
        if !self.list_objects(&format!("{namespace}:")).is_empty() {
            return Err(HostError::new(
                "remove_namespace",
                format!("namespace {namespace} is not empty"),
            ));
        }
        if !self.namespaces.remove(namespace) {
            return Err(HostError::new(
                "remove_namespace",
                format!("namespace {namespace} does not exist"),
            ));
        }
        Ok(())
    }

    fn current_time(&self) -> i64 {
        self.current_time
    }

    fn flush_undo(&mut self) {
        self.undo.flushes += 1;
    }

    fn open_undo_chunk(&mut self) {
        self.undo.opened += 1;
    }

    fn close_undo_chunk(&mut self) {
        self.undo.closed += 1;
    }

    fn attribute_exists(&self, attr: &AttrRef) -> bool {
        self.objects
            .get(attr.node.name())
            .is_some_and(|attrs| attrs.iter().any(|a| a == &attr.attr))
    }

    fn keyable_attributes(&self, object: &str) -> Vec<String> {
        self.objects.get(object).cloned().unwrap_or_default()
    }

    fn first_last_keyframes(&self, curves: &[String], window: TimeRange) -> Option<TimeRange> {
        if !window.is_valid() {
            return None;
        }
        let times = curves
            .iter()
            .filter_map(|c| self.curves.get(c))
            .flat_map(|keys| keys.range(window.start..=window.end).map(|(t, _)| *t));
        let mut range: Option<TimeRange> = None;
        for t in times {
            range = Some(match range {
                None => TimeRange::new(t, t),
                Some(r) => TimeRange::new(r.start.min(t), r.end.max(t)),
            });
        }
        range
    }

    fn paste_curve(
        &mut self,
        curve: &str,
        dst: &AttrRef,
        args: PasteArgs,
    ) -> Result<(), HostError> {
        self.check("paste_curve")?;
        if self.failing.contains(dst) {
            return Err(HostError::new("paste_curve", format!("{dst} is locked")));
        }
        if !self.attribute_exists(dst) {
            return Err(HostError::new(
                "paste_curve",
                format!("{dst} does not exist"),
            ));
        }
        if !args.source.is_valid() {
            return Err(HostError::new(
                "paste_curve",
                format!("source window {}..{} is inverted", args.source.start, args.source.end),
            ));
        }
        let source = self
            .curves
            .get(curve)
            .ok_or_else(|| HostError::new("paste_curve", format!("no curve named {curve}")))?;

        let offset = args.time.start - args.source.start;
        let pasted: Vec<(i64, f64)> = source
            .range(args.source.start..=args.source.end)
            .map(|(t, v)| (t + offset, *v))
            .collect();

        let keys = self.animation.entry(dst.clone()).or_default();
        match args.option {
            PasteOption::ReplaceCompletely => keys.clear(),
            PasteOption::Replace => keys.retain(|t, _| !args.time.contains(*t)),
            PasteOption::Insert => {
                let span = args.source.end - args.source.start + 1;
                let shifted: Keys = keys
                    .iter()
                    .map(|(t, v)| if *t >= args.time.start { (t + span, *v) } else { (*t, *v) })
                    .collect();
                *keys = shifted;
            }
            PasteOption::Merge => {}
        }
        keys.extend(pasted);

        self.pastes.push(PasteRecord {
            curve: curve.to_string(),
            dst: dst.clone(),
            args,
        });
        Ok(())
    }

    fn set_focus(&mut self, target: &str) {
        self.focus = Some(target.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_curves_get_unique_names() {
        let mut host = MemoryHost::new().with_namespace("TMP");
        let a = host.create_curve("TMP:CURVE").expect("first curve");
        let b = host.create_curve("TMP:CURVE").expect("second curve");
        assert_eq!(a, "TMP:CURVE");
        assert_eq!(b, "TMP:CURVE1");
        assert!(host.create_curve("MISSING:CURVE").is_err());
    }

    #[test]
    fn non_empty_namespace_cannot_be_removed() {
        let mut host = MemoryHost::new().with_namespace("TMP");
        let c = host.create_curve("TMP:CURVE").expect("curve");
        assert!(host.remove_namespace("TMP").is_err());
        host.delete_objects(&[c]).expect("delete");
        assert!(host.remove_namespace("TMP").is_ok());
        assert!(!host.namespace_exists("TMP"));
    }

    #[test]
    fn first_last_keyframes_respect_window() {
        let mut host = MemoryHost::new();
        let a = host.create_curve("a").expect("curve a");
        let b = host.create_curve("b").expect("curve b");
        for t in 0..5 {
            host.set_keyframe(&a, t, 1.0).expect("key a");
        }
        host.set_keyframe(&b, 7, 1.0).expect("key b");
        let r = host.first_last_keyframes(&[a, b], TimeRange::new(2, 9));
        assert_eq!(r, Some(TimeRange::new(2, 7)));
    }

    #[test]
    fn inverted_windows_are_rejected_without_panicking() {
        let mut host = MemoryHost::new().with_object("jaw", &["translateY"]);
        let c = host.create_curve("c").expect("curve");
        host.set_keyframe(&c, 1, 1.0).expect("key");
        assert_eq!(host.first_last_keyframes(&[c.clone()], TimeRange::new(2, 0)), None);

        let args = PasteArgs {
            time: TimeRange::new(2, 0),
            option: PasteOption::Merge,
            source: TimeRange::new(2, 0),
            connect: false,
        };
        let dst = AttrRef::new("jaw", "translateY");
        assert!(host.paste_curve(&c, &dst, args).is_err());
        assert!(host.animation(&dst).is_none());
        assert!(host.pastes().is_empty());
    }
}
