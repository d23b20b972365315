//! Curve store: owns captured curve data and replays it onto a scene.
//!
//! Load pipeline, strictly ordered:
//! 1. up to two chained data transforms (slot 1 then slot 2)
//! 2. optional name mapping (positions of the pre-rename keys are kept)
//! 3. curve-to-attribute matching against the destination objects
//! 4. paste option resolution
//! 5. validation (namespaces, at least one live attribute, source window) before any mutation
//! 6. temporary curves under the scratch namespace
//! 7. undo chunk, start frame and source/destination windows
//! 8. boundary keys when not replacing completely
//! 9. paste onto every existing destination attribute
//! 10. cleanup when the scratch session drops, on every exit path

use log::{debug, info, warn};

use crate::config::{LoadOptions, StoreConfig};
use crate::curve_data::{CurveData, CurveMap};
use crate::error::{CurveError, CurveResult};
use crate::host::{HostError, KeyframeHost, PasteArgs, PasteOption, TimeRange};
use crate::mapping::NameMapping;
use crate::matching::{match_curve_names, CurveMatch};
use crate::naming::AttrRef;
use crate::scratch::ScratchSession;
use crate::transform::DataTransform;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum LoadStage {
    TransformApplied,
    Renamed,
    Matched,
    Validated,
    Opened,
    Applied,
}

/// Everything one `load` call needs besides the host.
#[derive(Clone, Debug, Default)]
pub struct LoadRequest<'a> {
    pub objects: Vec<String>,
    pub namespaces: Vec<String>,
    pub options: LoadOptions,
    pub transforms: [Option<&'a DataTransform>; 2],
    pub name_mapping: Option<&'a NameMapping>,
}

impl<'a> LoadRequest<'a> {
    pub fn new<S: Into<String>>(objects: impl IntoIterator<Item = S>) -> Self {
        Self {
            objects: objects.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_namespaces<S: Into<String>>(mut self, namespaces: impl IntoIterator<Item = S>) -> Self {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Set transform slot 0 or 1; other slots are ignored.
    pub fn with_transform(mut self, slot: usize, transform: &'a DataTransform) -> Self {
        if let Some(entry) = self.transforms.get_mut(slot) {
            *entry = Some(transform);
        }
        self
    }

    pub fn with_name_mapping(mut self, mapping: &'a NameMapping) -> Self {
        self.name_mapping = Some(mapping);
        self
    }
}

/// Outcome of a successful load.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadReport {
    pub matches: Vec<CurveMatch>,
    pub applied: Vec<AttrRef>,
    /// Matched attributes left untouched: missing at paste time, or without a temporary curve.
    pub skipped: Vec<AttrRef>,
    /// Paste calls the host rejected; remaining matches still ran.
    pub failed: Vec<(AttrRef, HostError)>,
    pub option: PasteOption,
    pub source_time: TimeRange,
    pub destination_time: TimeRange,
}

#[derive(Clone, Debug, Default)]
pub struct CurveStore {
    data: CurveData,
    config: StoreConfig,
}

impl CurveStore {
    pub fn new(data: CurveData) -> Self {
        Self {
            data,
            config: StoreConfig::default(),
        }
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn data(&self) -> &CurveData {
        &self.data
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Apply the configured transforms and renaming; the stored data is left untouched.
    pub fn prepare_curves(&self, request: &LoadRequest<'_>) -> CurveMap {
        let mut curves = self.data.curves().clone();
        for (slot, transform) in request.transforms.iter().enumerate() {
            if let Some(transform) = transform {
                curves = transform.apply_list(&curves);
                debug!("Data transform {} produced {} curves", slot + 1, curves.len());
            }
        }
        trace_stage(LoadStage::TransformApplied);

        if let Some(mapping) = request.name_mapping {
            curves = rename_curves(&curves, mapping);
        }
        trace_stage(LoadStage::Renamed);
        curves
    }

    /// Replay the stored curves onto the destination objects.
    ///
    /// Fails with [`CurveError::NoMatchFound`] before any scene mutation when no
    /// matched attribute exists or every matched curve is empty, and with
    /// [`CurveError::InvalidTimeRange`] when the source window is inverted. Temporary curves, their namespace and the undo
    /// chunk are cleaned up on every path once created.
    pub fn load<H: KeyframeHost + ?Sized>(
        &self,
        host: &mut H,
        request: &LoadRequest<'_>,
    ) -> CurveResult<LoadReport> {
        let label = self.label();
        info!("Loading: {label}");

        let curves = self.prepare_curves(request);

        let objects = destination_objects(host, request);
        let names: Vec<String> = curves.keys().cloned().collect();
        let mut matches = match_curve_names(host, &names, &objects);
        matches.retain(|m| {
            let has_frames = curves.get(&m.curve).is_some_and(|v| !v.is_empty());
            if !has_frames {
                debug!("Ignoring {} -> {}: the curve has no frames", m.curve, m.dst);
            }
            has_frames
        });
        for m in &matches {
            debug!("Matched {} -> {} (score {})", m.curve, m.dst, m.score);
        }
        trace_stage(LoadStage::Matched);

        let option = request.options.paste_option()?;
        debug!(
            "CurveStore.load(objects={}, option={}, namespaces={:?}, srcTime={:?}, currentTime={})",
            objects.len(),
            option,
            request.namespaces,
            request.options.source_time,
            request.options.current_time
        );

        validate_namespaces(host, &request.namespaces)?;
        if !matches.iter().any(|m| host.attribute_exists(&m.dst)) {
            return Err(CurveError::NoMatchFound);
        }
        let nominal = request
            .options
            .source_time
            .unwrap_or_else(|| TimeRange::new(0, self.data.total_frames() as i64 - 1));
        if !nominal.is_valid() {
            return Err(CurveError::InvalidTimeRange {
                start: nominal.start,
                end: nominal.end,
            });
        }
        trace_stage(LoadStage::Validated);

        let mut session = ScratchSession::begin(host, &self.config.scratch, &self.config.focus_target);
        for m in &matches {
            if let Some(values) = curves.get(&m.curve) {
                session.materialize(&m.curve, values)?;
            }
        }

        session.open_undo();
        trace_stage(LoadStage::Opened);

        let start_frame = match request.options.start_frame {
            Some(frame) => Some(frame),
            None if request.options.current_time => Some(session.host_ref().current_time()),
            None => None,
        };
        let temp_curves = session.curve_names();
        let source_time = session
            .host_ref()
            .first_last_keyframes(&temp_curves, nominal)
            .unwrap_or(nominal);
        let destination_time = source_time.shifted_to(start_frame);

        if option != PasteOption::ReplaceCompletely {
            for curve in &temp_curves {
                session.host().insert_keyframe(curve, source_time.start)?;
                session.host().insert_keyframe(curve, source_time.end)?;
            }
        }

        let args = PasteArgs {
            time: destination_time,
            option,
            source: source_time,
            connect: request.options.connect,
        };
        let pasted = paste_matches(&mut session, &matches, args);
        trace_stage(LoadStage::Applied);

        drop(session);
        info!("Loaded: {label}");

        Ok(LoadReport {
            matches,
            applied: pasted.applied,
            skipped: pasted.skipped,
            failed: pasted.failed,
            option,
            source_time,
            destination_time,
        })
    }

    fn label(&self) -> String {
        self.data
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unsaved curve data>".to_string())
    }
}

#[derive(Debug, Default)]
struct Pasted {
    applied: Vec<AttrRef>,
    skipped: Vec<AttrRef>,
    failed: Vec<(AttrRef, HostError)>,
}

/// Paste each match's temporary curve; a rejected paste does not stop the rest.
fn paste_matches<H: KeyframeHost + ?Sized>(
    session: &mut ScratchSession<'_, H>,
    matches: &[CurveMatch],
    args: PasteArgs,
) -> Pasted {
    let mut pasted = Pasted::default();
    for m in matches {
        if !session.host_ref().attribute_exists(&m.dst) {
            debug!(
                "Skipping attribute: The destination attribute \"{}\" does not exist!",
                m.dst
            );
            pasted.skipped.push(m.dst.clone());
            continue;
        }
        let Some(curve) = session.curve(&m.curve).map(str::to_string) else {
            debug!("Skipping {}: no temporary curve for {}", m.dst, m.curve);
            pasted.skipped.push(m.dst.clone());
            continue;
        };
        match session.host().paste_curve(&curve, &m.dst, args) {
            Ok(()) => pasted.applied.push(m.dst.clone()),
            Err(e) => {
                warn!("Failed to paste {} onto {}: {e}", m.curve, m.dst);
                pasted.failed.push((m.dst.clone(), e));
            }
        }
    }
    pasted
}

/// Rename every key, keeping the position of its pre-rename key. Collisions keep the last value.
pub fn rename_curves(curves: &CurveMap, mapping: &NameMapping) -> CurveMap {
    let old: Vec<&String> = curves.keys().collect();
    let new = mapping.rename_all(&old);
    let mut renamed = CurveMap::with_capacity(curves.len());
    for (old_name, new_name) in old.into_iter().zip(new) {
        if let Some(values) = curves.get(old_name) {
            renamed.insert(new_name, values.clone());
        }
    }
    renamed
}

/// Requested objects, or every object in the requested namespaces when none are given.
fn destination_objects<H: KeyframeHost + ?Sized>(host: &H, request: &LoadRequest<'_>) -> Vec<String> {
    if !request.objects.is_empty() {
        return request.objects.clone();
    }
    request
        .namespaces
        .iter()
        .filter(|ns| !ns.is_empty())
        .flat_map(|ns| host.list_objects(&format!("{ns}:")))
        .collect()
}

/// At least one requested namespace must exist; no request means no constraint.
fn validate_namespaces<H: KeyframeHost + ?Sized>(host: &H, namespaces: &[String]) -> CurveResult<()> {
    let in_scope: Vec<&String> = namespaces
        .iter()
        .filter(|ns| !ns.is_empty() && ns.as_str() != ":")
        .collect();
    match in_scope.first() {
        None => Ok(()),
        Some(first) => {
            if in_scope.iter().any(|ns| host.namespace_exists(ns)) {
                Ok(())
            } else {
                Err(CurveError::NamespaceNotFound {
                    namespace: (*first).clone(),
                })
            }
        }
    }
}

#[inline]
fn trace_stage(stage: LoadStage) {
    debug!("load stage: {stage:?}");
}
