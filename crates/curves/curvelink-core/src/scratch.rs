//! Scratch namespace for temporary curves and its session lifecycle.
//!
//! Temporary curves live under one reserved namespace owned by the store.
//! Leftovers from an interrupted run are swept when a session begins, and
//! everything is swept again when the session is dropped. Only one session
//! per host and namespace may be in flight.

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::CurveResult;
use crate::host::KeyframeHost;

/// Reserved namespace and base name for temporary curves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScratchSpace {
    pub namespace: String,
    pub curve_name: String,
}

impl Default for ScratchSpace {
    fn default() -> Self {
        Self {
            namespace: "CURVELINK_IMPORT".to_string(),
            curve_name: "CURVE".to_string(),
        }
    }
}

impl ScratchSpace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// A namespace no other store will pick.
    pub fn unique() -> Self {
        Self::new(format!("CURVELINK_IMPORT_{}", uuid::Uuid::new_v4().simple()))
    }

    /// Host object prefix shared by every temporary curve.
    pub fn prefix(&self) -> String {
        format!("{}:", self.namespace)
    }

    /// Delete every object under the namespace, then the namespace itself.
    pub fn sweep<H: KeyframeHost + ?Sized>(&self, host: &mut H) {
        let nodes = host.list_objects(&self.prefix());
        if !nodes.is_empty() {
            debug!("Removing {} scratch objects from {}", nodes.len(), self.namespace);
            if let Err(e) = host.delete_objects(&nodes) {
                warn!("Failed to delete scratch objects: {e}");
            }
        }
        if host.namespace_exists(&self.namespace) {
            if let Err(e) = host.remove_namespace(&self.namespace) {
                warn!("Failed to remove scratch namespace {}: {e}", self.namespace);
            }
        }
    }
}

/// Temporary curves and the undo chunk of one load.
///
/// Dropping the session deletes the curves and their namespace, closes the
/// undo chunk if it was opened and hands focus back to the host UI, on every
/// exit path.
pub struct ScratchSession<'h, H: KeyframeHost + ?Sized> {
    host: &'h mut H,
    space: ScratchSpace,
    focus_target: String,
    curves: IndexMap<String, String>,
    undo_open: bool,
}

impl<'h, H: KeyframeHost + ?Sized> ScratchSession<'h, H> {
    pub fn begin(host: &'h mut H, space: &ScratchSpace, focus_target: &str) -> Self {
        space.sweep(host);
        Self {
            host,
            space: space.clone(),
            focus_target: focus_target.to_string(),
            curves: IndexMap::new(),
            undo_open: false,
        }
    }

    pub fn host(&mut self) -> &mut H {
        &mut *self.host
    }

    pub fn host_ref(&self) -> &H {
        &*self.host
    }

    /// Create a temporary curve keyed literally at frames 0..n. One curve per source name.
    pub fn materialize(&mut self, source: &str, values: &[f64]) -> CurveResult<()> {
        if self.curves.contains_key(source) {
            return Ok(());
        }
        if !self.host.namespace_exists(&self.space.namespace) {
            self.host.create_namespace(&self.space.namespace)?;
        }
        let requested = format!("{}{}", self.space.prefix(), self.space.curve_name);
        let curve = self.host.create_curve(&requested)?;
        self.curves.insert(source.to_string(), curve.clone());
        for (frame, value) in values.iter().enumerate() {
            self.host.set_keyframe(&curve, frame as i64, *value)?;
        }
        Ok(())
    }

    /// Host name of the temporary curve built for `source`.
    pub fn curve(&self, source: &str) -> Option<&str> {
        self.curves.get(source).map(String::as_str)
    }

    pub fn curve_names(&self) -> Vec<String> {
        self.curves.values().cloned().collect()
    }

    /// Flush history and open the single undo chunk of this load.
    pub fn open_undo(&mut self) {
        if !self.undo_open {
            self.host.flush_undo();
            self.host.open_undo_chunk();
            self.undo_open = true;
        }
    }
}

impl<H: KeyframeHost + ?Sized> Drop for ScratchSession<'_, H> {
    fn drop(&mut self) {
        self.space.sweep(&mut *self.host);
        if self.undo_open {
            self.host.close_undo_chunk();
        }
        self.host.set_focus(&self.focus_target);
    }
}
