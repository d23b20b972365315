//! Keyframe host seam.
//!
//! The content-creation application owns the scene, the keyframe engine, the
//! undo stack and the UI. Adapters implement [`KeyframeHost`] and hand it to
//! [`crate::store::CurveStore::load`]; the core never touches a scene directly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CurveError;
use crate::naming::AttrRef;

/// Error reported by a host call.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{operation}: {reason}")]
pub struct HostError {
    pub operation: String,
    pub reason: String,
}

impl HostError {
    pub fn new(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

impl From<HostError> for CurveError {
    fn from(err: HostError) -> Self {
        CurveError::Host {
            operation: err.operation,
            reason: err.reason,
        }
    }
}

/// Semantics used when writing captured keys over an existing destination curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PasteOption {
    Replace,
    #[default]
    ReplaceCompletely,
    Insert,
    Merge,
}

impl PasteOption {
    /// Host vocabulary for this option.
    pub fn as_str(&self) -> &'static str {
        match self {
            PasteOption::Replace => "replace",
            PasteOption::ReplaceCompletely => "replaceCompletely",
            PasteOption::Insert => "insert",
            PasteOption::Merge => "merge",
        }
    }

    /// Resolve the dialog value; unset means a complete replace.
    pub fn resolve(option: Option<&str>) -> Result<Self, CurveError> {
        match option {
            None => Ok(PasteOption::ReplaceCompletely),
            Some(text) => text.parse(),
        }
    }
}

impl FromStr for PasteOption {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(PasteOption::Replace),
            "replace all" | "replaceall" | "replacecompletely" => {
                Ok(PasteOption::ReplaceCompletely)
            }
            "insert" => Ok(PasteOption::Insert),
            "merge" => Ok(PasteOption::Merge),
            _ => Err(CurveError::InvalidOption {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for PasteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive integer frame window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Same length, starting at `start` when given.
    pub fn shifted_to(self, start: Option<i64>) -> Self {
        match start {
            Some(start) => TimeRange {
                start,
                end: start + (self.end - self.start),
            },
            None => self,
        }
    }

    #[inline]
    pub fn contains(&self, time: i64) -> bool {
        time >= self.start && time <= self.end
    }

    /// Start is not after end.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}

/// Arguments of one paste call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PasteArgs {
    /// Destination window.
    pub time: TimeRange,
    pub option: PasteOption,
    /// Window copied from the source curve.
    pub source: TimeRange,
    pub connect: bool,
}

/// Operations the load pipeline needs from the host application.
pub trait KeyframeHost {
    /// Create an empty keyframe curve; returns the name the host actually assigned.
    fn create_curve(&mut self, name: &str) -> Result<String, HostError>;

    fn set_keyframe(&mut self, curve: &str, time: i64, value: f64) -> Result<(), HostError>;

    /// Insert a key at `time` keeping the curve's current shape.
    fn insert_keyframe(&mut self, curve: &str, time: i64) -> Result<(), HostError>;

    /// Objects whose name starts with `prefix`.
    fn list_objects(&self, prefix: &str) -> Vec<String>;

    fn delete_objects(&mut self, names: &[String]) -> Result<(), HostError>;

    fn namespace_exists(&self, namespace: &str) -> bool;

    fn create_namespace(&mut self, namespace: &str) -> Result<(), HostError>;

    fn remove_namespace(&mut self, namespace: &str) -> Result<(), HostError>;

    fn current_time(&self) -> i64;

    fn flush_undo(&mut self);

    fn open_undo_chunk(&mut self);

    fn close_undo_chunk(&mut self);

    fn attribute_exists(&self, attr: &AttrRef) -> bool;

    /// Keyable attribute names of `object` (empty when the object is missing).
    fn keyable_attributes(&self, object: &str) -> Vec<String>;

    /// First and last keyed frames of `curves` inside `window`.
    fn first_last_keyframes(&self, curves: &[String], window: TimeRange) -> Option<TimeRange>;

    fn paste_curve(&mut self, curve: &str, dst: &AttrRef, args: PasteArgs)
        -> Result<(), HostError>;

    fn set_focus(&mut self, target: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_replace_all_maps_to_replace_completely() {
        assert_eq!(
            "replace all".parse::<PasteOption>().ok(),
            Some(PasteOption::ReplaceCompletely)
        );
        assert_eq!(
            PasteOption::resolve(None).ok(),
            Some(PasteOption::ReplaceCompletely)
        );
        assert_eq!(
            "replaceCompletely".parse::<PasteOption>().ok(),
            Some(PasteOption::ReplaceCompletely)
        );
        assert_eq!("Merge".parse::<PasteOption>().ok(), Some(PasteOption::Merge));
        assert!("overwrite".parse::<PasteOption>().is_err());
    }

    #[test]
    fn shifting_keeps_window_length() {
        let src = TimeRange::new(3, 10);
        assert_eq!(src.shifted_to(Some(100)), TimeRange::new(100, 107));
        assert_eq!(src.shifted_to(None), src);
    }
}
