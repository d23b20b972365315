//! Error types for curve transfer operations

use std::path::Path;

/// Error type for loading, saving and applying curve data
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CurveError {
    /// No saved curve could be paired with an existing destination attribute
    #[error("No objects match when loading data. Turn on debug logging to see more details.")]
    NoMatchFound,

    /// A requested destination namespace is not present in the scene
    #[error("The namespace \"{namespace}\" does not exist in the scene")]
    NamespaceNotFound { namespace: String },

    /// A cell in the curve table could not be read as a number
    #[error("Invalid value {cell:?} for curve \"{curve}\" at row {row}")]
    InvalidValue {
        curve: String,
        row: usize,
        cell: String,
    },

    /// A named library item could not be found
    #[error("No {kind} item named \"{name}\" in the library")]
    ItemNotFound { kind: String, name: String },

    /// A frame window whose start lies after its end
    #[error("Invalid time range: start {start} is after end {end}")]
    InvalidTimeRange { start: i64, end: i64 },

    /// Unknown paste option text
    #[error("Invalid paste option: {value}")]
    InvalidOption { value: String },

    /// Filesystem error
    #[error("IO error at {path}: {reason}")]
    Io { path: String, reason: String },

    /// Malformed tabular document
    #[error("CSV error at {path}: {reason}")]
    Csv { path: String, reason: String },

    /// Malformed metadata or mapping document
    #[error("JSON error at {path}: {reason}")]
    Json { path: String, reason: String },

    /// The keyframe host rejected an operation
    #[error("Host error during {operation}: {reason}")]
    Host { operation: String, reason: String },
}

impl CurveError {
    pub(crate) fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn csv(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Csv {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn json(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Json {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }

    /// Whether the user can fix the problem from the load dialog and retry
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoMatchFound
                | Self::NamespaceNotFound { .. }
                | Self::InvalidOption { .. }
                | Self::InvalidTimeRange { .. }
                | Self::ItemNotFound { .. }
        )
    }

    /// Error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::NoMatchFound | Self::NamespaceNotFound { .. } => "matching",
            Self::InvalidValue { .. }
            | Self::InvalidOption { .. }
            | Self::InvalidTimeRange { .. } => "validation",
            Self::Io { .. } | Self::Csv { .. } | Self::Json { .. } => "io",
            Self::ItemNotFound { .. } => "library",
            Self::Host { .. } => "host",
        }
    }
}

/// Result alias used across the crate
pub type CurveResult<T> = Result<T, CurveError>;
