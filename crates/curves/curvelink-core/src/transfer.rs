//! Metadata documents shared by every saved item kind.
//!
//! Each item directory holds a small JSON document (`{"metadata": {...}}`)
//! next to its tabular payload.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CurveError, CurveResult};

/// Ordered free-form metadata (description, transform method, ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(IndexMap<String, serde_json::Value>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// String value for `key`; non-string values are not coerced.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn update(&mut self, other: &Metadata) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn description(&self) -> &str {
        self.get_str("description").unwrap_or("")
    }

    pub fn method(&self) -> &str {
        self.get_str("method").unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<serde_json::Value>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Metadata(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// On-disk metadata document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferDocument {
    #[serde(default)]
    pub metadata: Metadata,
}

impl TransferDocument {
    pub fn read(path: &Path) -> CurveResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| CurveError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| CurveError::json(path, e))
    }

    /// Write as pretty JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> CurveResult<()> {
        ensure_parent(path)?;
        let text = serde_json::to_string_pretty(self).map_err(|e| CurveError::json(path, e))?;
        fs::write(path, text).map_err(|e| CurveError::io(path, e))
    }
}

pub(crate) fn ensure_parent(path: &Path) -> CurveResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| CurveError::io(parent, e))?;
        }
    }
    Ok(())
}

/// Read the metadata document if it exists; a missing file yields empty metadata.
pub(crate) fn read_metadata(path: &Path) -> CurveResult<Metadata> {
    if path.exists() {
        Ok(TransferDocument::read(path)?.metadata)
    } else {
        Ok(Metadata::new())
    }
}
