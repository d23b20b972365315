//! Dictionary-based renaming of curve names.
//!
//! Names without an entry pass through unchanged. The map is not required to
//! be injective; two names renamed to the same target collide later, last
//! write wins.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{CurveError, CurveResult};
use crate::transfer::{ensure_parent, read_metadata, Metadata, TransferDocument};

pub const NAME_MAPPING_DOCUMENT: &str = "namemapping.json";
pub const NAME_MAPPING_TABLE: &str = "mapping.json";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NameMapping {
    pub metadata: Metadata,
    map: IndexMap<String, String>,
}

impl NameMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mapping(&self) -> &IndexMap<String, String> {
        &self.map
    }

    pub fn update<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in pairs {
            self.map.insert(k.into(), v.into());
        }
    }

    pub fn rename<'a>(&'a self, name: &'a str) -> &'a str {
        self.map.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn rename_all<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        names
            .iter()
            .map(|n| self.rename(n.as_ref()).to_string())
            .collect()
    }

    /// Destination -> source. Only a true inverse when the map is a bijection.
    pub fn inverted(&self) -> NameMapping {
        NameMapping {
            metadata: self.metadata.clone(),
            map: self.map.iter().map(|(k, v)| (v.clone(), k.clone())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn set_from_json_path(&mut self, path: &Path) -> CurveResult<()> {
        let text = fs::read_to_string(path).map_err(|e| CurveError::io(path, e))?;
        self.map = serde_json::from_str(&text).map_err(|e| CurveError::json(path, e))?;
        Ok(())
    }

    /// Open a saved mapping item directory.
    pub fn from_path(dir: &Path) -> CurveResult<Self> {
        let mut mapping = NameMapping {
            metadata: read_metadata(&dir.join(NAME_MAPPING_DOCUMENT))?,
            map: IndexMap::new(),
        };
        mapping.set_from_json_path(&dir.join(NAME_MAPPING_TABLE))?;
        Ok(mapping)
    }

    pub fn save(&self, dir: &Path) -> CurveResult<()> {
        TransferDocument {
            metadata: self.metadata.clone(),
        }
        .write(&dir.join(NAME_MAPPING_DOCUMENT))?;

        let table = dir.join(NAME_MAPPING_TABLE);
        ensure_parent(&table)?;
        let text = serde_json::to_string(&self.map).map_err(|e| CurveError::json(&table, e))?;
        fs::write(&table, text).map_err(|e| CurveError::io(&table, e))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NameMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = NameMapping::new();
        mapping.update(iter);
        mapping
    }
}

/// Build a mapping from pairs and metadata, then save it to `dir`.
pub fn save_name_mapping<K, V>(
    dir: &Path,
    pairs: impl IntoIterator<Item = (K, V)>,
    metadata: Option<&Metadata>,
) -> CurveResult<NameMapping>
where
    K: Into<String>,
    V: Into<String>,
{
    let mut mapping = NameMapping::new();
    if let Some(metadata) = metadata {
        mapping.metadata.update(metadata);
    }
    mapping.update(pairs);
    mapping.save(dir)?;
    Ok(mapping)
}
