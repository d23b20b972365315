use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    library: String,
    #[serde(rename = "curve-data")]
    curve_data: HashMap<String, String>,
    #[serde(rename = "data-transforms")]
    data_transforms: HashMap<String, String>,
    #[serde(rename = "name-mappings")]
    name_mappings: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn lookup<'a>(map: &'a HashMap<String, String>, kind: &str, name: &str) -> Result<&'a str> {
    map.get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Root of the fixture item library.
pub fn library_root() -> PathBuf {
    resolve_path(&MANIFEST.library)
}

pub mod curve_data {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.curve_data.keys().cloned().collect()
    }

    /// Item directory holding `curvedata.csv` and `curvedata.json`.
    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.curve_data, "curve data", name)?;
        Ok(resolve_path(rel))
    }

    pub fn csv(name: &str) -> Result<String> {
        read_to_string(&path(name)?.join("curvedata.csv"))
    }
}

pub mod transforms {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.data_transforms.keys().cloned().collect()
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.data_transforms, "data transform", name)?;
        Ok(resolve_path(rel))
    }

    pub fn csv(name: &str) -> Result<String> {
        read_to_string(&path(name)?.join("datatransform.csv"))
    }
}

pub mod mappings {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.name_mappings.keys().cloned().collect()
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let rel = lookup(&MANIFEST.name_mappings, "name mapping", name)?;
        Ok(resolve_path(rel))
    }

    pub fn json(name: &str) -> Result<String> {
        read_to_string(&path(name)?.join("mapping.json"))
    }

    pub fn load(name: &str) -> Result<HashMap<String, String>> {
        let text = json(name)?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse name mapping fixture {name}"))
    }
}
