//! Item library: saved curve data, transforms and name mappings on disk.
//!
//! Every item is a directory named `<name>.<kind extension>` anywhere below the
//! library root. Directory names are matched case-sensitively.

use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::config::{LoadOptions, StoreConfig};
use crate::curve_data::CurveData;
use crate::error::{CurveError, CurveResult};
use crate::host::KeyframeHost;
use crate::mapping::NameMapping;
use crate::store::{CurveStore, LoadReport, LoadRequest};
use crate::transform::DataTransform;

/// Choice shown first in item pickers; selects nothing.
pub const NONE_CHOICE: &str = "none";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    CurveData,
    DataTransform,
    NameMapping,
}

impl ItemKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ItemKind::CurveData => "curvedata",
            ItemKind::DataTransform => "datatransform",
            ItemKind::NameMapping => "namemapping",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::CurveData => "curve data",
            ItemKind::DataTransform => "data transform",
            ItemKind::NameMapping => "name mapping",
        }
    }
}

/// One item directory found in the library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryItem {
    pub kind: ItemKind,
    pub name: String,
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory where a new item named `name` would be saved.
    pub fn item_path(&self, kind: ItemKind, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{}", kind.extension()))
    }

    /// Every item of `kind`, sorted by name then path. Unreadable entries are skipped.
    pub fn items(&self, kind: ItemKind) -> Vec<LibraryItem> {
        let mut items: Vec<LibraryItem> = WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .filter_map(|e| {
                let path = e.path();
                if path.extension().and_then(|s| s.to_str()) != Some(kind.extension()) {
                    return None;
                }
                let name = path.file_stem()?.to_string_lossy().to_string();
                Some(LibraryItem {
                    kind,
                    name,
                    path: path.to_path_buf(),
                })
            })
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        debug!("Library {}: {} {} items", self.root.display(), items.len(), kind.label());
        items
    }

    /// First item of `kind` named exactly `name`.
    pub fn find(&self, kind: ItemKind, name: &str) -> CurveResult<LibraryItem> {
        self.items(kind)
            .into_iter()
            .find(|item| item.name == name)
            .ok_or_else(|| CurveError::ItemNotFound {
                kind: kind.label().to_string(),
                name: name.to_string(),
            })
    }

    /// Picker choices: `"none"` followed by every item name of `kind`.
    pub fn item_names(&self, kind: ItemKind) -> Vec<String> {
        std::iter::once(NONE_CHOICE.to_string())
            .chain(self.items(kind).into_iter().map(|item| item.name))
            .collect()
    }

    pub fn open_curve_data(&self, name: &str) -> CurveResult<CurveData> {
        CurveData::from_path(&self.find(ItemKind::CurveData, name)?.path)
    }

    pub fn open_data_transform(&self, name: &str) -> CurveResult<DataTransform> {
        DataTransform::from_path(&self.find(ItemKind::DataTransform, name)?.path)
    }

    pub fn open_name_mapping(&self, name: &str) -> CurveResult<NameMapping> {
        NameMapping::from_path(&self.find(ItemKind::NameMapping, name)?.path)
    }
}

/// Load dialog state for a saved curve data item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LibraryLoad {
    pub data_transform1: Option<String>,
    pub data_transform2: Option<String>,
    pub name_mapping: Option<String>,
    pub objects: Vec<String>,
    pub namespaces: Vec<String>,
    pub options: LoadOptions,
}

impl LibraryLoad {
    /// Open the referenced items and replay the curve data at `item` onto `host`.
    pub fn run<H: KeyframeHost + ?Sized>(
        &self,
        library: &Library,
        item: &Path,
        host: &mut H,
        config: &StoreConfig,
    ) -> CurveResult<LoadReport> {
        let transform1 = selected(&self.data_transform1)
            .map(|name| library.open_data_transform(name))
            .transpose()?;
        let transform2 = selected(&self.data_transform2)
            .map(|name| library.open_data_transform(name))
            .transpose()?;
        let mapping = selected(&self.name_mapping)
            .map(|name| library.open_name_mapping(name))
            .transpose()?;

        let store = CurveStore::new(CurveData::from_path(item)?).with_config(config.clone());

        let mut request = LoadRequest::new(self.objects.iter().cloned())
            .with_namespaces(self.namespaces.iter().cloned())
            .with_options(self.options.clone());
        if let Some(t) = &transform1 {
            request = request.with_transform(0, t);
        }
        if let Some(t) = &transform2 {
            request = request.with_transform(1, t);
        }
        if let Some(m) = &mapping {
            request = request.with_name_mapping(m);
        }
        store.load(host, &request)
    }
}

/// Picker value, with `"none"` and the empty string meaning unset.
fn selected(choice: &Option<String>) -> Option<&str> {
    choice
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != NONE_CHOICE)
}
