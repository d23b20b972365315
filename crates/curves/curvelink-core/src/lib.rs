//! Curvelink Core (host-agnostic)
//!
//! Captured animation curves are stored as a CSV table plus a JSON metadata
//! document, reshaped through weighted data transforms and name mappings, and
//! replayed onto a scene through the [`KeyframeHost`] seam. The host adapter
//! owns the scene, the keyframe engine and the undo stack.

pub mod config;
pub mod curve_data;
pub mod error;
pub mod host;
pub mod library;
pub mod mapping;
pub mod matching;
pub mod memory_host;
pub mod naming;
pub mod scratch;
pub mod store;
pub mod transfer;
pub mod transform;

// Re-exports for consumers (adapters)
pub use config::{LoadOptions, StoreConfig};
pub use curve_data::{save_curve_data, CurveData, CurveMap, CurveValues};
pub use error::{CurveError, CurveResult};
pub use host::{HostError, KeyframeHost, PasteArgs, PasteOption, TimeRange};
pub use library::{ItemKind, Library, LibraryItem, LibraryLoad};
pub use mapping::{save_name_mapping, NameMapping};
pub use matching::{
    curve_score, group_by_namespace, match_curve_names, match_names, CurveMatch, MatchStrength,
    NameMatches, NodeMatch,
};
pub use memory_host::MemoryHost;
pub use naming::{split_curve_name, AttrRef, NodeRef};
pub use scratch::{ScratchSession, ScratchSpace};
pub use store::{rename_curves, CurveStore, LoadReport, LoadRequest};
pub use transfer::{Metadata, TransferDocument};
pub use transform::{save_data_transform, CombineMethod, DataTransform};
