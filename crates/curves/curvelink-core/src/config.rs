//! Store and load configuration.

use serde::{Deserialize, Serialize};

use crate::error::CurveResult;
use crate::host::{PasteOption, TimeRange};
use crate::scratch::ScratchSpace;

/// Per-store settings.
/// Keep this minimal; host adapters extend through their own config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Reserved namespace for temporary curves.
    pub scratch: ScratchSpace,
    /// UI element that gets input focus back after a load.
    pub focus_target: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            scratch: ScratchSpace::default(),
            focus_target: "MainWindow".to_string(),
        }
    }
}

/// Options from the load dialog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadOptions {
    /// First destination frame; falls back to the host time when `current_time` is set.
    pub start_frame: Option<i64>,
    /// Source window; defaults to frame 0 through the last captured frame.
    pub source_time: Option<TimeRange>,
    /// Paste option text. Unset and the legacy "replace all" both mean a complete replace.
    pub option: Option<String>,
    pub connect: bool,
    pub current_time: bool,
}

impl LoadOptions {
    pub fn paste_option(&self) -> CurveResult<PasteOption> {
        PasteOption::resolve(self.option.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_options_deserialize_from_dialog_json() {
        let json = r#"{"option": "replace all", "currentTime": true, "sourceTime": {"start": 2, "end": 9}}"#;
        let opts: LoadOptions = serde_json::from_str(json).expect("parse options");
        assert!(opts.current_time);
        assert!(!opts.connect);
        assert_eq!(opts.source_time, Some(TimeRange::new(2, 9)));
        assert_eq!(opts.paste_option().ok(), Some(PasteOption::ReplaceCompletely));
    }
}
