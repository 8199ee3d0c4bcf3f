use std::path::PathBuf;

use serde::Deserialize;

/// Page settings, usually read from `pdl-view.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Document title of the rendered page.
    pub title: String,

    /// Element id of the "current code" slot.
    pub code_slot_id: String,

    /// Stylesheet to inline instead of the built-in one.
    pub stylesheet: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            title: "PDL trace".to_string(),
            code_slot_id: "code".to_string(),
            stylesheet: None,
        }
    }
}
