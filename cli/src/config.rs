use std::path::{Path, PathBuf};

use viewer::ViewerConfig;
use viewer::page::DEFAULT_STYLESHEET;

/// Name of the config file looked up next to the trace.
pub const CONFIG_FILE: &str = "pdl-view.toml";

/// Settings given on the command line. They win over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub title: Option<String>,
    pub code_slot_id: Option<String>,
    pub stylesheet: Option<PathBuf>,
}

/// Load the viewer config: `explicit` if given, else `pdl-view.toml` beside
/// the trace if it exists, else the defaults. Overrides are applied last.
pub fn load_config(
    trace: &Path,
    explicit: Option<&Path>,
    overrides: Overrides,
) -> Result<ViewerConfig, String> {
    let found = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let beside = trace
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(CONFIG_FILE);
            beside.is_file().then_some(beside)
        }
    };

    let mut config = match &found {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
            let mut config: ViewerConfig = toml::from_str(&text)
                .map_err(|e| format!("invalid config '{}': {}", path.display(), e))?;
            // stylesheet paths are relative to the config file
            if let (Some(sheet), Some(dir)) = (&config.stylesheet, path.parent()) {
                if sheet.is_relative() {
                    config.stylesheet = Some(dir.join(sheet));
                }
            }
            tracing::debug!(path = %path.display(), "config loaded");
            config
        }
        None => ViewerConfig::default(),
    };

    if let Some(title) = overrides.title {
        config.title = title;
    }
    if let Some(id) = overrides.code_slot_id {
        config.code_slot_id = id;
    }
    if let Some(sheet) = overrides.stylesheet {
        config.stylesheet = Some(sheet);
    }
    Ok(config)
}

/// The CSS to inline into the page.
pub fn stylesheet(config: &ViewerConfig) -> Result<String, String> {
    match &config.stylesheet {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read stylesheet '{}': {}", path.display(), e)),
        None => Ok(DEFAULT_STYLESHEET.to_string()),
    }
}
