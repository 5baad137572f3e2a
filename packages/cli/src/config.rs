use anyhow::Context;
use mosaic_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "mosaic.config.json";

/// Mosaic configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the markup documents
    #[serde(default = "default_src_dir")]
    pub src_dir: String,

    /// Title used when exporting full pages
    #[serde(default = "default_page_title")]
    pub page_title: String,

    /// Editing engine settings
    #[serde(flatten)]
    pub editor: EditorConfig,
}

fn default_src_dir() -> String {
    "src".to_string()
}

fn default_page_title() -> String {
    "Mosaic Page".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Invalid {}", config_path.display()))?;
            config.editor.validate()?;
            tracing::debug!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Get absolute path to source directory
    pub fn get_src_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.src_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            page_title: default_page_title(),
            editor: EditorConfig::default(),
        }
    }
}
