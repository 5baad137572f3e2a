use crate::drop_resolver::DropZones;
use crate::errors::{EditorError, EditorResult};
use crate::mutations::PastePlacement;
use crate::sync::DEFAULT_TEXT_DEBOUNCE;
use crate::undo_stack::DEFAULT_HISTORY_CAPACITY;
use mosaic_markup::ElementTemplate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Editor tuning. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Number of retained history snapshots
    pub history_capacity: usize,

    /// Pointer bands for drop resolution
    pub drop_zones: DropZones,

    /// Where pasted subtrees land
    pub paste_placement: PastePlacement,

    /// Quiet period before a text edit is committed to history
    pub text_debounce_ms: u64,

    /// Indentation unit for serialized markup
    pub indent: String,

    /// Extra element templates, merged over the built-in palette
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<ElementTemplate>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            drop_zones: DropZones::default(),
            paste_placement: PastePlacement::default(),
            text_debounce_ms: DEFAULT_TEXT_DEBOUNCE.as_millis() as u64,
            indent: "  ".to_string(),
            templates: Vec::new(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> EditorResult<Self> {
        let config: EditorConfig =
            serde_json::from_str(json).map_err(|e| EditorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EditorResult<()> {
        if self.history_capacity == 0 {
            return Err(EditorError::Config(
                "historyCapacity must be at least 1".to_string(),
            ));
        }
        if self.indent.chars().any(|c| c != ' ' && c != '\t') {
            return Err(EditorError::Config(format!(
                "indent must be spaces or tabs, got {:?}",
                self.indent
            )));
        }
        if let Some(template) = self.templates.iter().find(|t| t.key.trim().is_empty()) {
            return Err(EditorError::Config(format!(
                "template for <{}> has an empty key",
                template.tag
            )));
        }
        self.drop_zones.validate()
    }

    pub fn text_debounce(&self) -> Duration {
        Duration::from_millis(self.text_debounce_ms)
    }
}
