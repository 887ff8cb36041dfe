//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::services::CaptureOptions;

/// Tunables for the recode editor.
///
/// Every field has a default, so a partial config deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Key the outside-click capture surface is registered under.
    pub capture_key: String,
    /// Whether the capture surface blocks interaction underneath it.
    pub capture_modal: bool,
    /// How much the capture surface dims the page (0.0 - 1.0).
    pub capture_dim: f32,
    /// Stacking order of the capture surface.
    pub capture_z_index: i32,
    /// Context passed when pausing global shortcuts for chain editing.
    pub shortcut_context: String,
    /// Transform names longer than this are truncated on commit.
    pub max_name_len: usize,
    /// Seed for placeholder examples. `None` uses a fixed default.
    pub placeholder_seed: Option<u64>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            capture_key: "recode-formula".to_owned(),
            capture_modal: true,
            capture_dim: 0.1,
            capture_z_index: 299,
            shortcut_context: String::new(),
            max_name_len: 63,
            placeholder_seed: None,
        }
    }
}

impl EditorConfig {
    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            modal: self.capture_modal,
            dim: self.capture_dim,
            z_index: self.capture_z_index,
        }
    }
}
