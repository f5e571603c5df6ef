//! Editor tuning knobs.
//!
//! Every constant the store, arrangement algorithms and reconciler depend on
//! lives here so hosts can override them from a partial JSON file.

use serde::{Deserialize, Serialize};

/// Change-detection thresholds for the scene reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Epsilon {
    /// Pixels, applied to x/y/width/height.
    pub position: f64,
    /// Degrees.
    pub rotation: f64,
    pub opacity: f64,
}

impl Default for Epsilon {
    fn default() -> Self {
        Self {
            position: 0.1,
            rotation: 0.1,
            opacity: 0.01,
        }
    }
}

/// Configuration for a board session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Maximum number of history snapshots kept. Default: **50**.
    pub history_capacity: usize,

    /// Gap between neighbours for row/column/grid arrangement. Default: **20**.
    pub arrange_gap: f64,

    /// Offset applied to both axes by `duplicate_selected`. Default: **20**.
    pub duplicate_offset: f64,

    pub epsilon: Epsilon,

    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Multiplier used by the zoom-in / zoom-out shortcuts.
    pub zoom_step: f64,

    /// Prompt sent when a dragdrop pair triggers generation.
    pub dragdrop_prompt: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            arrange_gap: 20.0,
            duplicate_offset: 20.0,
            epsilon: Epsilon::default(),
            min_zoom: 0.1,
            max_zoom: 10.0,
            zoom_step: 1.2,
            dragdrop_prompt: "Combine these two images into one coherent scene".into(),
        }
    }
}

impl BoardConfig {
    /// Parse a (possibly partial) JSON config. Missing fields keep defaults.
    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| format!("invalid board config: {e}"))
    }

    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}
