//! Editor configuration.
//!
//! Floats are quantized before hashing so `params_hash` does not depend on
//! float formatting.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;

/// Quantization factor for float parameters (6 decimal places).
const FLOAT_QUANTIZATION_FACTOR: f64 = 1_000_000.0;

/// Settings for a [`SceneEditor`](crate::editor::SceneEditor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Whether undo may return to the empty scene before the first step.
    pub can_clear_scene: bool,
    /// Half-width of the stroke added around spline curves for bounds.
    pub spline_stroke_radius: f64,
    /// Catmull-Rom samples per spline segment.
    pub spline_samples_per_segment: usize,
    /// Horizontal gap between existing content and an imported fragment.
    pub import_spacing: f64,
    /// Renumber incoming ids above the current maxima on import.
    pub renumber_on_import: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            can_clear_scene: false,
            spline_stroke_radius: 2.0,
            spline_samples_per_segment: 8,
            import_spacing: 40.0,
            renumber_on_import: true,
        }
    }
}

#[derive(Serialize)]
struct QuantizedEditorConfig {
    can_clear_scene: bool,
    spline_stroke_radius: i64,
    spline_samples_per_segment: usize,
    import_spacing: i64,
    renumber_on_import: bool,
}

fn quantize_float(value: f64) -> i64 {
    (value * FLOAT_QUANTIZATION_FACTOR).round() as i64
}

impl EditorConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Deterministic hash of the parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(&QuantizedEditorConfig {
            can_clear_scene: self.can_clear_scene,
            spline_stroke_radius: quantize_float(self.spline_stroke_radius),
            spline_samples_per_segment: self.spline_samples_per_segment,
            import_spacing: quantize_float(self.import_spacing),
            renumber_on_import: self.renumber_on_import,
        })
    }
}
