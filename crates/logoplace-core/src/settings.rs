//! Tunable engine settings.

use crate::coords::Viewport;
use crate::history::DEFAULT_HISTORY_LIMIT;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

/// Engine settings. Every field falls back to its default when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum number of placements across all views.
    pub max_placements: usize,
    /// Maximum number of undo states.
    pub history_limit: usize,
    /// Side length of a placement at scale 1, in container pixels.
    pub base_size: f64,
    /// Scale change per zoom-compensated pixel of resize-handle travel.
    pub resize_sensitivity: f64,
    /// Percentage position of newly added placements.
    pub default_position: Point,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
    /// Handle hit radius in screen pixels.
    pub handle_hit_radius: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_placements: 5,
            history_limit: DEFAULT_HISTORY_LIMIT,
            base_size: 150.0,
            resize_sensitivity: 0.005,
            default_position: Point::new(40.0, 30.0),
            min_zoom: 0.5,
            max_zoom: 3.0,
            zoom_step: 0.25,
            handle_hit_radius: 12.0,
        }
    }
}

impl Settings {
    /// Parse and validate settings from JSON.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize the settings to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.base_size) {
            return Err(SettingsError::Invalid { field: "base_size", reason: "must be positive" });
        }
        if !positive(self.resize_sensitivity) {
            return Err(SettingsError::Invalid {
                field: "resize_sensitivity",
                reason: "must be positive",
            });
        }
        if !positive(self.min_zoom) || !positive(self.max_zoom) || self.min_zoom > self.max_zoom {
            return Err(SettingsError::Invalid {
                field: "min_zoom",
                reason: "zoom bounds must be positive and ordered",
            });
        }
        if !positive(self.zoom_step) {
            return Err(SettingsError::Invalid { field: "zoom_step", reason: "must be positive" });
        }
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if !in_range(self.default_position.x) || !in_range(self.default_position.y) {
            return Err(SettingsError::Invalid {
                field: "default_position",
                reason: "must lie within 0-100 percent",
            });
        }
        if !(self.handle_hit_radius.is_finite() && self.handle_hit_radius >= 0.0) {
            return Err(SettingsError::Invalid {
                field: "handle_hit_radius",
                reason: "must be non-negative",
            });
        }
        Ok(())
    }

    /// A viewport using these zoom bounds.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.min_zoom, self.max_zoom, self.zoom_step)
    }
}
