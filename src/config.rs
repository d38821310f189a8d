//! Configuration types and defaults
//!
//! Every field is defaulted, so a partial JSON object (or an empty one)
//! deserializes into a usable configuration.

use serde::{Deserialize, Serialize};

use crate::error::LinguistError;

// =============================================================================
// Panel Geometry
// =============================================================================

/// Size and spacing of the floating suggestion panel, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelGeometry {
    /// Panel width. Default: 280
    pub width: f64,
    /// Vertical gap between the marker and the panel. Default: 8
    pub gap: f64,
    /// Minimum distance from the viewport edges. Default: 10
    pub viewport_margin: f64,
}

impl Default for PanelGeometry {
    fn default() -> Self {
        Self {
            width: 280.0,
            gap: 8.0,
            viewport_margin: 10.0,
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinguistConfig {
    /// Quiet period after the last input before a check runs. Default: 600
    pub debounce_ms: u32,
    /// Simulated round trip of the Correction Source. Default: 500
    pub check_latency_ms: u32,
    /// Grace delay before hiding the panel after leaving a marker. Default: 150
    pub marker_leave_grace_ms: u32,
    /// Grace delay before hiding the panel after leaving the panel. Default: 200
    pub panel_leave_grace_ms: u32,
    pub panel: PanelGeometry,
    /// Suggest capitalizing the first word when no rule matched. Default: true
    pub fallback_suggestion: bool,
}

impl Default for LinguistConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 600,
            check_latency_ms: 500,
            marker_leave_grace_ms: 150,
            panel_leave_grace_ms: 200,
            panel: PanelGeometry::default(),
            fallback_suggestion: true,
        }
    }
}

impl LinguistConfig {
    /// No simulated latency
    pub fn instant() -> Self {
        Self {
            check_latency_ms: 0,
            ..Self::default()
        }
    }

    /// Parse a (possibly partial) JSON configuration
    pub fn from_json(json: &str) -> Result<Self, LinguistError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| LinguistError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LinguistError> {
        if self.panel.width <= 0.0 {
            return Err(LinguistError::Config("panel width must be positive".into()));
        }
        if self.panel.viewport_margin < 0.0 || self.panel.gap < 0.0 {
            return Err(LinguistError::Config(
                "panel spacing must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinguistConfig::default();
        assert_eq!(config.debounce_ms, 600);
        assert_eq!(config.check_latency_ms, 500);
        assert!(config.fallback_suggestion);
        assert_eq!(config.panel.width, 280.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = LinguistConfig::from_json(r#"{"debounceMs": 250, "panel": {"width": 320}}"#).unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.panel.width, 320.0);
        assert_eq!(config.panel.gap, 8.0);
        assert_eq!(config.marker_leave_grace_ms, 150);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(LinguistConfig::from_json("{}").unwrap(), LinguistConfig::default());
    }

    #[test]
    fn test_rejects_zero_width_panel() {
        let err = LinguistConfig::from_json(r#"{"panel": {"width": 0}}"#).unwrap_err();
        assert!(matches!(err, LinguistError::Config(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(LinguistConfig::from_json("{debounceMs:").is_err());
    }
}
