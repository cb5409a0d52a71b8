//! Tunable constants for the canvas.
//!
//! Everything the interaction and layout code treats as a magic number lives
//! here so hosts can override it from JSON. Missing fields fall back to the
//! defaults below.

use crate::error::ConfigError;
use crate::layout::LayoutConfig;
use crate::measure::SizingConfig;
use serde::{Deserialize, Serialize};

/// Hard bounds on the view scale; configured limits must fall inside them.
pub const MIN_SCALE_LIMIT: f32 = 0.1;
pub const MAX_SCALE_LIMIT: f32 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    /// Center-to-center distance (world units) under which a dragged node
    /// becomes a combine candidate for another node.
    pub combine_distance: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Multiplicative zoom factor per wheel notch.
    pub zoom_step: f32,
    /// Minimum interval between committed viewport updates during a
    /// continuous gesture (~60 Hz).
    pub viewport_throttle_ms: f64,
    /// Quiet period after a drag ends during which automatic layout is held back.
    pub layout_cooldown_ms: f64,
    /// Screen-space travel below which a press/release counts as a click.
    pub click_slop: f32,
    pub expand_on_click: bool,
    /// Upper bound on expansion nodes created per expand call.
    pub max_expansions: usize,
    /// Age after which an unanswered service call is abandoned.
    pub op_timeout_ms: f64,
    pub layout: LayoutConfig,
    pub sizing: SizingConfig,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            combine_distance: 100.0,
            min_scale: 0.1,
            max_scale: 5.0,
            zoom_step: 1.1,
            viewport_throttle_ms: 16.0,
            layout_cooldown_ms: 1000.0,
            click_slop: 4.0,
            expand_on_click: true,
            max_expansions: 5,
            op_timeout_ms: 30_000.0,
            layout: LayoutConfig::default(),
            sizing: SizingConfig::default(),
        }
    }
}

impl CanvasConfig {
    /// Parse a (possibly partial) JSON config and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_range = |s: f32| (MIN_SCALE_LIMIT..=MAX_SCALE_LIMIT).contains(&s);
        if !(in_range(self.min_scale) && in_range(self.max_scale) && self.min_scale < self.max_scale) {
            return Err(ConfigError::ScaleBounds {
                min: self.min_scale,
                max: self.max_scale,
            });
        }
        let positive = [
            ("combineDistance", self.combine_distance as f64),
            ("viewportThrottleMs", self.viewport_throttle_ms),
            ("opTimeoutMs", self.op_timeout_ms),
            ("layout.nodeSep", self.layout.node_sep as f64),
            ("layout.rankSep", self.layout.rank_sep as f64),
        ];
        for (field, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        let sizing = [
            ("sizing.root", &self.sizing.root),
            ("sizing.topic", &self.sizing.topic),
            ("sizing.expansion", &self.sizing.expansion),
        ];
        for (kind, s) in sizing {
            let fields = [
                ("fontSize", s.font_size),
                ("maxTextWidth", s.max_text_width),
                ("lineHeight", s.line_height),
            ];
            for (name, value) in fields {
                if !(value.is_finite() && value > 0.0) {
                    log::warn!("config: {kind}.{name} must be positive, got {value}");
                    return Err(ConfigError::NotPositive {
                        field: name,
                        value: value as f64,
                    });
                }
            }
        }
        // A step of exactly 1.0 would make zooming a no-op.
        if self.zoom_step.is_nan() || self.zoom_step <= 1.0 {
            return Err(ConfigError::NotPositive {
                field: "zoomStep - 1",
                value: self.zoom_step as f64 - 1.0,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutDirection;

    #[test]
    fn defaults_are_valid() {
        assert!(CanvasConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            CanvasConfig::from_json(r#"{"combineDistance": 60, "layout": {"direction": "leftToRight"}}"#)
                .unwrap();
        assert_eq!(config.combine_distance, 60.0);
        assert_eq!(config.layout.direction, LayoutDirection::LeftToRight);
        assert_eq!(config.layout.node_sep, 120.0);
        assert_eq!(config.max_scale, 5.0);
    }

    #[test]
    fn rejects_inverted_scale_bounds() {
        let err = CanvasConfig::from_json(r#"{"minScale": 3, "maxScale": 2}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ScaleBounds { .. }));
    }

    #[test]
    fn rejects_scale_bounds_outside_hard_limits() {
        for json in [r#"{"minScale": 0.01}"#, r#"{"maxScale": 50}"#] {
            let err = CanvasConfig::from_json(json).unwrap_err();
            assert!(matches!(err, ConfigError::ScaleBounds { .. }), "{json}: {err:?}");
        }
        assert!(CanvasConfig::from_json(r#"{"minScale": 0.5, "maxScale": 2}"#).is_ok());
    }

    #[test]
    fn rejects_zero_width_sizing() {
        let err =
            CanvasConfig::from_json(r#"{"sizing":{"topic":{"minTextWidth":0,"maxTextWidth":0}}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { field: "maxTextWidth", .. }), "{err:?}");
        let err = CanvasConfig::from_json(r#"{"sizing":{"expansion":{"lineHeight":0}}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { field: "lineHeight", .. }), "{err:?}");
    }

    #[test]
    fn rejects_flat_zoom_step() {
        let err = CanvasConfig::from_json(r#"{"zoomStep": 1.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::NotPositive { .. }));
    }
}
