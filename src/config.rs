//! Gallery configuration.
//!
//! Every option is optional. Overrides are deep-merged over the defaults:
//! object-valued keys merge recursively, arrays and scalars replace outright,
//! and keys the gallery does not recognize are ignored.

use crate::constants::*;
use crate::error::GalleryError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Complete gallery configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GalleryConfig {
    pub columns: ColumnBreakpoints,
    pub layout: LayoutSettings,
    pub animation: AnimationSettings,
    pub camera: CameraSettings,
    pub momentum: MomentumSettings,
    pub hover: HoverSettings,
    pub lod: LodSettings,
    pub network: NetworkSettings,
    pub render: RenderSettings,
}

/// Column count per viewport-width breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnBreakpoints {
    /// Below 480px
    pub mobile: usize,
    /// 480px - 768px
    pub small: usize,
    /// 768px - 968px
    pub medium: usize,
    /// 968px - 1200px
    pub large: usize,
    /// 1200px - 1600px
    pub xlarge: usize,
    /// 1600px and up
    pub xxlarge: usize,
}

impl Default for ColumnBreakpoints {
    fn default() -> Self {
        Self {
            mobile: 1,
            small: 2,
            medium: 3,
            large: 4,
            xlarge: 5,
            xxlarge: 6,
        }
    }
}

impl ColumnBreakpoints {
    /// Column count for a viewport of the given width in pixels.
    pub fn columns_for_width(&self, width: f32) -> usize {
        if width < BREAKPOINT_SMALL {
            self.mobile
        } else if width < BREAKPOINT_MEDIUM {
            self.small
        } else if width < BREAKPOINT_LARGE {
            self.medium
        } else if width < BREAKPOINT_XLARGE {
            self.large
        } else if width < BREAKPOINT_XXLARGE {
            self.xlarge
        } else {
            self.xxlarge
        }
    }

    fn all(&self) -> [usize; 6] {
        [
            self.mobile,
            self.small,
            self.medium,
            self.large,
            self.xlarge,
            self.xxlarge,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutSettings {
    pub column_width: f32,
    pub horizontal_gap: f32,
    pub vertical_gap: f32,
    pub max_float_amplitude: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            column_width: LAYOUT_COLUMN_WIDTH,
            horizontal_gap: LAYOUT_HORIZONTAL_GAP,
            vertical_gap: LAYOUT_VERTICAL_GAP,
            max_float_amplitude: LAYOUT_MAX_FLOAT_AMPLITUDE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationSettings {
    /// Seconds for the intro clock to reach 1.0
    pub intro_speed: f32,
    /// Camera damping fraction per tick
    pub damping: f32,
    pub floating_enabled: bool,
    /// Host-reported reduced motion preference
    pub reduced_motion: bool,
    pub reduced_motion_speed: f32,
    pub gallery_float_amplitude_x: f32,
    pub gallery_float_amplitude_y: f32,
    pub gallery_float_speed_x: f32,
    pub gallery_float_speed_y: f32,
    pub crossfade_step: f32,
    pub spinner_speed: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            intro_speed: INTRO_SPEED,
            damping: CAMERA_DAMPING,
            floating_enabled: true,
            reduced_motion: false,
            reduced_motion_speed: REDUCED_MOTION_INTRO_SPEED,
            gallery_float_amplitude_x: FLOAT_AMPLITUDE_X,
            gallery_float_amplitude_y: FLOAT_AMPLITUDE_Y,
            gallery_float_speed_x: FLOAT_SPEED_X,
            gallery_float_speed_y: FLOAT_SPEED_Y,
            crossfade_step: CROSSFADE_STEP,
            spinner_speed: SPINNER_ROTATION_SPEED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraSettings {
    pub initial_zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub boundary_x: f32,
    pub boundary_y: f32,
    pub frustum_size: f32,
    pub pan_speed: f32,
    pub touch_pan_speed: f32,
    pub wheel_zoom_speed: f32,
    pub pinch_zoom_speed: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            initial_zoom: CAMERA_DEFAULT_ZOOM,
            min_zoom: CAMERA_MIN_ZOOM,
            max_zoom: CAMERA_MAX_ZOOM,
            boundary_x: CAMERA_BOUNDARY_X,
            boundary_y: CAMERA_BOUNDARY_Y,
            frustum_size: CAMERA_FRUSTUM_SIZE,
            pan_speed: CAMERA_PAN_SPEED,
            touch_pan_speed: CAMERA_TOUCH_PAN_SPEED,
            wheel_zoom_speed: CAMERA_WHEEL_ZOOM_SPEED,
            pinch_zoom_speed: CAMERA_PINCH_ZOOM_SPEED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MomentumSettings {
    pub enabled: bool,
    pub friction: f32,
    pub min_velocity: f32,
    pub stop_velocity: f32,
}

impl Default for MomentumSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            friction: MOMENTUM_FRICTION,
            min_velocity: MOMENTUM_MIN_VELOCITY,
            stop_velocity: MOMENTUM_STOP_VELOCITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HoverSettings {
    pub enabled: bool,
    pub max_tilt: f32,
    pub scale: f32,
    pub speed: f32,
    pub tilt_speed: f32,
}

impl Default for HoverSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_tilt: HOVER_MAX_TILT,
            scale: HOVER_SCALE,
            speed: HOVER_SPEED,
            tilt_speed: TILT_SPEED,
        }
    }
}

/// Zoom range and URL parameters of one LOD tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TierSettings {
    /// The tier is selected when zoom is strictly above this
    pub min: f32,
    /// Nominal upper edge; `None` means unbounded
    pub max: Option<f32>,
    pub width: u32,
    pub quality: u32,
}

impl Default for TierSettings {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: None,
            width: LOD_BASE_WIDTH,
            quality: LOD_BASE_QUALITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LodSettings {
    pub low: TierSettings,
    pub medium: TierSettings,
    pub high: TierSettings,
    pub hysteresis: f32,
    /// Width marker value present in manifest URLs
    pub base_width: u32,
    /// Quality marker value present in manifest URLs
    pub base_quality: u32,
}

impl Default for LodSettings {
    fn default() -> Self {
        Self {
            low: TierSettings {
                min: 0.0,
                max: Some(LOD_LOW_MAX_ZOOM),
                width: LOD_LOW_WIDTH,
                quality: LOD_LOW_QUALITY,
            },
            medium: TierSettings {
                min: LOD_MEDIUM_MIN_ZOOM,
                max: Some(LOD_MEDIUM_MAX_ZOOM),
                width: LOD_MEDIUM_WIDTH,
                quality: LOD_MEDIUM_QUALITY,
            },
            high: TierSettings {
                min: LOD_HIGH_MIN_ZOOM,
                max: None,
                width: LOD_BASE_WIDTH,
                quality: LOD_BASE_QUALITY,
            },
            hysteresis: LOD_HYSTERESIS,
            base_width: LOD_BASE_WIDTH,
            base_quality: LOD_BASE_QUALITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkSettings {
    pub max_retries: u32,
    pub timeout_ms: u64,
    pub retry_delay_ms: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            max_retries: NETWORK_MAX_RETRIES,
            timeout_ms: NETWORK_TIMEOUT_MS,
            retry_delay_ms: NETWORK_RETRY_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderSettings {
    pub visibility_interval_ms: f64,
    pub default_frame_ms: f64,
    pub max_frame_ms: f64,
    pub visibility_margin: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            visibility_interval_ms: VISIBILITY_INTERVAL_MS,
            default_frame_ms: DEFAULT_FRAME_MS,
            max_frame_ms: MAX_FRAME_MS,
            visibility_margin: VISIBILITY_MARGIN,
        }
    }
}

impl GalleryConfig {
    /// Build a configuration by deep-merging `overrides` over the defaults.
    pub fn from_overrides(overrides: &Value) -> Result<Self, GalleryError> {
        let mut merged = serde_json::to_value(GalleryConfig::default())
            .map_err(|e| GalleryError::Config(e.to_string()))?;
        merge_json(&mut merged, overrides);
        let config: GalleryConfig =
            serde_json::from_value(merged).map_err(|e| GalleryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSON overrides and merge them over the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, GalleryError> {
        let overrides: Value =
            serde_json::from_str(json).map_err(|e| GalleryError::Config(e.to_string()))?;
        Self::from_overrides(&overrides)
    }

    /// Resolve derived settings: reduced motion slows the intro and turns
    /// floating off.
    pub fn effective(mut self) -> Self {
        if self.animation.reduced_motion {
            self.animation.intro_speed = self.animation.reduced_motion_speed;
            self.animation.floating_enabled = false;
        }
        self
    }

    /// Reject nonsensical numeric configuration.
    pub fn validate(&self) -> Result<(), GalleryError> {
        if let Some(&bad) = self.columns.all().iter().find(|&&c| c < 1) {
            return Err(GalleryError::InvalidColumnCount(bad));
        }

        let layout = &self.layout;
        ensure(layout.column_width > 0.0, "layout.columnWidth must be positive")?;
        ensure(
            layout.horizontal_gap >= 0.0 && layout.vertical_gap >= 0.0,
            "layout gaps must not be negative",
        )?;
        ensure(
            layout.max_float_amplitude >= 0.0,
            "layout.maxFloatAmplitude must not be negative",
        )?;

        let camera = &self.camera;
        ensure(camera.min_zoom > 0.0, "camera.minZoom must be positive")?;
        ensure(
            camera.min_zoom <= camera.max_zoom,
            "camera.minZoom must not exceed camera.maxZoom",
        )?;
        ensure(
            camera.boundary_x >= 0.0 && camera.boundary_y >= 0.0,
            "camera boundaries must not be negative",
        )?;
        ensure(camera.frustum_size > 0.0, "camera.frustumSize must be positive")?;

        let animation = &self.animation;
        ensure(
            animation.damping > 0.0 && animation.damping <= 1.0,
            "animation.damping must be in (0, 1]",
        )?;
        ensure(
            animation.intro_speed > 0.0 && animation.reduced_motion_speed > 0.0,
            "intro speeds must be positive",
        )?;
        ensure(animation.crossfade_step > 0.0, "animation.crossfadeStep must be positive")?;

        ensure(
            (0.0..1.0).contains(&self.momentum.friction),
            "momentum.friction must be in [0, 1)",
        )?;
        ensure(
            self.momentum.stop_velocity > 0.0,
            "momentum.stopVelocity must be positive",
        )?;

        let lod = &self.lod;
        ensure(
            lod.low.min < lod.medium.min && lod.medium.min < lod.high.min,
            "lod tier minimums must be strictly increasing",
        )?;
        ensure(lod.hysteresis >= 0.0, "lod.hysteresis must not be negative")?;

        ensure(self.network.max_retries >= 1, "network.maxRetries must be at least 1")?;
        ensure(
            self.render.visibility_interval_ms > 0.0,
            "render.visibilityIntervalMs must be positive",
        )?;
        ensure(
            self.render.default_frame_ms > 0.0 && self.render.max_frame_ms > 0.0,
            "render frame times must be positive",
        )?;
        Ok(())
    }
}

fn ensure(condition: bool, message: &str) -> Result<(), GalleryError> {
    if condition {
        Ok(())
    } else {
        Err(GalleryError::Config(message.to_string()))
    }
}

/// Deep-merge `overrides` into `base`. Objects merge key by key; anything
/// else (arrays, scalars, null) replaces the base value.
pub fn merge_json(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            for (key, value) in override_map {
                let nested = value.is_object() && base_map.get(key).is_some_and(Value::is_object);
                match base_map.get_mut(key) {
                    Some(existing) if nested => merge_json(existing, value),
                    _ => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overrides) => *base = overrides.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_overrides_yield_defaults() {
        let config = GalleryConfig::from_overrides(&json!({})).unwrap();
        assert_eq!(config, GalleryConfig::default());
    }

    #[test]
    fn test_nested_override_keeps_sibling_defaults() {
        let config = GalleryConfig::from_overrides(&json!({
            "camera": { "maxZoom": 5.0 },
            "lod": { "high": { "min": 2.5 } }
        }))
        .unwrap();
        assert_eq!(config.camera.max_zoom, 5.0);
        assert_eq!(config.camera.min_zoom, CAMERA_MIN_ZOOM);
        assert_eq!(config.lod.high.min, 2.5);
        assert_eq!(config.lod.high.width, LOD_BASE_WIDTH);
        assert_eq!(config.lod.medium.min, LOD_MEDIUM_MIN_ZOOM);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = GalleryConfig::from_overrides(&json!({
            "renderer": { "antialias": true },
            "layout": { "columnWidth": 2.0, "sparkles": 11 }
        }))
        .unwrap();
        assert_eq!(config.layout.column_width, 2.0);
    }

    #[test]
    fn test_merge_replaces_arrays_and_scalars() {
        let mut base = json!({ "a": [1, 2, 3], "b": { "c": 1, "d": 2 }, "e": 1 });
        merge_json(&mut base, &json!({ "a": [9], "b": { "d": 5 }, "e": "x" }));
        assert_eq!(base, json!({ "a": [9], "b": { "c": 1, "d": 5 }, "e": "x" }));
    }

    #[test]
    fn test_zero_columns_is_rejected() {
        let err = GalleryConfig::from_overrides(&json!({ "columns": { "medium": 0 } })).unwrap_err();
        assert!(matches!(err, GalleryError::InvalidColumnCount(0)));
    }

    #[test]
    fn test_inverted_zoom_range_is_rejected() {
        let err = GalleryConfig::from_overrides(&json!({
            "camera": { "minZoom": 4.0, "maxZoom": 2.0 }
        }))
        .unwrap_err();
        assert!(matches!(err, GalleryError::Config(_)));
    }

    #[test]
    fn test_zero_stop_velocity_is_rejected() {
        // Friction alone never reaches zero, so momentum would never end
        let err = GalleryConfig::from_overrides(&json!({ "momentum": { "stopVelocity": 0.0 } })).unwrap_err();
        assert!(matches!(err, GalleryError::Config(_)));
    }

    #[test]
    fn test_wrong_type_is_a_config_error() {
        let err = GalleryConfig::from_json_str(r#"{ "camera": { "minZoom": "wide" } }"#).unwrap_err();
        assert!(matches!(err, GalleryError::Config(_)));
    }

    #[test]
    fn test_reduced_motion_disables_floating() {
        let config = GalleryConfig::from_overrides(&json!({
            "animation": { "reducedMotion": true }
        }))
        .unwrap()
        .effective();
        assert!(!config.animation.floating_enabled);
        assert_eq!(config.animation.intro_speed, REDUCED_MOTION_INTRO_SPEED);
    }

    #[test]
    fn test_column_breakpoints() {
        let columns = ColumnBreakpoints::default();
        assert_eq!(columns.columns_for_width(320.0), 1);
        assert_eq!(columns.columns_for_width(480.0), 2);
        assert_eq!(columns.columns_for_width(800.0), 3);
        assert_eq!(columns.columns_for_width(1000.0), 4);
        assert_eq!(columns.columns_for_width(1280.0), 5);
        assert_eq!(columns.columns_for_width(1920.0), 6);
    }
}
