//! Level-of-detail constants.

/// Zoom above which the medium tier is selected
pub const LOD_MEDIUM_MIN_ZOOM: f32 = 1.0;
/// Zoom above which the high tier is selected
pub const LOD_HIGH_MIN_ZOOM: f32 = 1.8;
/// Upper edge of the low tier's nominal range
pub const LOD_LOW_MAX_ZOOM: f32 = 1.3;
/// Upper edge of the medium tier's nominal range
pub const LOD_MEDIUM_MAX_ZOOM: f32 = 2.2;

/// Pixel width requested for the low tier
pub const LOD_LOW_WIDTH: u32 = 400;
/// Pixel width requested for the medium tier
pub const LOD_MEDIUM_WIDTH: u32 = 800;
/// Pixel width the manifest URLs are authored at (high tier)
pub const LOD_BASE_WIDTH: u32 = 1200;
/// Quality requested for the low tier
pub const LOD_LOW_QUALITY: u32 = 80;
/// Quality requested for the medium tier
pub const LOD_MEDIUM_QUALITY: u32 = 85;
/// Quality the manifest URLs are authored at (high tier)
pub const LOD_BASE_QUALITY: u32 = 90;

/// Zoom movement needed before tiers are re-evaluated
pub const LOD_HYSTERESIS: f32 = 0.02;
