//! Demo viewer window constants.

/// Default window width
pub const WINDOW_DEFAULT_WIDTH: u32 = 1280;
/// Default window height
pub const WINDOW_DEFAULT_HEIGHT: u32 = 720;

/// Background clear color (RGB)
pub const BACKGROUND_COLOR: [f32; 3] = [0.96, 0.96, 0.96];
/// Placeholder quad color (RGB)
pub const PLACEHOLDER_COLOR: [f32; 3] = [0.867, 0.867, 0.867];
/// Loading spinner color (RGB)
pub const SPINNER_COLOR: [f32; 3] = [0.0, 0.0, 0.0];
/// Loading spinner ring radii (world units)
pub const SPINNER_INNER_RADIUS: f32 = 0.15;
pub const SPINNER_OUTER_RADIUS: f32 = 0.18;
/// Loading spinner opacity
pub const SPINNER_OPACITY: f32 = 0.2;
/// Pixels per wheel line when the platform reports line deltas
pub const WHEEL_LINE_PIXELS: f32 = 100.0;
/// How often an idle viewer wakes to poll for finished loads (milliseconds)
pub const IDLE_POLL_MS: u64 = 100;
