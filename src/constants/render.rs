//! Render scheduling constants.

/// Frame time assumed on the very first tick (milliseconds)
pub const DEFAULT_FRAME_MS: f64 = 16.0;
/// Longest frame time fed to animations (milliseconds)
pub const MAX_FRAME_MS: f64 = 100.0;
/// How often the visibility pass runs (milliseconds)
pub const VISIBILITY_INTERVAL_MS: f64 = 100.0;
/// Extra world units around the view that still count as visible
pub const VISIBILITY_MARGIN: f32 = 1.0;
