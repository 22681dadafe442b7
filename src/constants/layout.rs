//! Masonry layout constants.

/// Width of one column in world units
pub const LAYOUT_COLUMN_WIDTH: f32 = 1.8;
/// Gap between columns
pub const LAYOUT_HORIZONTAL_GAP: f32 = 0.4;
/// Gap between tiles stacked in one column
pub const LAYOUT_VERTICAL_GAP: f32 = 0.5;
/// Largest floating excursion a tile may make; reserved twice per tile
pub const LAYOUT_MAX_FLOAT_AMPLITUDE: f32 = 0.025;
/// Placements are rounded to this many steps per world unit
pub const LAYOUT_ROUNDING: f32 = 100.0;

/// Height-to-width ratios, cycled by item index
pub const ASPECT_RATIOS: [f32; 17] = [
    1.2, 1.5, 1.8, 1.3, 1.6, 1.4, 2.0, 1.1, 1.7, 1.35, 1.45, 1.55, 1.65, 1.75, 1.25, 1.85, 1.95,
];

/// Viewport width breakpoints (pixels) between column presets
pub const BREAKPOINT_SMALL: f32 = 480.0;
pub const BREAKPOINT_MEDIUM: f32 = 768.0;
pub const BREAKPOINT_LARGE: f32 = 968.0;
pub const BREAKPOINT_XLARGE: f32 = 1200.0;
pub const BREAKPOINT_XXLARGE: f32 = 1600.0;
