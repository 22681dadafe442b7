//! Animation-related constants.

/// Seconds the intro clock takes to reach 1.0
pub const INTRO_SPEED: f32 = 2.0;
/// Intro speed used when reduced motion is requested
pub const REDUCED_MOTION_INTRO_SPEED: f32 = 0.5;
/// Per-tile intro delay (seconds per tile index)
pub const INTRO_STAGGER: f32 = 0.02;
/// How much faster a single tile's intro runs than the global clock
pub const INTRO_TILE_RATE: f32 = 1.5;
/// Slide-in origin distance for tiles entering from the side
pub const INTRO_ORIGIN_X: f32 = 25.0;
/// Slide-in origin distance for tiles entering from above or below
pub const INTRO_ORIGIN_Y: f32 = 20.0;

/// Fraction of the remaining distance the camera covers per tick
pub const CAMERA_DAMPING: f32 = 0.1;

/// Crossfade progress added per tick after a tier switch
pub const CROSSFADE_STEP: f32 = 0.05;

/// Hover progress approach rate per tick
pub const HOVER_SPEED: f32 = 0.15;
/// Tilt approach rate per tick
pub const TILT_SPEED: f32 = 0.12;
/// Maximum hover tilt (radians)
pub const HOVER_MAX_TILT: f32 = 0.18;
/// Extra scale at full hover
pub const HOVER_SCALE: f32 = 0.04;
/// Eased scalars within this of their target snap onto it
pub const ANIMATION_SETTLE_EPSILON: f32 = 0.0001;

/// Placeholder spinner rotation per tick (radians)
pub const SPINNER_ROTATION_SPEED: f32 = 0.05;

/// Gallery-wide floating amplitude along x (world units)
pub const FLOAT_AMPLITUDE_X: f32 = 0.08;
/// Gallery-wide floating amplitude along y (world units)
pub const FLOAT_AMPLITUDE_Y: f32 = 0.06;
/// Gallery-wide floating angular speed along x (radians/s)
pub const FLOAT_SPEED_X: f32 = 0.3;
/// Gallery-wide floating angular speed along y (radians/s)
pub const FLOAT_SPEED_Y: f32 = 0.25;
