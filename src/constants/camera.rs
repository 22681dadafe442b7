//! Camera-related constants.

/// Zoom level the gallery opens at
pub const CAMERA_DEFAULT_ZOOM: f32 = 1.8;
/// Minimum zoom level
pub const CAMERA_MIN_ZOOM: f32 = 1.4;
/// Maximum zoom level
pub const CAMERA_MAX_ZOOM: f32 = 3.5;
/// Horizontal pan boundary (world units either side of the origin)
pub const CAMERA_BOUNDARY_X: f32 = 8.0;
/// Vertical pan boundary (world units either side of the origin)
pub const CAMERA_BOUNDARY_Y: f32 = 20.0;
/// World units visible vertically at zoom 1.0
pub const CAMERA_FRUSTUM_SIZE: f32 = 10.0;
/// World units per screen pixel of mouse drag at zoom 1.0
pub const CAMERA_PAN_SPEED: f32 = 0.01;
/// World units per screen pixel of touch drag at zoom 1.0
pub const CAMERA_TOUCH_PAN_SPEED: f32 = 0.015;
/// Zoom change per wheel delta unit
pub const CAMERA_WHEEL_ZOOM_SPEED: f32 = 0.001;
/// Zoom change per pixel of pinch distance
pub const CAMERA_PINCH_ZOOM_SPEED: f32 = 0.01;
/// Position/zoom difference below which the camera counts as converged
pub const CAMERA_CONVERGENCE_EPSILON: f32 = 0.001;
/// Difference below which damped values snap onto their target
pub const CAMERA_SNAP_THRESHOLD: f32 = 0.0001;

/// Velocity multiplier applied every momentum tick (lower = more friction)
pub const MOMENTUM_FRICTION: f32 = 0.92;
/// Release velocity (world units/s) needed to enter momentum
pub const MOMENTUM_MIN_VELOCITY: f32 = 0.05;
/// Velocity (world units/s) below which momentum stops
pub const MOMENTUM_STOP_VELOCITY: f32 = 0.01;
/// A release this long after the last drag move carries no momentum
pub const MOMENTUM_RELEASE_WINDOW_MS: f64 = 100.0;
/// Weight of the newest sample in the drag velocity estimate
pub const DRAG_VELOCITY_SMOOTHING: f32 = 0.8;
