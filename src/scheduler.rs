//! Render-on-demand bookkeeping: frame timing, visibility cadence, redraw
//! decision and draw-list construction.

use crate::animation::AnimState;
use crate::camera::Camera;
use crate::renderer::{DrawItem, DrawKind, Frame};
use crate::tile::{Tile, TileId};
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

/// Turns host timestamps into frame deltas.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_timestamp: Option<f64>,
    default_ms: f64,
    max_ms: f64,
}

impl FrameClock {
    pub fn new(default_ms: f64, max_ms: f64) -> Self {
        Self {
            last_timestamp: None,
            default_ms,
            max_ms,
        }
    }

    /// Milliseconds since the previous tick. The first tick reports the
    /// default frame time; stalls are capped; clocks running backwards
    /// report zero.
    pub fn advance(&mut self, timestamp_ms: f64) -> f64 {
        let dt = match self.last_timestamp {
            None => self.default_ms,
            Some(last) => (timestamp_ms - last).clamp(0.0, self.max_ms),
        };
        self.last_timestamp = Some(timestamp_ms);
        dt
    }
}

/// Fires at most once per tick, and once per `interval_ms` of accumulated
/// frame time. Starts primed so the first rendered tick runs a pass.
#[derive(Debug, Clone)]
pub struct VisibilityCadence {
    accumulated_ms: f64,
    interval_ms: f64,
    forced: bool,
}

impl VisibilityCadence {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            accumulated_ms: 0.0,
            interval_ms,
            forced: true,
        }
    }

    /// Run a pass on the next tick regardless of the accumulator.
    pub fn force(&mut self) {
        self.forced = true;
    }

    pub fn advance(&mut self, dt_ms: f64) -> bool {
        self.accumulated_ms += dt_ms;
        let due = self.accumulated_ms >= self.interval_ms;
        if due {
            // Backlog from long frames is dropped rather than replayed
            self.accumulated_ms = (self.accumulated_ms - self.interval_ms) % self.interval_ms;
        }
        if self.forced {
            self.forced = false;
            return true;
        }
        due
    }
}

/// Reasons a tick might have to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedrawSignals {
    pub dirty: bool,
    pub intro_active: bool,
    pub camera_moving: bool,
    pub floating: bool,
    pub momentum: bool,
    pub animating: bool,
}

impl RedrawSignals {
    pub fn needs_redraw(&self) -> bool {
        self.dirty || self.intro_active || self.camera_moving || self.floating || self.momentum || self.animating
    }
}

/// Tile quad transform: hover scale and tilt about the tile center.
fn model_matrix(position: Vec2, size: Vec2, anim: &AnimState, hover_scale: f32) -> Mat4 {
    let scale = anim.scale(hover_scale);
    Mat4::from_scale_rotation_translation(
        Vec3::new(size.x * scale, size.y * scale, 1.0),
        Quat::from_euler(EulerRot::XYZ, anim.tilt.x, anim.tilt.y, 0.0),
        position.extend(0.0),
    )
}

pub struct FrameInputs<'a> {
    pub tiles: &'a [Tile],
    pub anims: &'a [AnimState],
    pub camera: &'a Camera,
    pub camera_offset: Vec2,
    pub hover_scale: f32,
    pub hovered: Option<TileId>,
}

/// Build the draw list. Visible tiles are drawn, and so is every tile still
/// sliding in, since its cached visibility may be stale.
pub fn build_frame(inputs: &FrameInputs<'_>) -> Frame {
    puffin::profile_function!();

    let mut items = Vec::new();
    for (tile, anim) in inputs.tiles.iter().zip(inputs.anims) {
        if !tile.visible && anim.intro_done() {
            continue;
        }

        let position = anim.position(tile.target_position());
        let model = model_matrix(position, tile.size, anim, inputs.hover_scale);
        let item = |kind, opacity, resource, z_order| DrawItem {
            tile: tile.id,
            kind,
            position,
            size: tile.size,
            model,
            opacity,
            resource,
            z_order,
        };

        match tile.current_handle() {
            Some(handle) => {
                if anim.crossfade < 1.0 {
                    match &tile.fade_from {
                        Some((_, previous)) => items.push(item(
                            DrawKind::FadeOut,
                            anim.fade_out_opacity(),
                            Some(previous.clone()),
                            -1,
                        )),
                        None => items.push(item(
                            DrawKind::Placeholder { spinner: None },
                            anim.fade_out_opacity(),
                            None,
                            -1,
                        )),
                    }
                }
                let z = if inputs.hovered == Some(tile.id) { 2 } else { 0 };
                items.push(item(DrawKind::Image, anim.opacity(), Some(handle.clone()), z));
            }
            None => {
                let spinner = (!tile.is_loaded).then_some(anim.spinner_angle);
                items.push(item(DrawKind::Placeholder { spinner }, anim.intro_eased, None, 3));
            }
        }
    }
    items.sort_by_key(|item| item.z_order);

    let camera_position = inputs.camera.position() + inputs.camera_offset;
    Frame {
        view_projection: inputs.camera.projection_matrix(inputs.camera_offset),
        camera_position,
        zoom: inputs.camera.zoom(),
        items,
    }
}
