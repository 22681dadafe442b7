//! Draw-list types handed to the external renderer once per rendered tick.

use crate::resource::{ResourceHandle, ResourceId};
use crate::tile::TileId;
use glam::{Mat4, Vec2};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawKind {
    /// The displayed tier
    Image,
    /// Outgoing tier during a crossfade
    FadeOut,
    /// Flat quad shown until a tier is displayed; the spinner angle is set
    /// while the first load is still pending
    Placeholder { spinner: Option<f32> },
}

/// One positioned quad.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub tile: TileId,
    pub kind: DrawKind,
    /// World-space center
    pub position: Vec2,
    /// Unscaled world-space size
    pub size: Vec2,
    /// Maps the unit quad `[-0.5, 0.5]^2` into world space (hover scale and
    /// tilt included)
    pub model: Mat4,
    pub opacity: f32,
    pub resource: Option<ResourceHandle>,
    /// Draw order, lowest first
    pub z_order: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub view_projection: Mat4,
    /// Rendered camera center, floating offset included
    pub camera_position: Vec2,
    pub zoom: f32,
    /// Sorted by `z_order`
    pub items: Vec<DrawItem>,
}

/// Anything that can draw a frame.
pub trait Renderer {
    fn render(&mut self, frame: &Frame);

    /// Free whatever GPU-side state belongs to a released resource.
    fn release(&mut self, resource: ResourceId);
}

/// Renderer that keeps what it was given. Used headless and in tests.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub frames: Vec<Frame>,
    pub released: Vec<ResourceId>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, frame: &Frame) {
        self.frames.push(frame.clone());
    }

    fn release(&mut self, resource: ResourceId) {
        self.released.push(resource);
    }
}
