//! Gallery constants organized by domain.
//!
//! Centralizing magic numbers makes tuning easier and documents intent.
//! These are the defaults behind `GalleryConfig`; most of them can be
//! overridden at initialization.

mod animation;
mod camera;
mod layout;
mod lod;
mod network;
mod render;
mod ui;

pub use animation::*;
pub use camera::*;
pub use layout::*;
pub use lod::*;
pub use network::*;
pub use render::*;
pub use ui::*;
