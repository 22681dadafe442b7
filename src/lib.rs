//! Zoomable masonry image gallery core.
//!
//! Lays tiles out in columns, streams progressively sharper resources as
//! the viewer zooms, turns pointer input into damped camera motion, and
//! produces a draw list only when something on screen changed. Drawing,
//! windowing and raw input capture belong to the host.

pub mod animation;
pub mod camera;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod gallery;
pub mod input;
pub mod layout;
pub mod lod;
pub mod manifest;
pub mod renderer;
pub mod resource;
pub mod scheduler;
pub mod tile;
pub mod visibility;

pub use config::GalleryConfig;
pub use error::{FetchError, GalleryError, ResourceLoadError};
pub use gallery::{Gallery, TickOutcome};
pub use manifest::{FileFetcher, Fetcher, HttpFetcher, ManifestItem, RoutingFetcher};
pub use renderer::{DrawItem, DrawKind, Frame, Renderer};
pub use resource::{AsyncResourceLoader, ManualLoader, ResourceLoader};
