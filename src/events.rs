//! Gallery events for observers (hosts, tests, debug overlays).
//!
//! The core pushes events as it mutates state; the host drains them
//! whenever it likes. Nothing inside the gallery consumes them.

use crate::camera::InteractionMode;
use crate::resource::ResourceId;
use crate::tile::{Tier, TileId};

#[derive(Debug, Clone, PartialEq)]
pub enum GalleryEvent {
    /// A fetch was issued for a tile tier
    ResourceRequested { tile: TileId, tier: Tier },
    /// A tier became resident and is now the displayed one
    ResourceLoaded { tile: TileId, tier: Tier, resource: ResourceId },
    /// A resident tier was released
    ResourceEvicted { tile: TileId, tier: Tier, resource: ResourceId },
    /// A fetch or decode failed; the tile keeps what it had
    ResourceFailed { tile: TileId, tier: Tier, reason: String },
    /// A completion arrived after the tile retargeted
    StaleResourceDiscarded { tile: TileId, tier: Tier },
    /// Viewport width crossed a column breakpoint
    ColumnsChanged { from: usize, to: usize },
    /// Camera interaction mode changed
    ModeChanged { from: InteractionMode, to: InteractionMode },
}

/// Events are pushed during a tick and drained by the host.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<GalleryEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: GalleryEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = GalleryEvent> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &GalleryEvent> + '_ {
        self.events.iter()
    }
}
