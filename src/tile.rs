//! Tile records and LOD tier bookkeeping.
//!
//! Tiles live in a flat `Vec` indexed by `TileId`; their animation state is
//! kept in a parallel arena (see `animation`), so neither depends on the
//! renderer's object model.

use crate::config::LodSettings;
use crate::layout::TilePlacement;
use crate::manifest::ManifestItem;
use crate::resource::ResourceHandle;
use glam::Vec2;
use std::fmt;

/// Stable tile identity: the item's index in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub usize);

impl TileId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile#{}", self.0)
    }
}

/// Resolution tiers, ordered from coarsest to finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Tier {
    /// All tiers, lowest ordinal first.
    pub const ALL: [Tier; 3] = [Tier::Low, Tier::Medium, Tier::High];

    pub fn ordinal(self) -> usize {
        match self {
            Tier::Low => 0,
            Tier::Medium => 1,
            Tier::High => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Medium => "medium",
            Tier::High => "high",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One optional value per tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierSlots<T> {
    slots: [Option<T>; 3],
}

impl<T> Default for TierSlots<T> {
    fn default() -> Self {
        Self {
            slots: [None, None, None],
        }
    }
}

impl<T> TierSlots<T> {
    pub fn get(&self, tier: Tier) -> Option<&T> {
        self.slots[tier.ordinal()].as_ref()
    }

    pub fn contains(&self, tier: Tier) -> bool {
        self.slots[tier.ordinal()].is_some()
    }

    pub fn insert(&mut self, tier: Tier, value: T) -> Option<T> {
        self.slots[tier.ordinal()].replace(value)
    }

    pub fn remove(&mut self, tier: Tier) -> Option<T> {
        self.slots[tier.ordinal()].take()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tiers currently holding a value.
    pub fn tiers(&self) -> impl Iterator<Item = Tier> + '_ {
        Tier::ALL.into_iter().filter(move |t| self.contains(*t))
    }

    /// Remove and return every value.
    pub fn drain(&mut self) -> impl Iterator<Item = (Tier, T)> + '_ {
        Tier::ALL
            .into_iter()
            .filter_map(move |t| self.slots[t.ordinal()].take().map(|v| (t, v)))
    }
}

/// Resource locator for each tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierUrls {
    pub low: String,
    pub medium: String,
    pub high: String,
}

impl TierUrls {
    /// Derive per-tier URLs from a manifest URL authored at full quality.
    ///
    /// Low and medium substitute their own `w=`/`q=` values for the base
    /// markers; high keeps the base URL unmodified.
    pub fn derive(base_url: &str, lod: &LodSettings) -> Self {
        let width_marker = format!("w={}", lod.base_width);
        let quality_marker = format!("q={}", lod.base_quality);
        let substitute = |width: u32, quality: u32| {
            base_url
                .replacen(&width_marker, &format!("w={width}"), 1)
                .replacen(&quality_marker, &format!("q={quality}"), 1)
        };

        Self {
            low: substitute(lod.low.width, lod.low.quality),
            medium: substitute(lod.medium.width, lod.medium.quality),
            high: base_url.to_string(),
        }
    }

    pub fn get(&self, tier: Tier) -> &str {
        match tier {
            Tier::Low => &self.low,
            Tier::Medium => &self.medium,
            Tier::High => &self.high,
        }
    }
}

/// One media item placed in the grid.
#[derive(Debug, Clone)]
pub struct Tile {
    pub id: TileId,
    /// Resting center in world units; fixed after layout
    target_position: Vec2,
    pub size: Vec2,
    pub column: usize,
    pub resource_urls: TierUrls,
    /// Resident handles per tier
    pub loaded: TierSlots<ResourceHandle>,
    /// Tier on screen; `None` while the placeholder shows
    pub current_tier: Option<Tier>,
    pub target_tier: Tier,
    /// Previously displayed tier and handle, kept until the crossfade finishes
    pub fade_from: Option<(Tier, ResourceHandle)>,
    /// Tiers with a fetch outstanding
    pub in_flight: TierSlots<()>,
    /// Placeholder released (first load finished, successfully or not)
    pub is_loaded: bool,
    pub visible: bool,
    pub title: String,
    pub alt: String,
}

impl Tile {
    pub fn new(placement: &TilePlacement, item: &ManifestItem, lod: &LodSettings) -> Self {
        Self {
            id: placement.id,
            target_position: placement.center,
            size: placement.size,
            column: placement.column,
            resource_urls: TierUrls::derive(&item.image_url, lod),
            loaded: TierSlots::default(),
            current_tier: None,
            target_tier: Tier::Low,
            fade_from: None,
            in_flight: TierSlots::default(),
            is_loaded: false,
            visible: false,
            title: item.title.clone().unwrap_or_default(),
            alt: item.alt.clone().unwrap_or_default(),
        }
    }

    pub fn target_position(&self) -> Vec2 {
        self.target_position
    }

    /// Handle for the tier on screen, if any.
    pub fn current_handle(&self) -> Option<&ResourceHandle> {
        self.current_tier.and_then(|t| self.loaded.get(t))
    }

    /// Number of handles this tile keeps alive (resident tiers plus the
    /// fade-out source).
    pub fn resident_count(&self) -> usize {
        self.loaded.len() + usize::from(self.fade_from.is_some())
    }

    /// Half extents of the resting rectangle.
    pub fn half_size(&self) -> Vec2 {
        self.size * 0.5
    }
}
