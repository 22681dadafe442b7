//! Level-of-detail resource management.
//!
//! Picks a tier per tile from the zoom level, issues fetches for tiers that
//! are not resident, applies completions (discarding stale ones) and evicts
//! tiers nobody will show again. A tile keeps at most its displayed tier plus
//! one fading-out predecessor alive.

use crate::animation::AnimState;
use crate::config::{LodSettings, TierSettings};
use crate::events::{EventQueue, GalleryEvent};
use crate::resource::{ResourceCompletion, ResourceHandle, ResourceId, ResourceLoader, ResourceRequest};
use crate::tile::{Tier, Tile};
use tracing::{debug, warn};

fn tier_settings(lod: &LodSettings, tier: Tier) -> &TierSettings {
    match tier {
        Tier::Low => &lod.low,
        Tier::Medium => &lod.medium,
        Tier::High => &lod.high,
    }
}

/// Highest tier whose minimum the zoom strictly exceeds; `Low` otherwise.
pub fn select_tier(zoom: f32, lod: &LodSettings) -> Tier {
    Tier::ALL
        .into_iter()
        .rev()
        .find(|&tier| zoom > tier_settings(lod, tier).min)
        .unwrap_or(Tier::Low)
}

pub struct LodManager {
    settings: LodSettings,
    last_zoom: Option<f32>,
    released: Vec<ResourceId>,
}

impl LodManager {
    pub fn new(settings: LodSettings) -> Self {
        Self {
            settings,
            last_zoom: None,
            released: Vec::new(),
        }
    }

    pub fn settings(&self) -> &LodSettings {
        &self.settings
    }

    /// New target tier if zoom moved past the hysteresis band since the last
    /// evaluation (or `force` is set), else `None`.
    pub fn reevaluate(&mut self, zoom: f32, force: bool) -> Option<Tier> {
        let moved = self
            .last_zoom
            .map_or(true, |last| (zoom - last).abs() > self.settings.hysteresis);
        if !(moved || force) {
            return None;
        }
        self.last_zoom = Some(zoom);
        Some(select_tier(zoom, &self.settings))
    }

    /// Resource ids released since the last call; the renderer frees them.
    pub fn take_released(&mut self) -> Vec<ResourceId> {
        std::mem::take(&mut self.released)
    }

    fn release(&mut self, tile: &Tile, tier: Tier, handle: ResourceHandle, events: &mut EventQueue) {
        debug!(tile = %tile.id, %tier, resource = %handle.id(), "evicting tier");
        events.push(GalleryEvent::ResourceEvicted {
            tile: tile.id,
            tier,
            resource: handle.id(),
        });
        self.released.push(handle.id());
    }

    /// Show a resident tier, moving the old one to the fade-out slot.
    fn switch_to(&mut self, tile: &mut Tile, anim: &mut AnimState, tier: Tier, events: &mut EventQueue) {
        if tile.current_tier == Some(tier) {
            return;
        }
        if let Some((old_tier, old_handle)) = tile.fade_from.take() {
            self.release(tile, old_tier, old_handle, events);
        }
        if let Some(previous) = tile.current_tier {
            tile.fade_from = tile.loaded.remove(previous).map(|handle| (previous, handle));
        }
        tile.current_tier = Some(tier);
        anim.begin_crossfade();
    }

    /// Display `tier` if resident, otherwise fetch it unless a fetch is
    /// already outstanding. Returns true if the displayed tier changed.
    pub fn request_tier(
        &mut self,
        tile: &mut Tile,
        anim: &mut AnimState,
        tier: Tier,
        loader: &mut dyn ResourceLoader,
        events: &mut EventQueue,
    ) -> bool {
        if tile.loaded.contains(tier) {
            let changed = tile.current_tier != Some(tier);
            self.switch_to(tile, anim, tier, events);
            return changed;
        }
        if tile.in_flight.contains(tier) {
            return false;
        }

        let url = tile.resource_urls.get(tier).to_string();
        debug!(tile = %tile.id, %tier, %url, "requesting tier");
        tile.in_flight.insert(tier, ());
        loader.request(ResourceRequest {
            tile: tile.id,
            tier,
            url,
        });
        events.push(GalleryEvent::ResourceRequested { tile: tile.id, tier });
        false
    }

    /// Point a tile at a new target tier.
    ///
    /// Resident tiers other than the displayed one and the new target are
    /// released at once. The target is fetched only when `fetch` is set
    /// (visible tiles); otherwise it is fetched once the tile shows up.
    pub fn retarget(
        &mut self,
        tile: &mut Tile,
        anim: &mut AnimState,
        tier: Tier,
        fetch: bool,
        loader: &mut dyn ResourceLoader,
        events: &mut EventQueue,
    ) -> bool {
        if tile.target_tier != tier {
            debug!(tile = %tile.id, from = %tile.target_tier, to = %tier, "retargeting tile");
            tile.target_tier = tier;
            let doomed: Vec<Tier> = tile
                .loaded
                .tiers()
                .filter(|&t| Some(t) != tile.current_tier && t != tier)
                .collect();
            for t in doomed {
                if let Some(handle) = tile.loaded.remove(t) {
                    self.release(tile, t, handle, events);
                }
            }
        }

        if fetch || tile.loaded.contains(tier) {
            self.request_tier(tile, anim, tier, loader, events)
        } else {
            false
        }
    }

    /// Fetch the target tier of a tile that just became visible, if it is
    /// neither shown nor on its way.
    pub fn ensure_target(
        &mut self,
        tile: &mut Tile,
        anim: &mut AnimState,
        loader: &mut dyn ResourceLoader,
        events: &mut EventQueue,
    ) -> bool {
        if tile.current_tier == Some(tile.target_tier) {
            return false;
        }
        let tier = tile.target_tier;
        self.request_tier(tile, anim, tier, loader, events)
    }

    /// Apply a finished fetch. Returns true if a redraw is needed.
    pub fn apply_completion(
        &mut self,
        tiles: &mut [Tile],
        anims: &mut [AnimState],
        completion: ResourceCompletion,
        events: &mut EventQueue,
    ) -> bool {
        let ResourceCompletion { tile: id, tier, result } = completion;
        let (Some(tile), Some(anim)) = (tiles.get_mut(id.index()), anims.get_mut(id.index())) else {
            warn!(tile = %id, %tier, "completion for unknown tile");
            if let Ok(handle) = result {
                self.released.push(handle.id());
            }
            return false;
        };
        tile.in_flight.remove(tier);

        match result {
            Ok(handle) if tile.target_tier != tier => {
                debug!(tile = %id, %tier, target = %tile.target_tier, "discarding stale completion");
                self.released.push(handle.id());
                events.push(GalleryEvent::StaleResourceDiscarded { tile: id, tier });
                false
            }
            Ok(handle) => {
                let resource = handle.id();
                if let Some(replaced) = tile.loaded.insert(tier, handle) {
                    self.released.push(replaced.id());
                }
                self.switch_to(tile, anim, tier, events);
                tile.is_loaded = true;
                debug!(tile = %id, %tier, %resource, "tier loaded");
                events.push(GalleryEvent::ResourceLoaded { tile: id, tier, resource });
                true
            }
            Err(e) => {
                warn!(tile = %id, %tier, url = tile.resource_urls.get(tier), error = %e, "failed to load tile tier");
                tile.is_loaded = true;
                events.push(GalleryEvent::ResourceFailed {
                    tile: id,
                    tier,
                    reason: e.to_string(),
                });
                true
            }
        }
    }

    /// Drop the fade-out source once the crossfade is over.
    pub fn finish_crossfade(&mut self, tile: &mut Tile, events: &mut EventQueue) {
        if let Some((tier, handle)) = tile.fade_from.take() {
            self.release(tile, tier, handle, events);
        }
    }

    /// Release everything a tile holds.
    pub fn release_all(&mut self, tile: &mut Tile, events: &mut EventQueue) {
        self.finish_crossfade(tile, events);
        let held: Vec<_> = tile.loaded.drain().collect();
        for (tier, handle) in held {
            self.release(tile, tier, handle, events);
        }
        tile.current_tier = None;
        tile.in_flight = Default::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TilePlacement;
    use crate::manifest::ManifestItem;
    use crate::resource::{DecodedImage, ManualLoader};
    use crate::tile::TileId;
    use crate::error::{FetchError, ResourceLoadError};
    use glam::Vec2;
    use proptest::prelude::*;

    struct Fixture {
        lod: LodManager,
        tiles: Vec<Tile>,
        anims: Vec<AnimState>,
        loader: ManualLoader,
        events: EventQueue,
    }

    impl Fixture {
        fn new() -> Self {
            let settings = LodSettings::default();
            let placement = TilePlacement {
                id: TileId(0),
                column: 0,
                center: Vec2::new(0.0, -1.0),
                size: Vec2::new(1.8, 2.16),
            };
            let item = ManifestItem::new("https://img.example.com/p?w=1200&q=90");
            Self {
                lod: LodManager::new(settings),
                tiles: vec![Tile::new(&placement, &item, &settings)],
                anims: vec![AnimState::new(0, placement.center)],
                loader: ManualLoader::new(),
                events: EventQueue::new(),
            }
        }

        fn retarget(&mut self, tier: Tier) -> bool {
            self.lod.retarget(
                &mut self.tiles[0],
                &mut self.anims[0],
                tier,
                true,
                &mut self.loader,
                &mut self.events,
            )
        }

        /// Answer the oldest pending request for `tier`, if there is one.
        fn complete(&mut self, tier: Tier, ok: bool) -> bool {
            let Some(request) = self.loader.take_request(TileId(0), tier) else {
                return false;
            };
            let result = if ok {
                Ok(ResourceHandle::new(DecodedImage::solid(2, 2, [255; 4])))
            } else {
                Err(ResourceLoadError::Fetch(FetchError::Status(500)))
            };
            self.loader.complete(&request, result);
            let mut dirty = false;
            for completion in self.loader.poll_completions() {
                dirty |= self
                    .lod
                    .apply_completion(&mut self.tiles, &mut self.anims, completion, &mut self.events);
            }
            dirty
        }

        fn tile(&self) -> &Tile {
            &self.tiles[0]
        }
    }

    #[test]
    fn test_select_tier_thresholds() {
        let lod = LodSettings::default();
        assert_eq!(select_tier(0.5, &lod), Tier::Low);
        assert_eq!(select_tier(1.0, &lod), Tier::Low);
        assert_eq!(select_tier(1.01, &lod), Tier::Medium);
        assert_eq!(select_tier(1.8, &lod), Tier::Medium);
        assert_eq!(select_tier(1.81, &lod), Tier::High);
        assert_eq!(select_tier(3.5, &lod), Tier::High);
    }

    #[test]
    fn test_reevaluate_respects_hysteresis() {
        let mut lod = LodManager::new(LodSettings::default());
        assert_eq!(lod.reevaluate(1.5, false), Some(Tier::Medium));
        assert_eq!(lod.reevaluate(1.51, false), None);
        assert_eq!(lod.reevaluate(1.51, true), Some(Tier::Medium));
        assert_eq!(lod.reevaluate(1.9, false), Some(Tier::High));
    }

    #[test]
    fn test_high_tier_fetch_keeps_previous_until_resolved() {
        let mut f = Fixture::new();
        f.retarget(Tier::Low);
        assert!(f.complete(Tier::Low, true));
        assert_eq!(f.tile().current_tier, Some(Tier::Low));
        f.anims[0].crossfade = 1.0;

        assert!(!f.retarget(Tier::High));
        assert!(f.tile().in_flight.contains(Tier::High));
        assert_eq!(f.tile().current_tier, Some(Tier::Low));
        assert_eq!(f.anims[0].crossfade, 1.0);

        assert!(f.complete(Tier::High, true));
        assert_eq!(f.tile().current_tier, Some(Tier::High));
        assert_eq!(f.anims[0].crossfade, 0.0);
        assert_eq!(f.tile().fade_from.as_ref().map(|(t, _)| *t), Some(Tier::Low));
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut f = Fixture::new();
        f.retarget(Tier::Low);
        f.complete(Tier::Low, true);

        f.retarget(Tier::Medium);
        f.retarget(Tier::High);
        // Medium lands after the target moved on
        assert!(!f.complete(Tier::Medium, true));
        assert_eq!(f.tile().current_tier, Some(Tier::Low));
        assert!(!f.tile().loaded.contains(Tier::Medium));
        assert_eq!(f.lod.take_released().len(), 1);
        assert!(f
            .events
            .iter()
            .any(|e| matches!(e, GalleryEvent::StaleResourceDiscarded { tier: Tier::Medium, .. })));

        assert!(f.complete(Tier::High, true));
        assert_eq!(f.tile().current_tier, Some(Tier::High));
    }

    #[test]
    fn test_failure_clears_placeholder_and_keeps_tier() {
        let mut f = Fixture::new();
        f.retarget(Tier::Low);
        assert!(f.complete(Tier::Low, false));
        assert!(f.tile().is_loaded);
        assert_eq!(f.tile().current_tier, None);
        assert!(!f.tile().in_flight.contains(Tier::Low));
    }

    #[test]
    fn test_finished_crossfade_releases_previous() {
        let mut f = Fixture::new();
        f.retarget(Tier::Low);
        f.complete(Tier::Low, true);
        f.retarget(Tier::Medium);
        f.complete(Tier::Medium, true);
        f.lod.take_released();

        f.lod.finish_crossfade(&mut f.tiles[0], &mut f.events);
        assert_eq!(f.lod.take_released().len(), 1);
        assert_eq!(f.tile().resident_count(), 1);
    }

    #[test]
    fn test_in_flight_request_is_not_duplicated() {
        let mut f = Fixture::new();
        f.retarget(Tier::Medium);
        f.retarget(Tier::Low);
        f.retarget(Tier::Medium);
        let medium_requests = f.loader.pending.iter().filter(|r| r.tier == Tier::Medium).count();
        assert_eq!(medium_requests, 1);
        assert!(f.loader.pending.iter().any(|r| r.url.contains("w=800&q=85")));
    }

    #[test]
    fn test_release_all() {
        let mut f = Fixture::new();
        f.retarget(Tier::Low);
        f.complete(Tier::Low, true);
        f.retarget(Tier::High);
        f.complete(Tier::High, true);
        f.lod.take_released();

        f.lod.release_all(&mut f.tiles[0], &mut f.events);
        assert_eq!(f.lod.take_released().len(), 2);
        assert_eq!(f.tile().resident_count(), 0);
        assert_eq!(f.tile().current_tier, None);
    }

    fn tier_strategy() -> impl Strategy<Value = Tier> {
        prop_oneof![Just(Tier::Low), Just(Tier::Medium), Just(Tier::High)]
    }

    #[derive(Debug, Clone)]
    enum Op {
        Retarget(Tier),
        Complete(Tier, bool),
        FinishFade,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            tier_strategy().prop_map(Op::Retarget),
            (tier_strategy(), any::<bool>()).prop_map(|(t, ok)| Op::Complete(t, ok)),
            Just(Op::FinishFade),
        ]
    }

    proptest! {
        #[test]
        fn prop_exactly_one_tier_and_monotonic(a in 0.0f32..5.0, b in 0.0f32..5.0) {
            let lod = LodSettings::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(select_tier(lo, &lod) <= select_tier(hi, &lod));

            let tier = select_tier(a, &lod);
            let matching = Tier::ALL
                .into_iter()
                .filter(|&t| a > tier_settings(&lod, t).min)
                .max();
            prop_assert_eq!(Some(tier), matching.or(Some(Tier::Low)));
        }

        #[test]
        fn prop_memory_bound_and_current_resident(ops in prop::collection::vec(op_strategy(), 1..60)) {
            let mut f = Fixture::new();
            for op in ops {
                match op {
                    Op::Retarget(t) => { f.retarget(t); }
                    Op::Complete(t, ok) => { f.complete(t, ok); }
                    Op::FinishFade => f.lod.finish_crossfade(&mut f.tiles[0], &mut f.events),
                }
                let tile = f.tile();
                prop_assert!(tile.loaded.len() <= 1);
                prop_assert!(tile.resident_count() <= 2);
                if let Some(current) = tile.current_tier {
                    prop_assert!(tile.loaded.contains(current));
                }
            }
        }

        #[test]
        fn prop_stale_completion_never_displayed(first in tier_strategy(), second in tier_strategy()) {
            prop_assume!(first != second);
            let mut f = Fixture::new();
            f.retarget(first);
            f.retarget(second);
            f.complete(first, true);
            prop_assert_ne!(f.tile().current_tier, Some(first));
        }
    }
}
