//! The gallery: owns every subsystem and drives them from `tick`.

use crate::animation::{AnimState, IntroClock};
use crate::camera::{Camera, InteractionMode};
use crate::config::GalleryConfig;
use crate::constants::CAMERA_CONVERGENCE_EPSILON;
use crate::error::GalleryError;
use crate::events::{EventQueue, GalleryEvent};
use crate::input::{Gesture, InputEvent, InputQueue, InputState, PointerKind};
use crate::layout::layout;
use crate::lod::LodManager;
use crate::manifest::{Fetcher, ManifestItem, ManifestLoader};
use crate::renderer::Renderer;
use crate::resource::ResourceLoader;
use crate::scheduler::{build_frame, FrameClock, FrameInputs, RedrawSignals, VisibilityCadence};
use crate::tile::{Tier, Tile, TileId};
use crate::visibility::{cull, hit_test, Rect, TileBounds};
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing changed; no work was done
    Idle,
    /// A frame was handed to the renderer
    Rendered,
    /// The gallery has been torn down
    TornDown,
}

pub struct Gallery<L: ResourceLoader> {
    config: GalleryConfig,
    tiles: Vec<Tile>,
    anims: Vec<AnimState>,
    camera: Camera,
    lod: LodManager,
    loader: L,
    input_queue: InputQueue,
    input: InputState,
    events: EventQueue,
    intro: IntroClock,
    frame_clock: FrameClock,
    visibility: VisibilityCadence,
    columns: usize,
    content_height: f32,
    float_phase: Vec2,
    float_time: f32,
    hovered: Option<TileId>,
    zoom_moving: bool,
    dirty: bool,
    torn_down: bool,
}

impl<L: ResourceLoader> Gallery<L> {
    /// Lay out `items` and start loading the low tier of every tile.
    pub fn initialize(
        config: GalleryConfig,
        items: Vec<ManifestItem>,
        viewport: Vec2,
        mut loader: L,
    ) -> Result<Self, GalleryError> {
        config.validate()?;
        let config = config.effective();

        let columns = config.columns.columns_for_width(viewport.x);
        let placement = layout(items.len(), columns, &config.layout)?;

        let mut tiles: Vec<Tile> = placement
            .tiles
            .iter()
            .zip(&items)
            .map(|(p, item)| Tile::new(p, item, &config.lod))
            .collect();
        let mut anims: Vec<AnimState> = tiles
            .iter()
            .map(|t| AnimState::new(t.id.index(), t.target_position()))
            .collect();

        let camera = Camera::new(
            config.camera,
            config.momentum,
            viewport.x,
            viewport.y,
            Vec2::new(0.0, placement.initial_camera_y()),
        );

        let mut lod = LodManager::new(config.lod);
        let mut events = EventQueue::new();
        // Hold the initial zoom so the first ticks keep the low tier
        lod.reevaluate(camera.zoom(), true);

        for (tile, anim) in tiles.iter_mut().zip(anims.iter_mut()) {
            lod.request_tier(tile, anim, Tier::Low, &mut loader, &mut events);
        }

        let mut rng = rand::thread_rng();
        let float_phase = Vec2::new(rng.gen_range(0.0..TAU), rng.gen_range(0.0..TAU));

        info!(
            tiles = tiles.len(),
            columns,
            content_height = placement.content_height,
            "gallery initialized"
        );

        Ok(Self {
            intro: IntroClock::new(config.animation.intro_speed, tiles.len()),
            frame_clock: FrameClock::new(config.render.default_frame_ms, config.render.max_frame_ms),
            visibility: VisibilityCadence::new(config.render.visibility_interval_ms),
            config,
            tiles,
            anims,
            camera,
            lod,
            loader,
            input_queue: InputQueue::new(),
            input: InputState::new(),
            events,
            columns,
            content_height: placement.content_height,
            float_phase,
            float_time: 0.0,
            hovered: None,
            zoom_moving: false,
            dirty: true,
            torn_down: false,
        })
    }

    /// Fetch the manifest (with retries) and initialize from it.
    pub async fn load(
        config: GalleryConfig,
        fetcher: &dyn Fetcher,
        manifest_url: &str,
        viewport: Vec2,
        loader: L,
    ) -> Result<Self, GalleryError> {
        config.validate()?;
        let items = ManifestLoader::new(fetcher, config.network).load(manifest_url).await?;
        Self::initialize(config, items, viewport, loader)
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn anim(&self, id: TileId) -> Option<&AnimState> {
        self.anims.get(id.index())
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn content_height(&self) -> f32 {
        self.content_height
    }

    pub fn hovered(&self) -> Option<TileId> {
        self.hovered
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Events produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<GalleryEvent> {
        self.events.drain().collect()
    }

    pub fn handle_pointer(&mut self, event: InputEvent) {
        if !self.torn_down {
            self.input_queue.push(event);
        }
    }

    pub fn handle_wheel(&mut self, delta_y: f32, position: Vec2) {
        self.handle_pointer(InputEvent::Wheel { delta_y, position });
    }

    pub fn handle_resize(&mut self, width: f32, height: f32) {
        self.handle_pointer(InputEvent::Resize { width, height });
    }

    fn floating_active(&self) -> bool {
        self.config.animation.floating_enabled && self.intro.is_complete()
    }

    /// Gallery-wide ambient drift applied to the rendered camera only.
    fn float_offset(&self) -> Vec2 {
        if !self.floating_active() {
            return Vec2::ZERO;
        }
        let a = &self.config.animation;
        Vec2::new(
            (self.float_time * a.gallery_float_speed_x + self.float_phase.x).sin() * a.gallery_float_amplitude_x,
            (self.float_time * a.gallery_float_speed_y + self.float_phase.y).cos() * a.gallery_float_amplitude_y,
        )
    }

    fn tile_bounds(&self) -> impl Iterator<Item = TileBounds> + '_ {
        self.tiles.iter().zip(&self.anims).map(|(tile, anim)| TileBounds {
            id: tile.id,
            rect: Rect::from_center(anim.position(tile.target_position()), tile.half_size()),
        })
    }

    fn any_tile_animating(&self) -> bool {
        self.tiles
            .iter()
            .zip(&self.anims)
            .any(|(tile, anim)| tile.visible && (!anim.is_settled() || !tile.is_loaded))
    }

    fn record_mode_change(&mut self, before: InteractionMode) {
        let after = self.camera.mode();
        if before != after {
            debug!(?before, ?after, "interaction mode changed");
            self.events.push(GalleryEvent::ModeChanged { from: before, to: after });
        }
    }

    fn apply_gesture(&mut self, gesture: Gesture) {
        let before = self.camera.mode();
        match gesture {
            Gesture::DragStart { time_ms } => self.camera.begin_drag(time_ms),
            Gesture::DragMove { delta, kind, time_ms } => {
                if self.camera.mode() == InteractionMode::Dragging {
                    let speed = match kind {
                        PointerKind::Mouse => self.config.camera.pan_speed,
                        PointerKind::Touch => self.config.camera.touch_pan_speed,
                    };
                    self.camera.drag_by(delta, speed, time_ms);
                }
            }
            Gesture::DragEnd { time_ms } => self.camera.end_drag(time_ms),
            Gesture::DragCancel => self.camera.cancel_drag(),
            Gesture::Pinch { delta_distance, center } => self.camera.zoom_pinch(delta_distance, center),
            Gesture::Wheel { delta_y, anchor } => self.camera.zoom_wheel(delta_y, anchor),
            Gesture::Hover(_) => self.update_hover(),
            Gesture::Resize { width, height } => self.resize(width, height),
        }
        self.record_mode_change(before);
        self.dirty = true;
    }

    /// Column count follows the breakpoints, but tiles keep their layout.
    fn resize(&mut self, width: f32, height: f32) {
        self.camera.resize(width, height);
        let columns = self.config.columns.columns_for_width(width);
        if columns != self.columns {
            info!(from = self.columns, to = columns, width, "column breakpoint crossed");
            self.events.push(GalleryEvent::ColumnsChanged {
                from: self.columns,
                to: columns,
            });
            self.columns = columns;
        }
        self.visibility.force();
    }

    /// Re-run the hit test under the mouse and point hover targets at it.
    fn update_hover(&mut self) {
        if !self.config.hover.enabled {
            return;
        }
        let hit = self.input.hover_position.and_then(|screen| {
            let world = self.camera.screen_to_world(screen) + self.float_offset();
            hit_test(self.tile_bounds(), world).map(|id| (id, world))
        });

        let max_tilt = self.config.hover.max_tilt;
        let new_hovered = hit.map(|(id, _)| id);
        if new_hovered != self.hovered {
            if let Some(previous) = self.hovered {
                if let (Some(tile), Some(anim)) = (self.tiles.get(previous.index()), self.anims.get_mut(previous.index())) {
                    anim.set_hover(None, tile.half_size(), max_tilt);
                }
            }
            self.hovered = new_hovered;
        }
        if let Some((id, world)) = hit {
            if let (Some(tile), Some(anim)) = (self.tiles.get(id.index()), self.anims.get_mut(id.index())) {
                let offset = world - anim.position(tile.target_position());
                anim.set_hover(Some(offset), tile.half_size(), max_tilt);
            }
        }
    }

    fn apply_completions(&mut self) {
        for completion in self.loader.poll_completions() {
            self.dirty |= self
                .lod
                .apply_completion(&mut self.tiles, &mut self.anims, completion, &mut self.events);
        }
    }

    fn apply_input(&mut self) {
        let events: Vec<InputEvent> = self.input_queue.drain().collect();
        for event in events {
            for gesture in self.input.process(event) {
                self.apply_gesture(gesture);
            }
        }
    }

    fn retarget_all(&mut self, tier: Tier) {
        debug!(%tier, zoom = self.camera.zoom(), "re-selecting tiers");
        for (tile, anim) in self.tiles.iter_mut().zip(self.anims.iter_mut()) {
            let fetch = tile.visible;
            self.dirty |= self
                .lod
                .retarget(tile, anim, tier, fetch, &mut self.loader, &mut self.events);
        }
    }

    fn update_visibility(&mut self) {
        puffin::profile_function!();
        let view = self.camera.view_bounds(self.float_offset());
        let mut visible = vec![false; self.tiles.len()];
        for id in cull(self.tile_bounds(), &view, self.config.render.visibility_margin) {
            visible[id.index()] = true;
        }

        for ((tile, anim), now_visible) in self.tiles.iter_mut().zip(self.anims.iter_mut()).zip(visible) {
            let appeared = now_visible && !tile.visible;
            tile.visible = now_visible;
            if appeared {
                self.dirty |= self
                    .lod
                    .ensure_target(tile, anim, &mut self.loader, &mut self.events);
            }
        }
    }

    fn advance_animations(&mut self) {
        let hover = self.config.hover;
        let crossfade_step = self.config.animation.crossfade_step;
        let spinner_speed = self.config.animation.spinner_speed;

        for (tile, anim) in self.tiles.iter_mut().zip(self.anims.iter_mut()) {
            anim.set_intro(self.intro.tile_progress(tile.id.index()));
            if !tile.visible {
                continue;
            }
            anim.advance_hover(hover.speed, hover.tilt_speed);
            if anim.advance_crossfade(crossfade_step) {
                self.lod.finish_crossfade(tile, &mut self.events);
            }
            if !tile.is_loaded {
                anim.advance_spinner(spinner_speed);
            }
        }
    }

    fn flush_releases(&mut self, renderer: &mut dyn Renderer) {
        for id in self.lod.take_released() {
            renderer.release(id);
        }
    }

    /// Advance one frame. Skips all work when nothing would change on
    /// screen.
    pub fn tick(&mut self, timestamp_ms: f64, renderer: &mut dyn Renderer) -> TickOutcome {
        if self.torn_down {
            return TickOutcome::TornDown;
        }
        puffin::profile_function!();

        let dt_ms = self.frame_clock.advance(timestamp_ms);
        self.apply_completions();
        self.apply_input();

        let signals = RedrawSignals {
            dirty: self.dirty,
            intro_active: !self.intro.is_complete(),
            camera_moving: !self.camera.is_converged(),
            floating: self.floating_active(),
            momentum: self.camera.has_momentum(),
            animating: self.any_tile_animating(),
        };
        if !signals.needs_redraw() {
            self.flush_releases(renderer);
            return TickOutcome::Idle;
        }

        let dt = (dt_ms / 1000.0) as f32;

        {
            puffin::profile_scope!("viewport");
            let before = self.camera.mode();
            self.camera.apply_momentum(dt);
            self.camera.tick(self.config.animation.damping);
            self.record_mode_change(before);
        }

        let intro_was_complete = self.intro.is_complete();
        self.intro.advance(dt);
        let intro_finished = !intro_was_complete && self.intro.is_complete();
        if self.floating_active() {
            self.float_time += dt;
        }

        {
            puffin::profile_scope!("lod");
            let state = self.camera.state();
            let zoom_settled = (state.zoom - state.target_zoom).abs() <= CAMERA_CONVERGENCE_EPSILON;
            let force = intro_finished || (self.zoom_moving && zoom_settled);
            self.zoom_moving = !zoom_settled;
            if let Some(tier) = self.lod.reevaluate(self.camera.zoom(), force) {
                self.retarget_all(tier);
            }
        }

        if self.visibility.advance(dt_ms) {
            self.update_visibility();
        }

        self.advance_animations();
        if self.input.hover_position.is_some() {
            self.update_hover();
        }

        self.flush_releases(renderer);

        let frame = build_frame(&FrameInputs {
            tiles: &self.tiles,
            anims: &self.anims,
            camera: &self.camera,
            camera_offset: self.float_offset(),
            hover_scale: self.config.hover.scale,
            hovered: self.hovered,
        });
        renderer.render(&frame);

        self.dirty = false;
        TickOutcome::Rendered
    }

    /// Release every resource and stop. Later ticks return `TornDown` and
    /// late completions are dropped.
    pub fn teardown(&mut self, renderer: &mut dyn Renderer) {
        if self.torn_down {
            return;
        }
        self.loader.shutdown();
        for tile in &mut self.tiles {
            self.lod.release_all(tile, &mut self.events);
        }
        self.flush_releases(renderer);
        self.input_queue.clear();
        self.torn_down = true;
        info!(tiles = self.tiles.len(), "gallery torn down");
    }
}
