mod app;
mod gl_renderer;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use canvas_gallery::config::NetworkSettings;
use canvas_gallery::constants::{IDLE_POLL_MS, WHEEL_LINE_PIXELS};
use canvas_gallery::input::{InputEvent, PointerKind};
use canvas_gallery::manifest::{is_remote_url, ManifestLoader};
use canvas_gallery::{
    AsyncResourceLoader, Fetcher, Frame, Gallery, GalleryConfig, GalleryError, ManifestItem, Renderer,
    RoutingFetcher, TickOutcome,
};
use gl_renderer::GlRenderer;
use glam::{Mat4, Vec2};
use glutin::prelude::*;
use glutin::surface::WindowSurface;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const DEFAULT_MANIFEST: &str = "gallery-images.json";
const MOUSE_POINTER_ID: u64 = 0;

type ManifestResult = Result<Vec<ManifestItem>, GalleryError>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Usage: canvas-gallery [manifest path or URL] [config.json]
    let mut args = std::env::args().skip(1);
    let manifest = args.next().unwrap_or_else(|| DEFAULT_MANIFEST.to_string());
    let config = match args.next() {
        Some(path) => GalleryConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => GalleryConfig::default(),
    };
    config.validate()?;

    puffin::set_scopes_on(std::env::var_os("CANVAS_GALLERY_PROFILE").is_some());

    let runtime = tokio::runtime::Runtime::new()?;
    let event_loop = EventLoop::new()?;
    let mut app = App::new(runtime, manifest, config)?;
    event_loop.run_app(&mut app)?;
    Ok(())
}

struct App {
    runtime: tokio::runtime::Runtime,
    manifest: String,
    config: GalleryConfig,
    fetcher: Arc<dyn Fetcher>,
    state: Option<AppState>,
}

// Field order is drop order: GL objects go before the context
struct AppState {
    gallery: Option<Gallery<AsyncResourceLoader>>,
    manifest_rx: Option<oneshot::Receiver<ManifestResult>>,
    renderer: GlRenderer,
    gl_surface: glutin::surface::Surface<WindowSurface>,
    gl_context: glutin::context::PossiblyCurrentContext,
    window: Window,
    cursor: Vec2,
    started: Instant,
    last_outcome: TickOutcome,
    next_poll: Instant,
}

impl App {
    fn new(
        runtime: tokio::runtime::Runtime,
        manifest: String,
        config: GalleryConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.network.timeout_ms))
            .build()?;

        Ok(Self {
            runtime,
            manifest,
            config,
            fetcher: Arc::new(RoutingFetcher::new(client)),
            state: None,
        })
    }

    fn poll_manifest(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let Some(rx) = state.manifest_rx.as_mut() else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => {
                error!("manifest load ended without a result");
                event_loop.exit();
                return;
            }
        };
        state.manifest_rx = None;

        let gallery = result.and_then(|items| {
            let items = resolve_urls(items, &self.manifest);
            let loader = AsyncResourceLoader::new(
                self.runtime.handle().clone(),
                self.fetcher.clone(),
                Duration::from_millis(self.config.network.timeout_ms),
            );
            Gallery::initialize(self.config.clone(), items, state.viewport(), loader)
        });

        match gallery {
            Ok(gallery) => {
                info!(manifest = %self.manifest, tiles = gallery.tiles().len(), "gallery ready");
                state.gallery = Some(gallery);
                state.window.request_redraw();
            }
            Err(e) => {
                error!(error = %e, "{}", e.user_message());
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let ctx = match app::create_window(event_loop) {
            Ok(ctx) => ctx,
            Err(e) => {
                error!(error = %e, "failed to create window");
                event_loop.exit();
                return;
            }
        };

        let renderer = match GlRenderer::new(ctx.gl.clone()) {
            Ok(renderer) => renderer,
            Err(e) => {
                error!(error = %e, "failed to create renderer");
                event_loop.exit();
                return;
            }
        };

        let size = ctx.window.inner_size();
        renderer.resize(size.width as i32, size.height as i32);

        let now = Instant::now();
        self.state = Some(AppState {
            gallery: None,
            manifest_rx: Some(spawn_manifest_load(
                self.runtime.handle(),
                self.fetcher.clone(),
                self.config.network,
                self.manifest.clone(),
            )),
            renderer,
            gl_surface: ctx.gl_surface,
            gl_context: ctx.gl_context,
            window: ctx.window,
            cursor: Vec2::ZERO,
            started: now,
            last_outcome: TickOutcome::Idle,
            next_poll: now,
        });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let state = match &mut self.state {
            Some(s) => s,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                state.shutdown();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    state.shutdown();
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(size) => {
                app::resize_surface(&state.gl_surface, &state.gl_context, size.width, size.height);
                state.renderer.resize(size.width as i32, size.height as i32);
                state.push_input(InputEvent::Resize {
                    width: size.width as f32,
                    height: size.height as f32,
                });
            }
            WindowEvent::CursorMoved { position, .. } => {
                state.cursor = Vec2::new(position.x as f32, position.y as f32);
                let event = InputEvent::PointerMove {
                    id: MOUSE_POINTER_ID,
                    kind: PointerKind::Mouse,
                    position: state.cursor,
                    time_ms: state.now_ms(),
                };
                state.push_input(event);
            }
            WindowEvent::CursorLeft { .. } => {
                state.push_input(InputEvent::PointerLeave);
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => {
                let (id, kind, position, time_ms) =
                    (MOUSE_POINTER_ID, PointerKind::Mouse, state.cursor, state.now_ms());
                let event = match button_state {
                    ElementState::Pressed => InputEvent::PointerDown { id, kind, position, time_ms },
                    ElementState::Released => InputEvent::PointerUp { id, kind, position, time_ms },
                };
                state.push_input(event);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // Positive deltas zoom out, matching DOM wheel events
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * WHEEL_LINE_PIXELS,
                    MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
                };
                let position = state.cursor;
                state.push_input(InputEvent::Wheel { delta_y, position });
            }
            WindowEvent::Touch(touch) => {
                let event = state.touch_event(touch);
                state.push_input(event);
            }
            WindowEvent::RedrawRequested => {
                state.update_and_render();
            }
            _ => {}
        }
    }

    /// Keep drawing while the gallery renders; otherwise sleep until input
    /// arrives or the next poll for finished loads is due.
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.poll_manifest(event_loop);

        let Some(state) = &mut self.state else {
            return;
        };
        let poll_interval = Duration::from_millis(IDLE_POLL_MS);

        if state.gallery.is_none() {
            event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + poll_interval));
            return;
        }

        match wake_after(state.last_outcome, Instant::now(), state.next_poll) {
            Wake::Redraw => {
                state.window.request_redraw();
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            Wake::SleepUntil(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            Wake::Sleep => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}

impl AppState {
    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    fn viewport(&self) -> Vec2 {
        let size = self.window.inner_size();
        Vec2::new(size.width as f32, size.height as f32)
    }

    /// Queue input for the next tick and make sure that tick happens.
    fn push_input(&mut self, event: InputEvent) {
        if let Some(gallery) = &mut self.gallery {
            gallery.handle_pointer(event);
            self.window.request_redraw();
        }
    }

    fn touch_event(&self, touch: Touch) -> InputEvent {
        let id = touch.id;
        let kind = PointerKind::Touch;
        let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
        let time_ms = self.now_ms();
        match touch.phase {
            TouchPhase::Started => InputEvent::PointerDown { id, kind, position, time_ms },
            TouchPhase::Moved => InputEvent::PointerMove { id, kind, position, time_ms },
            TouchPhase::Ended => InputEvent::PointerUp { id, kind, position, time_ms },
            TouchPhase::Cancelled => InputEvent::PointerCancel { id },
        }
    }

    fn update_and_render(&mut self) {
        puffin::GlobalProfiler::lock().new_frame();
        puffin::profile_function!();

        let now = self.now_ms();
        let Some(gallery) = &mut self.gallery else {
            // Background only while the manifest is loading
            self.renderer.render(&Frame {
                view_projection: Mat4::IDENTITY,
                camera_position: Vec2::ZERO,
                zoom: 1.0,
                items: Vec::new(),
            });
            self.swap_buffers();
            return;
        };

        self.last_outcome = gallery.tick(now, &mut self.renderer);
        if gallery.has_events() {
            for event in gallery.drain_events() {
                tracing::trace!(?event, "gallery event");
            }
        }

        match self.last_outcome {
            TickOutcome::Rendered => self.swap_buffers(),
            TickOutcome::Idle => self.next_poll = Instant::now() + Duration::from_millis(IDLE_POLL_MS),
            TickOutcome::TornDown => {}
        }
    }

    fn swap_buffers(&self) {
        if let Err(e) = self.gl_surface.swap_buffers(&self.gl_context) {
            warn!(error = %e, "swap_buffers failed");
        }
    }

    fn shutdown(&mut self) {
        if let Some(gallery) = &mut self.gallery {
            gallery.teardown(&mut self.renderer);
        }
    }
}

/// Fetch the manifest on the runtime. The result is picked up from the
/// event loop once it arrives, so the window stays responsive meanwhile.
fn spawn_manifest_load(
    runtime: &tokio::runtime::Handle,
    fetcher: Arc<dyn Fetcher>,
    network: NetworkSettings,
    manifest: String,
) -> oneshot::Receiver<ManifestResult> {
    let (tx, rx) = oneshot::channel();
    runtime.spawn(async move {
        let result = ManifestLoader::new(fetcher.as_ref(), network).load(&manifest).await;
        let _ = tx.send(result);
    });
    rx
}

#[derive(Debug, PartialEq, Eq)]
enum Wake {
    Redraw,
    SleepUntil(Instant),
    Sleep,
}

/// Rendering ticks chain into the next frame (swaps pace them); idle ticks
/// sleep until the next poll for finished loads.
fn wake_after(outcome: TickOutcome, now: Instant, next_poll: Instant) -> Wake {
    match outcome {
        TickOutcome::Rendered => Wake::Redraw,
        TickOutcome::Idle if now >= next_poll => Wake::Redraw,
        TickOutcome::Idle => Wake::SleepUntil(next_poll),
        TickOutcome::TornDown => Wake::Sleep,
    }
}

/// Resolve relative image locations against the manifest's location.
fn resolve_urls(items: Vec<ManifestItem>, manifest: &str) -> Vec<ManifestItem> {
    items
        .into_iter()
        .map(|mut item| {
            let url = &item.image_url;
            if !is_remote_url(url) && !url.starts_with("file://") && !Path::new(url).is_absolute() {
                item.image_url = resolve_one(url, manifest);
            }
            item
        })
        .collect()
}

fn resolve_one(relative: &str, manifest: &str) -> String {
    if is_remote_url(manifest) {
        match reqwest::Url::parse(manifest).and_then(|base| base.join(relative)) {
            Ok(url) => url.to_string(),
            Err(_) => relative.to_string(),
        }
    } else {
        match Path::new(manifest).parent() {
            Some(dir) => dir.join(relative).to_string_lossy().into_owned(),
            None => relative.to_string(),
        }
    }
}
