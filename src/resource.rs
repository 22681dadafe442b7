//! Decoded image handles and the loaders that produce them.
//!
//! A loader accepts requests from the tick thread and hands completions back
//! through `poll_completions`; tile state is only ever touched on the tick
//! thread.

use crate::error::{FetchError, ResourceLoadError};
use crate::manifest::Fetcher;
use crate::tile::{Tier, TileId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a decoded resource. The renderer keys its textures by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res#{}", self.0)
    }
}

/// RGBA8 pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl DecodedImage {
    pub fn decode(bytes: &[u8]) -> Result<Self, ResourceLoadError> {
        let rgba = image::load_from_memory(bytes)
            .map_err(|e| ResourceLoadError::Decode(e.to_string()))?
            .into_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// Single-color image, mostly useful for tests and hosts without a
    /// decoder.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// A resident decoded resource. Clones share the pixels.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    id: ResourceId,
    image: Arc<DecodedImage>,
}

impl ResourceHandle {
    pub fn new(image: DecodedImage) -> Self {
        Self {
            id: ResourceId(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)),
            image: Arc::new(image),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn image(&self) -> &DecodedImage {
        &self.image
    }
}

impl PartialEq for ResourceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResourceHandle {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub tile: TileId,
    pub tier: Tier,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ResourceCompletion {
    pub tile: TileId,
    pub tier: Tier,
    pub result: Result<ResourceHandle, ResourceLoadError>,
}

/// Source of tile resources.
pub trait ResourceLoader {
    /// Start loading. Must not block.
    fn request(&mut self, request: ResourceRequest);

    /// Completions that arrived since the last poll.
    fn poll_completions(&mut self) -> Vec<ResourceCompletion>;

    /// Stop delivering completions. In-flight work may still finish but its
    /// results are dropped.
    fn shutdown(&mut self) {}
}

/// Loads resources on a tokio runtime: fetch, then decode on the blocking
/// pool.
pub struct AsyncResourceLoader {
    runtime: Handle,
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
    sender: UnboundedSender<ResourceCompletion>,
    receiver: UnboundedReceiver<ResourceCompletion>,
}

impl AsyncResourceLoader {
    pub fn new(runtime: Handle, fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            runtime,
            fetcher,
            timeout,
            sender,
            receiver,
        }
    }
}

async fn load_resource(
    fetcher: &dyn Fetcher,
    url: &str,
    timeout: Duration,
) -> Result<ResourceHandle, ResourceLoadError> {
    let bytes = tokio::time::timeout(timeout, fetcher.fetch(url))
        .await
        .map_err(|_| FetchError::Timeout(timeout))??;

    let image = tokio::task::spawn_blocking(move || DecodedImage::decode(&bytes))
        .await
        .map_err(|e| ResourceLoadError::Decode(e.to_string()))??;

    Ok(ResourceHandle::new(image))
}

impl ResourceLoader for AsyncResourceLoader {
    fn request(&mut self, request: ResourceRequest) {
        let fetcher = Arc::clone(&self.fetcher);
        let sender = self.sender.clone();
        let timeout = self.timeout;

        self.runtime.spawn(async move {
            let result = load_resource(fetcher.as_ref(), &request.url, timeout).await;
            let completion = ResourceCompletion {
                tile: request.tile,
                tier: request.tier,
                result,
            };
            if sender.send(completion).is_err() {
                debug!(tile = %request.tile, tier = %request.tier, "loader shut down, dropping completion");
            }
        });
    }

    fn poll_completions(&mut self) -> Vec<ResourceCompletion> {
        let mut completions = Vec::new();
        while let Ok(completion) = self.receiver.try_recv() {
            completions.push(completion);
        }
        completions
    }

    fn shutdown(&mut self) {
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}
    }
}

/// Loader driven by the host: requests queue up in `pending` and the host
/// answers them with `complete`.
#[derive(Debug, Default)]
pub struct ManualLoader {
    pub pending: Vec<ResourceRequest>,
    completions: Vec<ResourceCompletion>,
    shut_down: bool,
}

impl ManualLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the oldest pending request for `tile`/`tier`, if any.
    pub fn take_request(&mut self, tile: TileId, tier: Tier) -> Option<ResourceRequest> {
        let index = self
            .pending
            .iter()
            .position(|r| r.tile == tile && r.tier == tier)?;
        Some(self.pending.remove(index))
    }

    pub fn complete(&mut self, request: &ResourceRequest, result: Result<ResourceHandle, ResourceLoadError>) {
        if self.shut_down {
            return;
        }
        self.completions.push(ResourceCompletion {
            tile: request.tile,
            tier: request.tier,
            result,
        });
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl ResourceLoader for ManualLoader {
    fn request(&mut self, request: ResourceRequest) {
        self.pending.push(request);
    }

    fn poll_completions(&mut self) -> Vec<ResourceCompletion> {
        std::mem::take(&mut self.completions)
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
        self.pending.clear();
        self.completions.clear();
    }
}
