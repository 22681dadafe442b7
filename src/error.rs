//! Error taxonomy for the gallery.
//!
//! Fatal errors (`GalleryError`) abort construction. Per-tile failures
//! (`ResourceLoadError`) are logged and swallowed at the tile boundary.

use std::time::Duration;
use thiserror::Error;

/// Errors that abort gallery construction.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// The manifest could not be fetched after every retry.
    #[error("failed to load gallery manifest after {attempts} attempt(s): {source}")]
    ManifestFetch {
        attempts: u32,
        #[source]
        source: FetchError,
    },

    /// The manifest body or one of its entries is malformed.
    #[error("invalid gallery manifest{}: {reason}", .index.map(|i| format!(" at index {i}")).unwrap_or_default())]
    Validation { index: Option<usize>, reason: String },

    /// The manifest parsed but contains no items.
    #[error("gallery manifest contains no items")]
    EmptyManifest,

    /// Layout was asked for fewer than one column.
    #[error("invalid column count: {0}")]
    InvalidColumnCount(usize),

    /// Any other nonsensical configuration value.
    #[error("invalid gallery configuration: {0}")]
    Config(String),
}

impl GalleryError {
    /// Message suitable for the host's error banner.
    pub fn user_message(&self) -> &'static str {
        match self {
            GalleryError::ManifestFetch { .. } | GalleryError::Validation { .. } | GalleryError::EmptyManifest => {
                "Failed to load gallery. Please refresh the page."
            }
            GalleryError::InvalidColumnCount(_) | GalleryError::Config(_) => {
                "The gallery is misconfigured."
            }
        }
    }
}

/// Failure of a single fetch.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("i/o error: {0}")]
    Io(String),
}

/// A single tile tier failed to load. Never fatal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResourceLoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to decode image: {0}")]
    Decode(String),
}
