//! Yearshift Preload Library
//!
//! This library warms transition clips and idle images before the navigator
//! accepts input, reporting progress and holding a minimum splash duration.

pub mod fs_loader;
pub mod gate;
pub mod progress;

pub use fs_loader::FsAssetLoader;
pub use gate::{GatePhase, PreloadGate, PreloadReport};
pub use progress::Progress;

use async_trait::async_trait;
use std::time::Duration;

/// Result type for yearshift-preload operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for yearshift-preload operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Asset path escapes root: {0}")]
    InvalidPath(String),

    #[error("Empty media file: {0}")]
    EmptyMedia(String),

    #[error("Loader task failed: {0}")]
    Task(String),
}

/// Fetches one asset far enough to be served from cache later.
///
/// Errors are reported, but the gate counts a failed item as complete.
#[async_trait]
pub trait AssetLoader: Send + Sync {
    /// Loads an image completely
    async fn load_image(&self, url: &str) -> Result<()>;

    /// Buffers a video enough to play through
    async fn load_video(&self, url: &str) -> Result<()>;
}

#[async_trait]
impl<T: AssetLoader + ?Sized> AssetLoader for std::sync::Arc<T> {
    async fn load_image(&self, url: &str) -> Result<()> {
        (**self).load_image(url).await
    }

    async fn load_video(&self, url: &str) -> Result<()> {
        (**self).load_video(url).await
    }
}

/// Preload gate timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadConfig {
    /// Shortest time the splash stays up, measured from the start of loading
    pub min_display: Duration,
    /// Fade-out delay after the gate opens
    pub fade_out: Duration,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            min_display: Duration::from_millis(400),
            fade_out: Duration::from_millis(400),
        }
    }
}
