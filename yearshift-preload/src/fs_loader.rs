//! Asset loader backed by a local directory

use crate::{AssetLoader, Error, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use yearshift_core::url_path;

/// Resolves asset URLs against a public directory on disk
#[derive(Debug, Clone)]
pub struct FsAssetLoader {
    root: PathBuf,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps `/assets/x.png?v=2` to `<root>/assets/x.png`, refusing `..` segments
    pub fn path_for(&self, url: &str) -> Result<PathBuf> {
        let relative = Path::new(url_path(url).trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(Error::InvalidPath(url.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetLoader for FsAssetLoader {
    async fn load_image(&self, url: &str) -> Result<()> {
        let path = self.path_for(url)?;
        // Decoding is CPU bound, keep it off the reactor
        tokio::task::spawn_blocking(move || image::open(&path).map(|_| ()))
            .await
            .map_err(|e| Error::Task(e.to_string()))??;
        Ok(())
    }

    async fn load_video(&self, url: &str) -> Result<()> {
        let path = self.path_for(url)?;
        let bytes = tokio::fs::read(&path).await?;
        if bytes.is_empty() {
            return Err(Error::EmptyMedia(url.to_string()));
        }
        Ok(())
    }
}
