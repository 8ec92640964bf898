//! Thumbnail acquisition service contract.

use crate::error::Result;
use clipforge_core::ThumbnailConfig;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Request options forwarded to the acquisition service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailOptions {
    pub width: u32,
    pub height: u32,
    /// Offset into the asset where the frame is grabbed.
    pub time_offset_secs: f64,
    /// JPEG quality, 1-100.
    pub quality: u8,
    /// Ignore any copy the service has cached.
    pub force_regenerate: bool,
}

impl ThumbnailOptions {
    pub fn from_config(config: &ThumbnailConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            time_offset_secs: config.time_offset_secs,
            quality: config.quality,
            force_regenerate: false,
        }
    }

    pub fn forced(mut self, force: bool) -> Self {
        self.force_regenerate = force;
        self
    }
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self::from_config(&ThumbnailConfig::default())
    }
}

/// A rendered still frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    /// Locator of the source asset.
    pub source: String,
    /// Where the rendered image can be fetched.
    pub uri: String,
    pub width: u32,
    pub height: u32,
}

/// Operations the loader needs from the thumbnail service.
pub trait ResourceAcquirer: Send + Sync + 'static {
    /// Render (or fetch) the thumbnail for `locator`.
    fn acquire(
        &self,
        locator: &str,
        options: &ThumbnailOptions,
    ) -> impl Future<Output = Result<Thumbnail>> + Send;

    /// Drop any copy the service holds for `locator`.
    fn invalidate(&self, locator: &str) -> impl Future<Output = Result<()>> + Send;
}
