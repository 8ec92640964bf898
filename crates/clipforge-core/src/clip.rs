//! Media assets and clip descriptors.

use crate::error::{ClipError, Result};
use crate::time::{format_time, round_ms, MIN_CLIP_SECS};
use crate::trim::TrimRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Stable identifier of a media asset in the library.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A media asset referenced by the editor. Owned by the library, not by us.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Stable identifier
    pub id: AssetId,
    /// Display name (usually the file name)
    pub name: String,
    /// Where the media can be loaded from
    pub locator: String,
    /// Declared MIME type, if known
    #[serde(default)]
    pub content_type: Option<String>,
    /// Size in bytes, if known
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

impl MediaAsset {
    /// Create an asset with no optional metadata.
    pub fn new(id: impl Into<String>, name: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            id: AssetId::new(id),
            name: name.into(),
            locator: locator.into(),
            content_type: None,
            size_bytes: None,
        }
    }

    /// Name without its file extension.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }
}

/// An immutable clip selection handed to the timeline.
///
/// Only [`create_clip`] builds one, so `end - start >= MIN_CLIP_SECS`
/// holds for every descriptor in existence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipDescriptor {
    id: Uuid,
    source_asset_id: AssetId,
    name: String,
    start_time: f64,
    end_time: f64,
}

impl ClipDescriptor {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source_asset_id(&self) -> &AssetId {
        &self.source_asset_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Clip length in seconds.
    pub fn duration(&self) -> f64 {
        round_ms(self.end_time - self.start_time)
    }
}

/// Deterministic clip name: asset stem plus formatted in/out points.
pub fn clip_name(asset: &MediaAsset, start: f64, end: f64) -> String {
    format!(
        "{} [{} - {}]",
        asset.stem(),
        format_time(start),
        format_time(end)
    )
}

/// Validate the trim range and emit a clip descriptor.
///
/// Checks run in order: asset present, start before end, minimum length.
pub fn create_clip(asset: Option<&MediaAsset>, range: &TrimRange) -> Result<ClipDescriptor> {
    let asset = asset.ok_or(ClipError::NoAssetSelected)?;
    let start = round_ms(range.start());
    let end = round_ms(range.end());

    if start >= end {
        return Err(ClipError::InvalidOrder { start, end });
    }

    let length = round_ms(end - start);
    if length < MIN_CLIP_SECS {
        return Err(ClipError::TooShort {
            length,
            minimum: MIN_CLIP_SECS,
        });
    }

    let clip = ClipDescriptor {
        id: Uuid::new_v4(),
        source_asset_id: asset.id.clone(),
        name: clip_name(asset, start, end),
        start_time: start,
        end_time: end,
    };
    debug!(asset = %asset.id, clip = %clip.id, start, end, "Clip created");
    Ok(clip)
}
