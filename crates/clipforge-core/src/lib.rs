//! ClipForge Core - Foundation types for clip authoring
//!
//! This crate provides the pieces every other ClipForge crate builds on:
//! - Timecode formatting and parsing
//! - The trim range model and its invariants
//! - Media assets and immutable clip descriptors
//! - Error taxonomy and engine configuration

pub mod clip;
pub mod config;
pub mod error;
pub mod time;
pub mod trim;

pub use clip::{clip_name, create_clip, AssetId, ClipDescriptor, MediaAsset};
pub use config::{
    ConfigFile, EngineConfig, JobConfig, MonitorConfig, PlaybackConfig, ThumbnailConfig,
};
pub use error::{ClipError, ErrorClass, Result};
pub use time::{format_time, parse_time_string, round_ms, same_ms, MIN_CLIP_SECS};
pub use trim::{SeekBounds, TrimRange};
