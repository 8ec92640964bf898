//! Engine configuration with a versioned JSON file format.
//!
//! Every field has a default, so a partial file (or none at all) is valid.

use crate::error::{ClipError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Current config schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Playback and range enforcement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Cadence of the out-point enforcement poll.
    pub range_poll_interval_ms: u64,
    /// Timeline track width used when no real layout is available.
    pub track_width_px: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            range_poll_interval_ms: 100,
            track_width_px: 800.0,
        }
    }
}

impl PlaybackConfig {
    pub fn range_poll_interval(&self) -> Duration {
        Duration::from_millis(self.range_poll_interval_ms)
    }
}

/// Buffer and throughput sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Minimum spacing between buffered-range updates.
    pub buffer_throttle_ms: u64,
    /// Minimum spacing between throughput samples.
    pub throughput_throttle_ms: u64,
    /// Byte rate assumed when frame dimensions are unknown.
    pub fallback_bytes_per_second: f64,
    /// Rough encoded bytes per pixel per second of media.
    pub bytes_per_pixel_second: f64,
    /// Throughput at or above this is reported as good (MB/s).
    pub good_mbps: f64,
    /// Throughput at or above this is reported as fair (MB/s).
    pub fair_mbps: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            buffer_throttle_ms: 500,
            throughput_throttle_ms: 2500,
            fallback_bytes_per_second: 500_000.0,
            bytes_per_pixel_second: 0.25,
            good_mbps: 1.0,
            fair_mbps: 0.3,
        }
    }
}

impl MonitorConfig {
    pub fn buffer_throttle(&self) -> Duration {
        Duration::from_millis(self.buffer_throttle_ms)
    }

    pub fn throughput_throttle(&self) -> Duration {
        Duration::from_millis(self.throughput_throttle_ms)
    }
}

/// Remote optimize-job polling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Delay between status checks while the job is running.
    pub poll_interval_ms: u64,
    /// Transport failures tolerated in a row before giving up.
    pub max_retries: u32,
    /// Hard wall-clock ceiling for a job.
    pub timeout_ms: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3000,
            max_retries: 3,
            timeout_ms: 300_000,
        }
    }
}

impl JobConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Back-off after a failed status query: twice the normal interval.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.saturating_mul(2))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Thumbnail acquisition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Extra margin around the viewport that still counts as visible.
    pub lookahead_px: f32,
    pub width: u32,
    pub height: u32,
    /// Offset into the asset where the still frame is taken.
    pub time_offset_secs: f64,
    /// JPEG quality, 1-100.
    pub quality: u8,
    /// Retries after a failed acquisition.
    pub max_retries: u32,
    /// Base back-off between acquisition retries.
    pub retry_backoff_ms: u64,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            lookahead_px: 100.0,
            width: 320,
            height: 180,
            time_offset_secs: 1.0,
            quality: 85,
            max_retries: 2,
            retry_backoff_ms: 1000,
        }
    }
}

impl ThumbnailConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// All engine settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub playback: PlaybackConfig,
    pub monitor: MonitorConfig,
    pub jobs: JobConfig,
    pub thumbnails: ThumbnailConfig,
}

impl EngineConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.playback.range_poll_interval_ms == 0 {
            return Err(ClipError::Config("range_poll_interval_ms must be > 0".into()));
        }
        if self.jobs.poll_interval_ms == 0 {
            return Err(ClipError::Config("poll_interval_ms must be > 0".into()));
        }
        if self.jobs.timeout_ms < self.jobs.poll_interval_ms {
            return Err(ClipError::Config(
                "timeout_ms must be at least poll_interval_ms".into(),
            ));
        }
        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(ClipError::Config(format!(
                "thumbnail quality {} outside 1-100",
                self.thumbnails.quality
            )));
        }
        if self.monitor.fair_mbps > self.monitor.good_mbps {
            return Err(ClipError::Config("fair_mbps must not exceed good_mbps".into()));
        }
        Ok(())
    }
}

/// Versioned config file wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Schema version for migration.
    pub version: u32,
    /// The settings.
    #[serde(default)]
    pub engine: EngineConfig,
}

impl ConfigFile {
    pub fn new(engine: EngineConfig) -> Self {
        Self {
            version: CURRENT_VERSION,
            engine,
        }
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| ClipError::Serialization(format!("Failed to serialize config: {}", e)))
    }

    /// Deserialize from JSON bytes and validate.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| ClipError::Serialization(format!("Invalid JSON: {}", e)))?;

        let version = match raw.get("version") {
            None => 0,
            Some(v) => v.as_u64().and_then(|v| u32::try_from(v).ok()).ok_or_else(|| {
                ClipError::Serialization(format!("Unsupported config file version {}", v))
            })?,
        };
        if version > CURRENT_VERSION {
            return Err(ClipError::Serialization(format!(
                "Config file version {} is newer than supported version {}",
                version, CURRENT_VERSION
            )));
        }

        // v0 files are a bare EngineConfig without the wrapper
        let value = if raw.get("version").is_none() {
            serde_json::json!({ "version": CURRENT_VERSION, "engine": raw })
        } else {
            raw
        };

        let file: Self = serde_json::from_value(value)
            .map_err(|e| ClipError::Serialization(format!("Failed to parse config: {}", e)))?;
        file.engine.validate()?;
        Ok(file)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let data = self.to_json()?;
        std::fs::write(path, data)?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }
}
