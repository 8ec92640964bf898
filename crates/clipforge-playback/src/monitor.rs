//! Buffered-range and network throughput observation.
//!
//! Both observers are throttled independently. Throughput is a rough
//! estimate derived from buffered-extent growth and is advisory only.

use clipforge_core::MonitorConfig;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, trace};

/// Derived buffering snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BufferState {
    /// Buffered extent as a fraction of the duration, `[0, 1]`.
    pub buffered_fraction: f64,
    pub is_stalled: bool,
    /// Estimated throughput in MB/s, when a sample exists.
    pub throughput_mbps: Option<f64>,
}

/// Qualitative network indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkQuality {
    Good,
    Fair,
    Poor,
    #[default]
    Unknown,
}

/// Throttled buffer/throughput observer.
#[derive(Debug)]
pub struct BufferNetworkMonitor {
    config: MonitorConfig,
    state: BufferState,
    load_started: Option<Instant>,
    last_progress: Option<Instant>,
    last_sample: Option<Instant>,
}

impl BufferNetworkMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            state: BufferState::default(),
            load_started: None,
            last_progress: None,
            last_sample: None,
        }
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    /// An asset load began at `now`. Forgets everything about the previous one.
    pub fn restart(&mut self, now: Instant) {
        self.state = BufferState::default();
        self.load_started = Some(now);
        self.last_progress = None;
        self.last_sample = None;
    }

    /// Buffered range grew. Returns `true` if the update was applied
    /// rather than throttled.
    pub fn on_progress(&mut self, now: Instant, buffered_extent: f64, duration: f64) -> bool {
        if !throttle_elapsed(self.last_progress, now, self.config.buffer_throttle()) {
            return false;
        }
        self.last_progress = Some(now);
        self.state.buffered_fraction = if duration > 0.0 && buffered_extent.is_finite() {
            (buffered_extent / duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        trace!(fraction = self.state.buffered_fraction, "Buffer progress");
        true
    }

    /// Take a throughput sample. Returns the new estimate, or `None` when
    /// throttled or when no time has passed since the load began.
    pub fn sample_throughput(
        &mut self,
        now: Instant,
        buffered_extent: f64,
        frame_size: Option<(u32, u32)>,
    ) -> Option<f64> {
        let started = self.load_started?;
        if !throttle_elapsed(self.last_sample, now, self.config.throughput_throttle()) {
            return None;
        }
        self.last_sample = Some(now);

        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        if elapsed <= 0.0 || !buffered_extent.is_finite() {
            return None;
        }
        let bytes_per_media_second = match frame_size {
            Some((w, h)) if w > 0 && h > 0 => {
                f64::from(w) * f64::from(h) * self.config.bytes_per_pixel_second
            }
            _ => self.config.fallback_bytes_per_second,
        };
        let mbps = buffered_extent.max(0.0) * bytes_per_media_second / elapsed / 1_000_000.0;
        self.state.throughput_mbps = Some(mbps);
        debug!(mbps, quality = ?self.quality(), "Throughput sample");
        Some(mbps)
    }

    /// Waiting/stalled notification.
    pub fn on_stalled(&mut self) {
        if !self.state.is_stalled {
            debug!("Playback stalled");
        }
        self.state.is_stalled = true;
    }

    /// Can-resume notification.
    pub fn on_resumed(&mut self) {
        if self.state.is_stalled {
            debug!("Playback resumed");
        }
        self.state.is_stalled = false;
    }

    /// Qualitative bucket for the current estimate.
    pub fn quality(&self) -> NetworkQuality {
        match self.state.throughput_mbps {
            None => NetworkQuality::Unknown,
            Some(m) if m >= self.config.good_mbps => NetworkQuality::Good,
            Some(m) if m >= self.config.fair_mbps => NetworkQuality::Fair,
            Some(_) => NetworkQuality::Poor,
        }
    }
}

impl Default for BufferNetworkMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

fn throttle_elapsed(last: Option<Instant>, now: Instant, interval: std::time::Duration) -> bool {
    match last {
        Some(last) => now.saturating_duration_since(last) >= interval,
        None => true,
    }
}
