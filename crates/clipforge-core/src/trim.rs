//! Trim range model: the in/out interval selected on the active asset.
//!
//! Invariant after every setter, once `duration >= MIN_CLIP_SECS`:
//! `0 <= start <= end - MIN_CLIP_SECS <= duration`.
//! Shorter assets cannot hold a valid range; setters then only clamp
//! into `[0, duration]`.

use crate::error::Result;
use crate::time::{parse_time_string, round_ms, MIN_CLIP_SECS};
use serde::{Deserialize, Serialize};

/// Which interval `set_current` clamps into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekBounds {
    /// Bounded playback: `[start, end]`.
    Range,
    /// Free seeking across the whole asset: `[0, duration]`.
    Free,
}

/// Trim range state for the active asset. All values in seconds,
/// stored at millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrimRange {
    start: f64,
    end: f64,
    duration: f64,
    current: f64,
}

impl TrimRange {
    /// Empty range, used before an asset's metadata resolves.
    pub const EMPTY: Self = Self {
        start: 0.0,
        end: 0.0,
        duration: 0.0,
        current: 0.0,
    };

    /// Range covering a whole asset of the given duration.
    pub fn with_duration(duration: f64) -> Self {
        let mut range = Self::EMPTY;
        range.reset(duration);
        range
    }

    /// In point.
    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Out point.
    #[inline]
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Asset duration.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Current playhead position.
    #[inline]
    pub fn current(&self) -> f64 {
        self.current
    }

    /// Selected clip length.
    #[inline]
    pub fn clip_length(&self) -> f64 {
        round_ms(self.end - self.start)
    }

    /// Whether `t` lies in the half-open interval `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        let t = round_ms(t);
        t >= self.start && t < self.end
    }

    /// Whether metadata has resolved for the active asset.
    pub fn is_loaded(&self) -> bool {
        self.duration > 0.0
    }

    /// Reset to cover the whole asset: `start = 0`, `end = duration`, `current = 0`.
    pub fn reset(&mut self, duration: f64) {
        let duration = round_ms(duration).max(0.0);
        self.start = 0.0;
        self.end = duration;
        self.duration = duration;
        self.current = 0.0;
    }

    /// Back to the `{0, 0, 0, 0}` state used while no asset is loaded.
    pub fn clear(&mut self) {
        *self = Self::EMPTY;
    }

    /// Move the in point, clamped to `[0, end - MIN_CLIP_SECS]`.
    ///
    /// Returns whether the stored value changed.
    pub fn set_start(&mut self, t: f64) -> bool {
        let upper = round_ms(self.end - MIN_CLIP_SECS).max(0.0);
        let value = clamp(round_ms(t), 0.0, upper);
        replace(&mut self.start, value)
    }

    /// Move the out point, clamped to `[start + MIN_CLIP_SECS, duration]`.
    ///
    /// Returns whether the stored value changed.
    pub fn set_end(&mut self, t: f64) -> bool {
        let upper = self.duration;
        let lower = round_ms(self.start + MIN_CLIP_SECS).min(upper);
        let value = clamp(round_ms(t), lower, upper);
        replace(&mut self.end, value)
    }

    /// Move the playhead.
    ///
    /// Returns whether the stored value changed.
    pub fn set_current(&mut self, t: f64, bounds: SeekBounds) -> bool {
        let (lower, upper) = match bounds {
            SeekBounds::Range => (self.start, self.end),
            SeekBounds::Free => (0.0, self.duration),
        };
        let value = clamp(round_ms(t), lower, upper);
        replace(&mut self.current, value)
    }

    /// Apply a typed in point from a text field.
    pub fn set_start_text(&mut self, text: &str) -> Result<bool> {
        let t = parse_time_string(text)?;
        Ok(self.set_start(t))
    }

    /// Apply a typed out point from a text field.
    pub fn set_end_text(&mut self, text: &str) -> Result<bool> {
        let t = parse_time_string(text)?;
        Ok(self.set_end(t))
    }

    /// Check the range invariant. Always true for ranges built through
    /// the setters; exposed for tests and debug assertions.
    pub fn is_consistent(&self) -> bool {
        if self.duration < MIN_CLIP_SECS {
            return self.start >= 0.0 && self.end <= self.duration;
        }
        self.start >= 0.0
            && self.start <= round_ms(self.end - MIN_CLIP_SECS)
            && self.end <= self.duration
    }
}

fn clamp(value: f64, lower: f64, upper: f64) -> f64 {
    if upper < lower {
        return lower;
    }
    value.max(lower).min(upper)
}

fn replace(slot: &mut f64, value: f64) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
