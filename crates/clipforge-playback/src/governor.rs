//! Play/pause control with out-point enforcement.
//!
//! Native position events fire too coarsely to stop exactly at the out
//! point, so while playing the governor polls the surface on its own
//! fixed cadence and stops playback once the position reaches `end`.

use crate::error::{Result, SurfaceError};
use crate::surface::{PlayTicket, PlaybackSurface};
use clipforge_core::{round_ms, SeekBounds, TrimRange};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Governor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GovernorState {
    /// Not playing.
    #[default]
    Idle,
    /// A play request is outstanding. Still not playing; a pause, drag
    /// or asset change drops back to `Idle` and the late answer is ignored.
    Starting(PlayTicket),
    /// Surface accepted the play request.
    Playing,
}

impl GovernorState {
    #[must_use]
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    #[must_use]
    pub fn is_idle(self) -> bool {
        !self.is_playing()
    }
}

/// What a play resolution did to the governor.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayResolution {
    /// Playback started.
    Started,
    /// The surface refused to play. The governor stays idle.
    Rejected(SurfaceError),
    /// The answer belonged to a request that is no longer wanted.
    Stale,
}

/// Drives play/pause against the surface and enforces the trim range.
#[derive(Debug)]
pub struct PlaybackGovernor {
    state: GovernorState,
    next_ticket: u64,
    rate: f64,
    poll_interval: Duration,
    last_poll: Option<Instant>,
}

impl PlaybackGovernor {
    /// Create an idle governor polling at `poll_interval`.
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            state: GovernorState::Idle,
            next_ticket: 1,
            rate: 1.0,
            poll_interval,
            last_poll: None,
        }
    }

    pub fn state(&self) -> GovernorState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Ask the surface to play the range.
    ///
    /// Seeks to `start` first when the surface sits outside `[start, end)`.
    /// Returns the ticket the surface will answer with, or `None` when
    /// already playing or no media is loaded.
    pub fn request_play<S: PlaybackSurface>(
        &mut self,
        surface: &mut S,
        range: &mut TrimRange,
    ) -> Option<PlayTicket> {
        match self.state {
            GovernorState::Playing => return None,
            GovernorState::Starting(ticket) => return Some(ticket),
            GovernorState::Idle => {}
        }
        if !range.is_loaded() {
            debug!("Play requested before metadata resolved");
            return None;
        }

        let position = surface.current_position();
        if !range.contains(position) {
            surface.seek(range.start());
            range.set_current(range.start(), SeekBounds::Range);
        }

        let ticket = PlayTicket(self.next_ticket);
        self.next_ticket += 1;
        surface.play(ticket);
        self.state = GovernorState::Starting(ticket);
        self.last_poll = None;
        debug!(%ticket, "Play requested");
        Some(ticket)
    }

    /// Apply the surface's answer to a play request.
    pub fn resolve_play<S: PlaybackSurface>(
        &mut self,
        surface: &mut S,
        ticket: PlayTicket,
        outcome: Result<()>,
    ) -> PlayResolution {
        if self.state != GovernorState::Starting(ticket) {
            // The user moved on. A late success must not leave media running.
            if outcome.is_ok() {
                surface.pause();
            }
            debug!(%ticket, "Ignoring stale play resolution");
            return PlayResolution::Stale;
        }

        match outcome {
            Ok(()) => {
                self.state = GovernorState::Playing;
                info!(%ticket, "Playback started");
                PlayResolution::Started
            }
            Err(e) => {
                self.state = GovernorState::Idle;
                warn!(%ticket, "Playback start rejected: {}", e);
                PlayResolution::Rejected(e)
            }
        }
    }

    /// Pause if playing or starting. Returns whether anything was paused.
    pub fn pause<S: PlaybackSurface>(&mut self, surface: &mut S) -> bool {
        if self.state == GovernorState::Idle {
            return false;
        }
        surface.pause();
        self.state = GovernorState::Idle;
        debug!("Playback paused");
        true
    }

    /// Toggle between playing and paused.
    pub fn toggle<S: PlaybackSurface>(&mut self, surface: &mut S, range: &mut TrimRange) {
        if self.state == GovernorState::Idle {
            self.request_play(surface, range);
        } else {
            self.pause(surface);
        }
    }

    /// Range enforcement poll. Call as often as you like; the check only
    /// runs once per poll interval. Returns `true` when the out point was
    /// reached and playback stopped at the in point.
    pub fn poll<S: PlaybackSurface>(
        &mut self,
        now: Instant,
        surface: &mut S,
        range: &mut TrimRange,
    ) -> bool {
        if !self.is_playing() {
            return false;
        }
        if let Some(last) = self.last_poll {
            if now.saturating_duration_since(last) < self.poll_interval {
                return false;
            }
        }
        self.last_poll = Some(now);

        let position = round_ms(surface.current_position());
        if position < range.end() {
            range.set_current(position, SeekBounds::Range);
            return false;
        }

        surface.pause();
        surface.seek(range.start());
        range.set_current(range.start(), SeekBounds::Range);
        self.state = GovernorState::Idle;
        info!(out_point = range.end(), "Reached out point, rewound to in point");
        true
    }

    /// The surface finished the media. The out point may coincide with
    /// the asset end, so this path rewinds exactly like [`Self::poll`].
    pub fn on_ended<S: PlaybackSurface>(&mut self, surface: &mut S, range: &mut TrimRange) {
        self.state = GovernorState::Idle;
        surface.seek(range.start());
        range.set_current(range.start(), SeekBounds::Range);
        debug!("Media ended, rewound to in point");
    }

    /// Apply a playback rate. Orthogonal to the play state.
    pub fn set_rate<S: PlaybackSurface>(&mut self, surface: &mut S, rate: f64) -> Result<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(SurfaceError::InvalidRate(rate));
        }
        self.rate = rate;
        surface.set_rate(rate);
        Ok(())
    }

    /// Forget any playback without touching the surface (asset change,
    /// surface error).
    pub fn reset(&mut self) {
        self.state = GovernorState::Idle;
        self.last_poll = None;
    }
}
