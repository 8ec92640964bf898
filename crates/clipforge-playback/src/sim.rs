//! Deterministic in-memory playback surface.
//!
//! Records every command it receives and only moves time when told to.
//! Play requests stay pending until [`SimulatedSurface::accept_play`] or
//! [`SimulatedSurface::reject_play`] produces the resolution event.

use crate::error::SurfaceError;
use crate::surface::{PlayTicket, PlaybackSurface, SurfaceEvent};
use std::collections::VecDeque;

/// A command received by the simulated surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Load(String),
    Seek(f64),
    Play(PlayTicket),
    Pause,
    SetRate(f64),
}

/// Scriptable playback surface for tests and headless replay.
#[derive(Debug, Clone)]
pub struct SimulatedSurface {
    media_duration: f64,
    position: f64,
    buffered: f64,
    frame_size: Option<(u32, u32)>,
    rate: f64,
    playing: bool,
    pending_plays: VecDeque<PlayTicket>,
    calls: Vec<SurfaceCall>,
}

impl SimulatedSurface {
    /// A surface whose media lasts `media_duration` seconds.
    pub fn new(media_duration: f64) -> Self {
        Self {
            media_duration,
            position: 0.0,
            buffered: 0.0,
            frame_size: Some((1920, 1080)),
            rate: 1.0,
            playing: false,
            pending_plays: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    /// Audio-only or unknown-size source.
    pub fn without_video(mut self) -> Self {
        self.frame_size = None;
        self
    }

    /// Drain recorded commands.
    pub fn take_calls(&mut self) -> Vec<SurfaceCall> {
        std::mem::take(&mut self.calls)
    }

    /// Recorded commands so far.
    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Oldest play request still waiting for an answer.
    pub fn pending_play(&self) -> Option<PlayTicket> {
        self.pending_plays.front().copied()
    }

    /// Answer the oldest pending play request with success.
    pub fn accept_play(&mut self) -> Option<SurfaceEvent> {
        let ticket = self.pending_plays.pop_front()?;
        self.playing = true;
        Some(SurfaceEvent::PlayResolved {
            ticket,
            outcome: Ok(()),
        })
    }

    /// Answer the oldest pending play request with a failure.
    pub fn reject_play(&mut self, reason: &str) -> Option<SurfaceEvent> {
        let ticket = self.pending_plays.pop_front()?;
        Some(SurfaceEvent::PlayResolved {
            ticket,
            outcome: Err(SurfaceError::PlayRejected(reason.to_string())),
        })
    }

    /// Advance media time by `seconds` of wall clock. Returns the native
    /// events the surface would fire.
    pub fn advance(&mut self, seconds: f64) -> Vec<SurfaceEvent> {
        if !self.playing {
            return Vec::new();
        }
        self.position = (self.position + seconds * self.rate).min(self.media_duration);
        if self.position >= self.media_duration {
            self.playing = false;
            return vec![
                SurfaceEvent::PositionChanged(self.position),
                SurfaceEvent::Ended,
            ];
        }
        vec![SurfaceEvent::PositionChanged(self.position)]
    }

    /// Grow the buffered range to `extent` seconds.
    pub fn buffer_to(&mut self, extent: f64) -> SurfaceEvent {
        self.buffered = extent.clamp(0.0, self.media_duration);
        SurfaceEvent::Progress
    }

    /// Metadata event for the current media.
    pub fn metadata_event(&self) -> SurfaceEvent {
        SurfaceEvent::MetadataReady {
            duration: self.media_duration,
        }
    }
}

impl PlaybackSurface for SimulatedSurface {
    fn load(&mut self, locator: &str) {
        self.calls.push(SurfaceCall::Load(locator.to_string()));
        self.position = 0.0;
        self.buffered = 0.0;
        self.playing = false;
    }

    fn seek(&mut self, seconds: f64) {
        self.calls.push(SurfaceCall::Seek(seconds));
        self.position = seconds.clamp(0.0, self.media_duration);
    }

    fn play(&mut self, ticket: PlayTicket) {
        self.calls.push(SurfaceCall::Play(ticket));
        self.pending_plays.push_back(ticket);
    }

    fn pause(&mut self) {
        self.calls.push(SurfaceCall::Pause);
        self.playing = false;
    }

    fn set_rate(&mut self, rate: f64) {
        self.calls.push(SurfaceCall::SetRate(rate));
        self.rate = rate;
    }

    fn current_position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> Option<f64> {
        Some(self.media_duration)
    }

    fn buffered_extent(&self) -> f64 {
        self.buffered
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        self.frame_size
    }
}
