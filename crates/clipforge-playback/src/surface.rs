//! Capability contract for the external playback surface.
//!
//! The surface is whatever actually renders media (a browser media
//! element, a decoder-backed player). Commands are fire-and-forget;
//! anything the surface learns later comes back as a [`SurfaceEvent`].

use crate::error::SurfaceError;
use std::fmt;

/// Identifies one `play` request so its late resolution can be matched
/// against the request that is still wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayTicket(pub(crate) u64);

impl PlayTicket {
    /// Raw ticket number.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlayTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Operations the engine needs from a playback surface.
pub trait PlaybackSurface {
    /// Start loading a new source. Pending play requests for the old
    /// source may still resolve afterwards.
    fn load(&mut self, locator: &str);

    /// Seek to `seconds`.
    fn seek(&mut self, seconds: f64);

    /// Request playback. The surface must answer with
    /// [`SurfaceEvent::PlayResolved`] carrying the same ticket, or never.
    fn play(&mut self, ticket: PlayTicket);

    fn pause(&mut self);

    fn set_rate(&mut self, rate: f64);

    /// Position the surface reports right now.
    fn current_position(&self) -> f64;

    /// Media duration, once metadata is known.
    fn duration(&self) -> Option<f64>;

    /// End of the buffered range, in seconds.
    fn buffered_extent(&self) -> f64;

    /// Decoded frame dimensions, when the source has video.
    fn frame_size(&self) -> Option<(u32, u32)>;
}

/// Notifications delivered by the playback surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Native position update (coarse).
    PositionChanged(f64),
    /// Metadata resolved; duration is known.
    MetadataReady { duration: f64 },
    /// Enough data to start playing.
    CanPlay,
    /// Playback is waiting for data.
    BufferingStarted,
    /// Playback resumed after waiting.
    BufferingEnded,
    /// The network stopped delivering data.
    Stalled,
    /// The buffered range grew.
    Progress,
    /// Playback reached the end of the media.
    Ended,
    /// The source failed to load or decode.
    Error(SurfaceError),
    /// Answer to an earlier [`PlaybackSurface::play`] call.
    PlayResolved {
        ticket: PlayTicket,
        outcome: Result<(), SurfaceError>,
    },
}
