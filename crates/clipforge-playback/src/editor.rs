//! Trim editor: one active asset, its range, and everything that moves it.
//!
//! Routes pointer input to the drag coordinator, surface notifications
//! to the governor and monitor, and resets all of them when the active
//! asset changes.

use crate::drag::{DragCoordinator, DragTarget, DragUpdate, TrackGeometry};
use crate::error::SurfaceError;
use crate::governor::{GovernorState, PlayResolution, PlaybackGovernor};
use crate::monitor::{BufferNetworkMonitor, BufferState, NetworkQuality};
use crate::surface::{PlayTicket, PlaybackSurface, SurfaceEvent};
use clipforge_core::{create_clip, ClipDescriptor, EngineConfig, MediaAsset, SeekBounds, TrimRange};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Facade over a playback surface and the trim state of its asset.
pub struct TrimEditor<S: PlaybackSurface> {
    surface: S,
    asset: Option<MediaAsset>,
    range: TrimRange,
    drag: DragCoordinator,
    governor: PlaybackGovernor,
    monitor: BufferNetworkMonitor,
    error: Option<SurfaceError>,
}

impl<S: PlaybackSurface> TrimEditor<S> {
    pub fn new(surface: S, config: &EngineConfig) -> Self {
        Self {
            surface,
            asset: None,
            range: TrimRange::EMPTY,
            drag: DragCoordinator::new(TrackGeometry::new(0.0, config.playback.track_width_px)),
            governor: PlaybackGovernor::new(config.playback.range_poll_interval()),
            monitor: BufferNetworkMonitor::new(config.monitor.clone()),
            error: None,
        }
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn asset(&self) -> Option<&MediaAsset> {
        self.asset.as_ref()
    }

    /// Copy of the current trim state.
    pub fn snapshot(&self) -> TrimRange {
        self.range
    }

    pub fn governor_state(&self) -> GovernorState {
        self.governor.state()
    }

    pub fn is_playing(&self) -> bool {
        self.governor.is_playing()
    }

    pub fn drag_target(&self) -> Option<DragTarget> {
        self.drag.session().map(|s| s.target())
    }

    pub fn buffer_state(&self) -> BufferState {
        self.monitor.state()
    }

    pub fn network_quality(&self) -> NetworkQuality {
        self.monitor.quality()
    }

    pub fn set_track_geometry(&mut self, geometry: TrackGeometry) {
        self.drag.set_geometry(geometry);
    }

    // ── Asset lifecycle ────────────────────────────────────────

    /// Make `asset` the active asset. Cancels the drag, stops playback,
    /// clears the range and monitors, then starts loading the surface.
    pub fn load_asset(&mut self, asset: MediaAsset, now: Instant) {
        self.drag.cancel();
        self.governor.pause(&mut self.surface);
        self.governor.reset();
        self.range.clear();
        self.monitor.restart(now);
        self.error = None;

        info!(asset = %asset.id, locator = %asset.locator, "Loading asset");
        self.surface.load(&asset.locator);
        self.asset = Some(asset);
    }

    /// Current playback-surface error notice, if any.
    pub fn playback_error(&self) -> Option<&SurfaceError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Reload the active asset from scratch. Returns `false` when no
    /// asset is active.
    pub fn retry_load(&mut self, now: Instant) -> bool {
        match self.asset.clone() {
            Some(asset) => {
                self.load_asset(asset, now);
                true
            }
            None => false,
        }
    }

    // ── Surface events ─────────────────────────────────────────

    /// Apply a notification from the playback surface.
    pub fn handle_event(&mut self, event: SurfaceEvent, now: Instant) {
        match event {
            SurfaceEvent::PositionChanged(t) => {
                // The open drag owns the range.
                if self.drag.is_active() {
                    return;
                }
                let bounds = if self.governor.is_playing() {
                    SeekBounds::Range
                } else {
                    SeekBounds::Free
                };
                self.range.set_current(t, bounds);
            }
            SurfaceEvent::MetadataReady { duration } => {
                self.range.reset(duration);
                info!(duration, "Metadata ready");
            }
            SurfaceEvent::CanPlay | SurfaceEvent::BufferingEnded => self.monitor.on_resumed(),
            SurfaceEvent::BufferingStarted | SurfaceEvent::Stalled => self.monitor.on_stalled(),
            SurfaceEvent::Progress => {
                let extent = self.surface.buffered_extent();
                self.monitor.on_progress(now, extent, self.range.duration());
                self.monitor
                    .sample_throughput(now, extent, self.surface.frame_size());
            }
            SurfaceEvent::Ended => self.governor.on_ended(&mut self.surface, &mut self.range),
            SurfaceEvent::Error(e) => {
                warn!(class = ?e.class(), "Playback surface error: {}", e);
                self.governor.reset();
                self.error = Some(e);
            }
            SurfaceEvent::PlayResolved { ticket, outcome } => {
                if let PlayResolution::Rejected(e) =
                    self.governor.resolve_play(&mut self.surface, ticket, outcome)
                {
                    self.error = Some(e);
                }
            }
        }
    }

    /// Drive the out-point poll. Returns `true` when playback looped.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.governor.poll(now, &mut self.surface, &mut self.range)
    }

    // ── Pointer input ──────────────────────────────────────────

    /// Pointer pressed on `target` at `x`. Pressing the playhead (or the
    /// bare track) seeks there immediately; handles only grab.
    pub fn pointer_down(&mut self, target: DragTarget, x: f32) -> Option<DragUpdate> {
        if !self.range.is_loaded() {
            debug!(?target, "Ignoring pointer down before metadata");
            return None;
        }
        self.drag.begin(target, &mut self.governor, &mut self.surface);
        match target {
            DragTarget::Playhead => self.pointer_move(x),
            DragTarget::RangeStart | DragTarget::RangeEnd => None,
        }
    }

    pub fn pointer_move(&mut self, x: f32) -> Option<DragUpdate> {
        self.drag.update(x, &mut self.range, &mut self.surface)
    }

    pub fn pointer_up(&mut self) -> Option<DragTarget> {
        self.drag.end()
    }

    // ── Transport ──────────────────────────────────────────────

    /// Request playback of the range. Refused while a drag is open.
    pub fn play(&mut self) -> Option<PlayTicket> {
        if self.drag.is_active() {
            return None;
        }
        self.governor.request_play(&mut self.surface, &mut self.range)
    }

    pub fn pause(&mut self) -> bool {
        self.governor.pause(&mut self.surface)
    }

    pub fn toggle(&mut self) {
        if !self.drag.is_active() {
            self.governor.toggle(&mut self.surface, &mut self.range);
        }
    }

    pub fn set_rate(&mut self, rate: f64) -> crate::error::Result<()> {
        self.governor.set_rate(&mut self.surface, rate)
    }

    // ── Text edits and clip output ─────────────────────────────

    pub fn set_start_text(&mut self, text: &str) -> clipforge_core::Result<bool> {
        self.range.set_start_text(text)
    }

    pub fn set_end_text(&mut self, text: &str) -> clipforge_core::Result<bool> {
        self.range.set_end_text(text)
    }

    /// Build a clip from the active asset and range.
    pub fn create_clip(&self) -> clipforge_core::Result<ClipDescriptor> {
        let clip = create_clip(self.asset.as_ref(), &self.range)?;
        info!(clip = %clip.id(), name = %clip.name(), "Clip created");
        Ok(clip)
    }
}
