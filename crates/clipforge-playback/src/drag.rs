//! Drag interaction for the trim timeline.
//!
//! Three handles share one coordinate mapping: pointer x within the
//! track → fraction of the asset → time. At most one drag session is
//! open at a time and it is the only writer of the trim range while open.

use crate::governor::PlaybackGovernor;
use crate::surface::PlaybackSurface;
use clipforge_core::{SeekBounds, TrimRange};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Horizontal placement of the timeline track, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackGeometry {
    pub left: f32,
    pub width: f32,
}

impl TrackGeometry {
    pub fn new(left: f32, width: f32) -> Self {
        Self { left, width }
    }

    /// Fraction of the track under pointer `x`, clamped to `[0, 1]`.
    pub fn fraction_at(&self, x: f32) -> f64 {
        if self.width <= 0.0 || !x.is_finite() {
            return 0.0;
        }
        (((x - self.left) / self.width) as f64).clamp(0.0, 1.0)
    }

    /// Asset time under pointer `x`.
    pub fn time_at(&self, x: f32, duration: f64) -> f64 {
        self.fraction_at(x) * duration
    }

    /// Pointer x where time `t` is drawn.
    pub fn x_for(&self, t: f64, duration: f64) -> f32 {
        if duration <= 0.0 {
            return self.left;
        }
        self.left + ((t / duration).clamp(0.0, 1.0) as f32) * self.width
    }
}

impl Default for TrackGeometry {
    fn default() -> Self {
        Self::new(0.0, 800.0)
    }
}

/// Which timeline control a drag is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragTarget {
    /// In-point handle.
    RangeStart,
    /// Out-point handle.
    RangeEnd,
    /// Playhead marker.
    Playhead,
}

/// An open drag. Only [`DragCoordinator::begin`] creates one, which
/// guarantees playback was paused before the session existed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    target: DragTarget,
}

impl DragSession {
    pub fn target(&self) -> DragTarget {
        self.target
    }
}

/// Result of applying one pointer-move to the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragUpdate {
    pub target: DragTarget,
    /// Value stored in the range after clamping.
    pub time: f64,
    /// Position the surface was seeked to, if any.
    pub seeked_to: Option<f64>,
}

/// Maps pointer input onto the trim range.
#[derive(Debug, Default)]
pub struct DragCoordinator {
    geometry: TrackGeometry,
    session: Option<DragSession>,
}

impl DragCoordinator {
    pub fn new(geometry: TrackGeometry) -> Self {
        Self {
            geometry,
            session: None,
        }
    }

    pub fn geometry(&self) -> TrackGeometry {
        self.geometry
    }

    /// Update the track layout (window resize).
    pub fn set_geometry(&mut self, geometry: TrackGeometry) {
        self.geometry = geometry;
    }

    pub fn session(&self) -> Option<DragSession> {
        self.session
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Open a drag on `target`. Playback is paused before the session is
    /// created; any session already open is replaced.
    pub fn begin<S: PlaybackSurface>(
        &mut self,
        target: DragTarget,
        governor: &mut PlaybackGovernor,
        surface: &mut S,
    ) -> DragSession {
        governor.pause(surface);
        let session = DragSession { target };
        self.session = Some(session);
        debug!(?target, "Drag started");
        session
    }

    /// Apply a pointer-move. A move with no open session is ignored.
    pub fn update<S: PlaybackSurface>(
        &mut self,
        x: f32,
        range: &mut TrimRange,
        surface: &mut S,
    ) -> Option<DragUpdate> {
        let session = self.session?;
        let t = self.geometry.time_at(x, range.duration());

        let update = match session.target {
            DragTarget::RangeStart => {
                let changed = range.set_start(t);
                // Preview the new in point while dragging.
                let seeked_to = changed.then(|| {
                    range.set_current(range.start(), SeekBounds::Range);
                    surface.seek(range.start());
                    range.start()
                });
                DragUpdate {
                    target: session.target,
                    time: range.start(),
                    seeked_to,
                }
            }
            DragTarget::RangeEnd => {
                // No seek: out-point preview would fight the range clamp.
                range.set_end(t);
                DragUpdate {
                    target: session.target,
                    time: range.end(),
                    seeked_to: None,
                }
            }
            DragTarget::Playhead => {
                let changed = range.set_current(t, SeekBounds::Range);
                let seeked_to = changed.then(|| {
                    surface.seek(range.current());
                    range.current()
                });
                DragUpdate {
                    target: session.target,
                    time: range.current(),
                    seeked_to,
                }
            }
        };
        Some(update)
    }

    /// Pointer released. Values written during the drag are already final.
    pub fn end(&mut self) -> Option<DragTarget> {
        let target = self.session.take().map(|s| s.target);
        if let Some(target) = target {
            debug!(?target, "Drag ended");
        }
        target
    }

    /// Drop the session without a pointer-up (asset change).
    pub fn cancel(&mut self) {
        if self.session.take().is_some() {
            debug!("Drag cancelled");
        }
    }
}
