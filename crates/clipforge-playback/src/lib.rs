//! ClipForge Playback - Trim/playback synchronization
//!
//! This crate keeps a continuous playback position and a discrete trim
//! range in step under user drag input and asynchronous surface events:
//! - Playback surface contract and its notifications
//! - Drag coordination for the in/out handles and playhead
//! - Play/pause governor with out-point enforcement
//! - Throttled buffer and network monitoring
//! - The `TrimEditor` facade tying them together

pub mod drag;
pub mod editor;
pub mod error;
pub mod governor;
pub mod monitor;
pub mod sim;
pub mod surface;

pub use drag::{DragCoordinator, DragSession, DragTarget, DragUpdate, TrackGeometry};
pub use editor::TrimEditor;
pub use error::{Result, SurfaceError};
pub use governor::{GovernorState, PlayResolution, PlaybackGovernor};
pub use monitor::{BufferNetworkMonitor, BufferState, NetworkQuality};
pub use sim::{SimulatedSurface, SurfaceCall};
pub use surface::{PlayTicket, PlaybackSurface, SurfaceEvent};
