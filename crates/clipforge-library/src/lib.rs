//! ClipForge Library - Lazy thumbnails for the asset library
//!
//! Cards report their layout, the viewport reports where the user is
//! looking, and thumbnails are acquired only for cards that scroll into
//! view, once per asset, with forced regeneration and clean removal.

pub mod acquire;
pub mod cache;
pub mod error;
pub mod loader;
pub mod scripted;
pub mod visibility;

pub use acquire::{ResourceAcquirer, Thumbnail, ThumbnailOptions};
pub use cache::ThumbnailCache;
pub use error::{LoaderError, Result};
pub use loader::{ThumbnailLoader, ThumbnailState};
pub use scripted::ScriptedAcquirer;
pub use visibility::{Bounds, Card, VisibilityTracker};
