//! Integration test crate for ClipForge.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every clipforge crate to verify they work together.

#[cfg(test)]
mod trim;

#[cfg(test)]
mod playback;

#[cfg(test)]
mod jobs;

#[cfg(test)]
mod library;
