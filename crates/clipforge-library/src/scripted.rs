//! Scriptable in-memory thumbnail service for tests and demos.

use crate::acquire::{ResourceAcquirer, Thumbnail, ThumbnailOptions};
use crate::error::{LoaderError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Thumbnail service that renders instantly (or after a fixed latency)
/// and fails on demand.
#[derive(Debug, Default)]
pub struct ScriptedAcquirer {
    latency: Duration,
    failures: Mutex<HashMap<String, u32>>,
    invalidated: Mutex<Vec<String>>,
    last_options: Mutex<Option<ThumbnailOptions>>,
    acquire_calls: AtomicUsize,
}

impl ScriptedAcquirer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every answer by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail the next `count` acquisitions of `locator`.
    pub fn fail_next(&self, locator: &str, count: u32) {
        self.failures.lock().insert(locator.to_string(), count);
    }

    pub fn acquire_calls(&self) -> usize {
        self.acquire_calls.load(Ordering::SeqCst)
    }

    /// Locators invalidated so far, in order.
    pub fn invalidations(&self) -> Vec<String> {
        self.invalidated.lock().clone()
    }

    /// Options of the most recent acquisition.
    pub fn last_options(&self) -> Option<ThumbnailOptions> {
        self.last_options.lock().clone()
    }

    fn take_failure(&self, locator: &str) -> bool {
        let mut failures = self.failures.lock();
        match failures.get_mut(locator) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

impl ResourceAcquirer for ScriptedAcquirer {
    async fn acquire(&self, locator: &str, options: &ThumbnailOptions) -> Result<Thumbnail> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock() = Some(options.clone());
        if self.take_failure(locator) {
            return Err(LoaderError::Acquisition {
                locator: locator.to_string(),
                reason: "service unavailable".into(),
            });
        }
        Ok(Thumbnail {
            source: locator.to_string(),
            uri: format!("thumbnails/{locator}.jpg"),
            width: options.width,
            height: options.height,
        })
    }

    async fn invalidate(&self, locator: &str) -> Result<()> {
        self.invalidated.lock().push(locator.to_string());
        Ok(())
    }
}
