//! Visibility-triggered thumbnail loader.
//!
//! Four pieces of state live behind one lock and change together: the
//! cache (locator → thumbnail), the requested markers (asset → in-flight
//! acquisition), the visibility tracker (asset → card) and the locator
//! each asset was last acquired from. A card that scrolls into view starts
//! an acquisition only when its asset is neither cached nor already
//! requested.

use crate::acquire::{ResourceAcquirer, Thumbnail, ThumbnailOptions};
use crate::cache::ThumbnailCache;
use crate::error::{LoaderError, Result};
use crate::visibility::{Bounds, Card, VisibilityTracker};
use clipforge_core::{AssetId, ThumbnailConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Thumbnail state for display on a card.
#[derive(Debug, Clone, PartialEq)]
pub enum ThumbnailState {
    Absent,
    Loading,
    Ready(Thumbnail),
}

impl ThumbnailState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

struct Request {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Request {
    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

struct LoaderState {
    cache: ThumbnailCache,
    requested: HashMap<AssetId, Request>,
    tracker: VisibilityTracker,
    /// Survives `unobserve`, so removal can still find the cache entry.
    locators: HashMap<AssetId, String>,
    next_generation: u64,
}

impl LoaderState {
    /// Drop cached and in-flight work for `card.asset` when it was acquired
    /// from a different locator.
    fn retarget(&mut self, card: &Card) {
        match self.locators.get(&card.asset) {
            Some(previous) if *previous != card.locator => {}
            _ => return,
        }
        if let Some(previous) = self.locators.remove(&card.asset) {
            self.cache.evict(&previous);
        }
        if let Some(mut request) = self.requested.remove(&card.asset) {
            request.cancel();
        }
        debug!(asset = %card.asset, "Card locator changed, dropped old thumbnail");
    }

    fn is_current(&self, asset: &AssetId, generation: u64) -> bool {
        self.requested
            .get(asset)
            .is_some_and(|r| r.generation == generation)
    }
}

/// Deduplicating, cancelable thumbnail loader.
pub struct ThumbnailLoader<R> {
    acquirer: Arc<R>,
    config: ThumbnailConfig,
    runtime: Handle,
    state: Arc<Mutex<LoaderState>>,
}

impl<R: ResourceAcquirer> ThumbnailLoader<R> {
    /// Acquisitions are spawned on `runtime`.
    pub fn new(acquirer: Arc<R>, config: ThumbnailConfig, runtime: Handle) -> Self {
        let tracker = VisibilityTracker::new(config.lookahead_px);
        Self {
            acquirer,
            config,
            runtime,
            state: Arc::new(Mutex::new(LoaderState {
                cache: ThumbnailCache::new(),
                requested: HashMap::new(),
                tracker,
                locators: HashMap::new(),
                next_generation: 0,
            })),
        }
    }

    /// Register a rendered card. Starts acquisition if the card is already
    /// in view. Returns whether an acquisition started.
    pub fn observe(&self, card: Card) -> bool {
        let mut state = self.state.lock();
        state.retarget(&card);
        if !state.tracker.observe(card.clone()) {
            return false;
        }
        self.request(&mut state, card, false)
    }

    /// Stop watching a card. Cached thumbnails and in-flight requests stay.
    pub fn unobserve(&self, asset: &AssetId) -> bool {
        self.state.lock().tracker.unobserve(asset)
    }

    /// Apply a new viewport. Returns how many acquisitions started.
    pub fn update_viewport(&self, viewport: Bounds) -> usize {
        let mut state = self.state.lock();
        let entered = state.tracker.update_viewport(viewport);
        entered
            .into_iter()
            .filter(|card| self.request(&mut state, card.clone(), false))
            .count()
    }

    /// Evict the cached thumbnail for `asset` and render it again, even
    /// if a request is in flight.
    pub fn force_regenerate(&self, asset: &AssetId) -> Result<()> {
        let mut state = self.state.lock();
        let card = state
            .tracker
            .card(asset)
            .cloned()
            .ok_or_else(|| LoaderError::UnknownAsset(asset.clone()))?;

        state.cache.evict(&card.locator);
        if let Some(mut request) = state.requested.remove(asset) {
            request.cancel();
        }
        info!(asset = %asset, "Regenerating thumbnail");
        self.request(&mut state, card, true);
        Ok(())
    }

    /// Forget `asset` entirely: cache entry, requested marker and card
    /// registration go together, and any in-flight acquisition is cancelled.
    pub fn remove_asset(&self, asset: &AssetId) {
        let mut state = self.state.lock();
        if let Some(mut request) = state.requested.remove(asset) {
            request.cancel();
        }
        if let Some(locator) = state.locators.remove(asset) {
            state.cache.evict(&locator);
        }
        if let Some(card) = state.tracker.card(asset).cloned() {
            state.cache.evict(&card.locator);
        }
        state.tracker.unobserve(asset);
        debug!(asset = %asset, "Removed asset from library");
    }

    /// Thumbnail state of the card registered for `asset`.
    pub fn state(&self, asset: &AssetId) -> ThumbnailState {
        let state = self.state.lock();
        if state.requested.contains_key(asset) {
            return ThumbnailState::Loading;
        }
        state
            .tracker
            .card(asset)
            .and_then(|card| state.cache.get(&card.locator))
            .map(|thumb| ThumbnailState::Ready(thumb.clone()))
            .unwrap_or(ThumbnailState::Absent)
    }

    pub fn is_requested(&self, asset: &AssetId) -> bool {
        self.state.lock().requested.contains_key(asset)
    }

    pub fn is_observed(&self, asset: &AssetId) -> bool {
        self.state.lock().tracker.is_observed(asset)
    }

    pub fn is_cached(&self, locator: &str) -> bool {
        self.state.lock().cache.contains(locator)
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().requested.len()
    }

    /// Spawn an acquisition unless the asset is cached or requested.
    fn request(&self, state: &mut LoaderState, card: Card, force: bool) -> bool {
        if state.requested.contains_key(&card.asset) {
            return false;
        }
        if !force && state.cache.contains(&card.locator) {
            return false;
        }

        state.next_generation += 1;
        let generation = state.next_generation;
        let job = Acquisition {
            acquirer: Arc::clone(&self.acquirer),
            state: Arc::clone(&self.state),
            options: ThumbnailOptions::from_config(&self.config).forced(force),
            max_retries: self.config.max_retries,
            backoff: self.config.retry_backoff(),
            asset: card.asset.clone(),
            locator: card.locator.clone(),
            generation,
        };
        state
            .locators
            .insert(card.asset.clone(), card.locator.clone());
        debug!(asset = %card.asset, force, "Requesting thumbnail");
        let handle = self.runtime.spawn(job.run());
        state.requested.insert(
            card.asset,
            Request {
                generation,
                handle: Some(handle),
            },
        );
        true
    }
}

impl<R> Drop for ThumbnailLoader<R> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        for request in state.requested.values_mut() {
            request.cancel();
        }
        state.requested.clear();
    }
}

// ── Acquisition task ───────────────────────────────────────────

struct Acquisition<R> {
    acquirer: Arc<R>,
    state: Arc<Mutex<LoaderState>>,
    options: ThumbnailOptions,
    max_retries: u32,
    backoff: std::time::Duration,
    asset: AssetId,
    locator: String,
    generation: u64,
}

impl<R: ResourceAcquirer> Acquisition<R> {
    async fn run(self) {
        if self.options.force_regenerate {
            if let Err(e) = self.acquirer.invalidate(&self.locator).await {
                warn!(asset = %self.asset, "Thumbnail invalidation failed: {}", e);
            }
        }

        let mut attempt = 0;
        loop {
            match self.acquirer.acquire(&self.locator, &self.options).await {
                Ok(thumbnail) => {
                    let mut state = self.state.lock();
                    if state.is_current(&self.asset, self.generation) {
                        state.requested.remove(&self.asset);
                        state.cache.insert(self.locator.clone(), thumbnail);
                        debug!(asset = %self.asset, "Thumbnail ready");
                    }
                    return;
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(asset = %self.asset, attempt, "Thumbnail acquisition failed, retrying: {}", e);
                    tokio::time::sleep(self.backoff * attempt).await;
                    if !self.state.lock().is_current(&self.asset, self.generation) {
                        return;
                    }
                }
                Err(e) => {
                    let mut state = self.state.lock();
                    if state.is_current(&self.asset, self.generation) {
                        // Cleared so the next visibility transition retries.
                        state.requested.remove(&self.asset);
                    }
                    warn!(asset = %self.asset, "Giving up on thumbnail: {}", e);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedAcquirer;
    use std::time::Duration;
    use tokio::time::sleep;

    fn viewport() -> Bounds {
        Bounds::new(0.0, 0.0, 800.0, 600.0)
    }

    fn card(id: &str, y: f32) -> Card {
        Card::new(id, format!("videos/{id}.mp4"), Bounds::new(0.0, y, 200.0, 150.0))
    }

    fn loader(acq: &Arc<ScriptedAcquirer>) -> ThumbnailLoader<ScriptedAcquirer> {
        ThumbnailLoader::new(Arc::clone(acq), ThumbnailConfig::default(), Handle::current())
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_card_loads_once() {
        let acq = Arc::new(ScriptedAcquirer::new());
        let loader = loader(&acq);
        let a = AssetId::from("a");

        loader.observe(card("a", 0.0));
        loader.observe(card("b", 5000.0));
        assert_eq!(loader.update_viewport(viewport()), 1);
        assert_eq!(loader.state(&a), ThumbnailState::Loading);

        // Scrolling away and back while loading does not duplicate.
        loader.update_viewport(Bounds::new(0.0, 3000.0, 800.0, 600.0));
        assert_eq!(loader.update_viewport(viewport()), 0);

        sleep(Duration::from_millis(10)).await;
        assert!(loader.state(&a).is_ready());
        assert_eq!(acq.acquire_calls(), 1);

        // Cached: another transition does nothing.
        loader.update_viewport(Bounds::new(0.0, 3000.0, 800.0, 600.0));
        assert_eq!(loader.update_viewport(viewport()), 0);
        assert_eq!(acq.acquire_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_success() {
        let acq = Arc::new(ScriptedAcquirer::new());
        acq.fail_next("videos/a.mp4", 2);
        let loader = loader(&acq);
        let a = AssetId::from("a");

        loader.update_viewport(viewport());
        loader.observe(card("a", 0.0));
        sleep(Duration::from_millis(10)).await;
        assert_eq!(loader.state(&a), ThumbnailState::Loading);

        // Back-off of 1 s then 2 s.
        sleep(Duration::from_secs(4)).await;
        assert!(loader.state(&a).is_ready());
        assert_eq!(acq.acquire_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_clear_marker() {
        let acq = Arc::new(ScriptedAcquirer::new());
        acq.fail_next("videos/a.mp4", 3);
        let loader = loader(&acq);
        let a = AssetId::from("a");

        loader.update_viewport(viewport());
        loader.observe(card("a", 0.0));
        sleep(Duration::from_secs(5)).await;
        assert_eq!(loader.state(&a), ThumbnailState::Absent);
        assert!(!loader.is_requested(&a));

        // Next visibility transition tries again.
        loader.update_viewport(Bounds::new(0.0, 3000.0, 800.0, 600.0));
        assert_eq!(loader.update_viewport(viewport()), 1);
        sleep(Duration::from_millis(10)).await;
        assert!(loader.state(&a).is_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_regenerate() {
        let acq = Arc::new(ScriptedAcquirer::new());
        let loader = loader(&acq);
        let a = AssetId::from("a");

        loader.update_viewport(viewport());
        loader.observe(card("a", 0.0));
        sleep(Duration::from_millis(10)).await;
        assert!(loader.state(&a).is_ready());

        loader.force_regenerate(&a).unwrap();
        assert_eq!(loader.state(&a), ThumbnailState::Loading);
        assert!(!loader.is_cached("videos/a.mp4"));
        sleep(Duration::from_millis(10)).await;

        assert!(loader.state(&a).is_ready());
        assert_eq!(acq.acquire_calls(), 2);
        assert_eq!(acq.invalidations(), vec!["videos/a.mp4".to_string()]);
        assert!(acq.last_options().unwrap().force_regenerate);

        assert!(matches!(
            loader.force_regenerate(&AssetId::from("zzz")),
            Err(LoaderError::UnknownAsset(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_while_loading_purges_everything() {
        let acq = Arc::new(ScriptedAcquirer::new().with_latency(Duration::from_secs(2)));
        let loader = loader(&acq);
        let a = AssetId::from("a");

        loader.update_viewport(viewport());
        loader.observe(card("a", 0.0));
        assert_eq!(loader.state(&a), ThumbnailState::Loading);

        loader.remove_asset(&a);
        assert!(!loader.is_requested(&a));
        assert!(!loader.is_observed(&a));
        assert!(!loader.is_cached("videos/a.mp4"));

        // The cancelled acquisition never lands.
        sleep(Duration::from_secs(5)).await;
        assert!(!loader.is_cached("videos/a.mp4"));
        assert_eq!(loader.state(&a), ThumbnailState::Absent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_after_unobserve_purges_cache() {
        let acq = Arc::new(ScriptedAcquirer::new());
        let loader = loader(&acq);
        let a = AssetId::from("a");

        loader.update_viewport(viewport());
        loader.observe(card("a", 0.0));
        sleep(Duration::from_millis(10)).await;
        assert!(loader.state(&a).is_ready());

        loader.unobserve(&a);
        loader.remove_asset(&a);
        assert!(!loader.is_cached("videos/a.mp4"));

        // A new asset reusing the id gets a fresh acquisition.
        assert!(loader.observe(card("a", 0.0)));
        assert_eq!(loader.state(&a), ThumbnailState::Loading);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(acq.acquire_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unobserved_load_lands_then_remove_purges() {
        let acq = Arc::new(ScriptedAcquirer::new().with_latency(Duration::from_secs(2)));
        let loader = loader(&acq);
        let a = AssetId::from("a");

        loader.update_viewport(viewport());
        loader.observe(card("a", 0.0));
        loader.unobserve(&a);
        sleep(Duration::from_secs(3)).await;
        assert!(loader.is_cached("videos/a.mp4"));

        loader.remove_asset(&a);
        assert!(!loader.is_cached("videos/a.mp4"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_locator_replaces_old_thumbnail() {
        let acq = Arc::new(ScriptedAcquirer::new());
        let loader = loader(&acq);
        let a = AssetId::from("a");

        loader.update_viewport(viewport());
        loader.observe(card("a", 0.0));
        sleep(Duration::from_millis(10)).await;
        assert!(loader.is_cached("videos/a.mp4"));

        let replaced = Card::new("a", "videos/a-v2.mp4", Bounds::new(0.0, 0.0, 200.0, 150.0));
        assert!(loader.observe(replaced));
        assert!(!loader.is_cached("videos/a.mp4"));
        sleep(Duration::from_millis(10)).await;
        match loader.state(&a) {
            ThumbnailState::Ready(thumb) => assert_eq!(thumb.source, "videos/a-v2.mp4"),
            other => panic!("expected a ready thumbnail, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_regenerate_mid_flight_discards_superseded_result() {
        let acq = Arc::new(ScriptedAcquirer::new().with_latency(Duration::from_secs(2)));
        let loader = loader(&acq);
        let a = AssetId::from("a");

        loader.update_viewport(viewport());
        loader.observe(card("a", 0.0));
        sleep(Duration::from_secs(1)).await;
        loader.force_regenerate(&a).unwrap();
        assert_eq!(loader.in_flight(), 1);

        // The first acquisition would have finished here.
        sleep(Duration::from_millis(1500)).await;
        assert_eq!(loader.state(&a), ThumbnailState::Loading);
        assert_eq!(acq.acquire_calls(), 0);

        sleep(Duration::from_secs(1)).await;
        assert!(loader.state(&a).is_ready());
        assert!(!loader.is_requested(&a));
        assert_eq!(loader.in_flight(), 0);
        assert_eq!(acq.acquire_calls(), 1);
        assert!(acq.last_options().unwrap().force_regenerate);
        assert_eq!(acq.invalidations(), vec!["videos/a.mp4".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_options_follow_config() {
        let acq = Arc::new(ScriptedAcquirer::new());
        let loader = loader(&acq);
        loader.update_viewport(viewport());
        loader.observe(card("a", 0.0));
        sleep(Duration::from_millis(10)).await;

        let options = acq.last_options().unwrap();
        assert_eq!((options.width, options.height, options.quality), (320, 180, 85));
        assert_eq!(options.time_offset_secs, 1.0);
        assert!(!options.force_regenerate);
    }
}
