//! Integration tests for lazy thumbnail loading.

use clipforge_core::{AssetId, ThumbnailConfig};
use clipforge_library::{Bounds, Card, ScriptedAcquirer, ThumbnailLoader, ThumbnailState};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::sleep;

fn grid(loader: &ThumbnailLoader<ScriptedAcquirer>, rows: usize) {
    for row in 0..rows {
        let id = format!("asset-{row}");
        let bounds = Bounds::new(0.0, row as f32 * 200.0, 300.0, 180.0);
        loader.observe(Card::new(id.as_str(), format!("videos/{id}.mp4"), bounds));
    }
}

#[tokio::test(start_paused = true)]
async fn scrolling_loads_each_visible_card_once() {
    let acq = Arc::new(ScriptedAcquirer::new().with_latency(Duration::from_millis(50)));
    let loader = ThumbnailLoader::new(Arc::clone(&acq), ThumbnailConfig::default(), Handle::current());
    grid(&loader, 20);

    // Rows 0-3 intersect, row 4 sits inside the look-ahead margin.
    assert_eq!(loader.update_viewport(Bounds::new(0.0, 0.0, 1280.0, 720.0)), 5);
    assert_eq!(loader.in_flight(), 5);

    // Scroll down and straight back while the first batch is loading.
    loader.update_viewport(Bounds::new(0.0, 2000.0, 1280.0, 720.0));
    loader.update_viewport(Bounds::new(0.0, 0.0, 1280.0, 720.0));
    sleep(Duration::from_secs(1)).await;

    assert_eq!(loader.in_flight(), 0);
    assert!(loader.is_cached("videos/asset-0.mp4"));
    assert!(!loader.is_cached("videos/asset-19.mp4"));
    // Rows 0-4 first, then rows 9-14 from the scrolled-to window; none twice.
    assert_eq!(acq.acquire_calls(), 11);
}

#[tokio::test(start_paused = true)]
async fn removed_while_loading_leaves_no_trace() {
    let acq = Arc::new(ScriptedAcquirer::new().with_latency(Duration::from_secs(3)));
    let loader = ThumbnailLoader::new(Arc::clone(&acq), ThumbnailConfig::default(), Handle::current());
    loader.update_viewport(Bounds::new(0.0, 0.0, 800.0, 600.0));
    grid(&loader, 2);
    let gone = AssetId::from("asset-0");
    let kept = AssetId::from("asset-1");
    assert_eq!(loader.state(&gone), ThumbnailState::Loading);

    sleep(Duration::from_secs(1)).await;
    loader.remove_asset(&gone);
    sleep(Duration::from_secs(10)).await;

    assert!(!loader.is_requested(&gone));
    assert!(!loader.is_observed(&gone));
    assert!(!loader.is_cached("videos/asset-0.mp4"));
    assert_eq!(loader.state(&gone), ThumbnailState::Absent);
    assert!(loader.state(&kept).is_ready());
}

#[tokio::test(start_paused = true)]
async fn dropping_loader_cancels_acquisitions() {
    let acq = Arc::new(ScriptedAcquirer::new().with_latency(Duration::from_secs(2)));
    let loader = ThumbnailLoader::new(Arc::clone(&acq), ThumbnailConfig::default(), Handle::current());
    loader.update_viewport(Bounds::new(0.0, 0.0, 800.0, 600.0));
    grid(&loader, 3);
    assert_eq!(loader.in_flight(), 3);

    drop(loader);
    sleep(Duration::from_secs(5)).await;
    assert_eq!(acq.acquire_calls(), 0);
    assert_eq!(Arc::strong_count(&acq), 1);
}
