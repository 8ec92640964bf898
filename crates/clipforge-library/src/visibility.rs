//! Card visibility tracking.
//!
//! Mirrors an intersection observer: each registered card remembers
//! whether it was visible at the last viewport update, and only a
//! not-visible → visible transition is reported.

use clipforge_core::AssetId;
use std::collections::HashMap;

/// Axis-aligned rectangle in layout pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Grow by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// A rendered asset card.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub asset: AssetId,
    /// Locator of the asset the card shows.
    pub locator: String,
    pub bounds: Bounds,
}

impl Card {
    pub fn new(asset: impl Into<AssetId>, locator: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            asset: asset.into(),
            locator: locator.into(),
            bounds,
        }
    }
}

#[derive(Debug)]
struct Observed {
    card: Card,
    visible: bool,
}

/// Registered cards and their last known visibility.
#[derive(Debug)]
pub struct VisibilityTracker {
    lookahead: f32,
    viewport: Option<Bounds>,
    cards: HashMap<AssetId, Observed>,
}

impl VisibilityTracker {
    /// Cards within `lookahead` pixels of the viewport count as visible.
    pub fn new(lookahead: f32) -> Self {
        Self {
            lookahead,
            viewport: None,
            cards: HashMap::new(),
        }
    }

    fn in_view(&self, bounds: &Bounds) -> bool {
        self.viewport
            .is_some_and(|vp| vp.expand(self.lookahead).intersects(bounds))
    }

    /// Register (or re-register) a card. Returns `true` if the card just
    /// became visible.
    pub fn observe(&mut self, card: Card) -> bool {
        let now_visible = self.in_view(&card.bounds);
        let was_visible = self
            .cards
            .get(&card.asset)
            .is_some_and(|o| o.visible && o.card.locator == card.locator);
        self.cards.insert(
            card.asset.clone(),
            Observed {
                card,
                visible: now_visible,
            },
        );
        now_visible && !was_visible
    }

    /// Stop observing a card. Returns whether it was registered.
    pub fn unobserve(&mut self, asset: &AssetId) -> bool {
        self.cards.remove(asset).is_some()
    }

    /// Apply a new viewport. Returns the cards that became visible.
    pub fn update_viewport(&mut self, viewport: Bounds) -> Vec<Card> {
        self.viewport = Some(viewport);
        let area = viewport.expand(self.lookahead);
        let mut entered = Vec::new();
        for observed in self.cards.values_mut() {
            let visible = area.intersects(&observed.card.bounds);
            if visible && !observed.visible {
                entered.push(observed.card.clone());
            }
            observed.visible = visible;
        }
        entered
    }

    pub fn card(&self, asset: &AssetId) -> Option<&Card> {
        self.cards.get(asset).map(|o| &o.card)
    }

    pub fn is_observed(&self, asset: &AssetId) -> bool {
        self.cards.contains_key(asset)
    }

    pub fn is_visible(&self, asset: &AssetId) -> bool {
        self.cards.get(asset).is_some_and(|o| o.visible)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
