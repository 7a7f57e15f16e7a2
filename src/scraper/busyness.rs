//! Live busyness extraction from a page snapshot.
//!
//! Strategies run in a fixed order that prefers precision over recall:
//! a stated percentage in a structural label, then one in region body
//! text, then a qualitative phrase anywhere. Finding nothing is a
//! valid outcome, not an error.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::scraper::lexicon::Lexicon;
use crate::scraper::snapshot::PageSnapshot;
use crate::types::BusynessSignal;

/// Extractor applying the strategy chain to one snapshot at a time.
#[derive(Debug, Clone, Default)]
pub struct BusynessExtractor {
    lexicon: Lexicon,
}

impl BusynessExtractor {
    pub fn new() -> Self {
        Self {
            lexicon: Lexicon::new(),
        }
    }

    /// Extract a busyness signal, or `None` when the page does not
    /// currently expose one.
    pub fn extract(
        &self,
        snapshot: &PageSnapshot,
        venue_id: &str,
        now: DateTime<Utc>,
    ) -> Option<BusynessSignal> {
        // Strategy 1: structural labels carry the live indicator on
        // most layouts.
        for label in snapshot.labels() {
            if let Some(percent) = self.lexicon.match_percentage(label) {
                debug!("{}: {}% from label", venue_id, percent);
                return Some(BusynessSignal::from_percent(venue_id, percent, now));
            }
        }

        // Strategy 2: sidebar/region body text.
        for text in snapshot.body_texts() {
            if let Some(percent) = self.lexicon.match_percentage(text) {
                debug!("{}: {}% from region text", venue_id, percent);
                return Some(BusynessSignal::from_percent(venue_id, percent, now));
            }
        }

        // Strategy 3: qualitative phrase anywhere on the page.
        let blob = snapshot.text_blob();
        if let Some(estimate) = self.lexicon.match_qualitative(&blob) {
            debug!("{}: qualitative estimate {}", venue_id, estimate);
            return Some(BusynessSignal::from_estimate(venue_id, estimate, now));
        }

        None
    }
}
