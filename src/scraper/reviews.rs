//! Queue-mention mining over an expanded reviews panel.

use chrono::{DateTime, Duration, Utc};
use tracing::trace;

use crate::scraper::lexicon::Lexicon;
use crate::scraper::reltime::TimeNormalizer;
use crate::scraper::snapshot::PageSnapshot;
use crate::types::{QueueMentionSignal, ReviewSource};

/// Counts queue/wait mentions among reviews inside a time window.
///
/// A malformed review never fails the operation: fragments whose
/// timestamp cannot be resolved are skipped and the rest are counted.
#[derive(Debug, Clone, Default)]
pub struct ReviewMiner {
    lexicon: Lexicon,
    time: TimeNormalizer,
}

impl ReviewMiner {
    pub fn new() -> Self {
        Self {
            lexicon: Lexicon::new(),
            time: TimeNormalizer::new(),
        }
    }

    /// Count queue mentions in reviews from the last `window_hours`.
    pub fn mine(
        &self,
        snapshot: &PageSnapshot,
        venue_id: &str,
        source: ReviewSource,
        window_hours: u32,
        now: DateTime<Utc>,
    ) -> QueueMentionSignal {
        let window_start = now - Duration::hours(i64::from(window_hours));
        let mut scanned: u32 = 0;
        let mut hits: u32 = 0;

        for fragment in snapshot.reviews() {
            let raw = match fragment.raw_timestamp.as_deref() {
                Some(raw) => raw,
                None => {
                    trace!("{}: review without timestamp skipped", venue_id);
                    continue;
                }
            };
            let ts = match self.time.parse(raw, now) {
                Some(ts) => ts,
                None => {
                    trace!("{}: unparseable timestamp {:?} skipped", venue_id, raw);
                    continue;
                }
            };
            if ts < window_start || ts > now {
                continue;
            }

            scanned += 1;
            if self.lexicon.has_queue_term(&fragment.text) {
                hits += 1;
            }
        }

        QueueMentionSignal::new(venue_id, source, window_hours, scanned, hits, now)
    }
}
