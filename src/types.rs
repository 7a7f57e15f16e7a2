//! Venue descriptors and the signal records returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a venue's page is reached.
///
/// Exactly one addressing mode per venue. Resolution priority when
/// building a URL is `PageUrl` > `PlaceId` > `Search`; the search form
/// is the least reliable and only used when nothing better exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueAddress {
    /// Direct URL of the venue's map page.
    PageUrl(String),
    /// Stable place identifier, templated into a place lookup URL.
    PlaceId(String),
    /// Free-text name, combined with the configured area qualifier.
    Search { name: String },
}

/// Identity and addressing for a place to be scraped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueDescriptor {
    pub venue_id: String,
    #[serde(flatten)]
    pub address: VenueAddress,
}

/// Reliability tier of a busyness estimate.
///
/// `Medium` means the page stated a number; `Low` means the value was
/// inferred from a coarse phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
}

/// Live busyness estimate for one venue at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusynessSignal {
    pub ts: DateTime<Utc>,
    pub venue_id: String,
    pub metric: String,
    /// Normalized occupancy estimate, always in [0, 1].
    pub value: f64,
    /// The stated percentage, absent for qualitative estimates.
    pub raw_percent: Option<u32>,
    pub confidence: Confidence,
    pub qualitative: bool,
}

impl BusynessSignal {
    /// Signal from a stated percentage. Over-capacity values are
    /// clamped to 100 before normalizing.
    pub fn from_percent(venue_id: &str, percent: u32, ts: DateTime<Utc>) -> Self {
        let clamped = percent.min(100);
        Self {
            ts,
            venue_id: venue_id.to_string(),
            metric: "live_busyness".to_string(),
            value: f64::from(clamped) / 100.0,
            raw_percent: Some(clamped),
            confidence: Confidence::Medium,
            qualitative: false,
        }
    }

    /// Signal from a qualitative phrase mapped to a coarse estimate.
    pub fn from_estimate(venue_id: &str, estimate: f64, ts: DateTime<Utc>) -> Self {
        Self {
            ts,
            venue_id: venue_id.to_string(),
            metric: "live_busyness".to_string(),
            value: estimate.clamp(0.0, 1.0),
            raw_percent: None,
            confidence: Confidence::Low,
            qualitative: true,
        }
    }
}

/// Which review surface to mine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSource {
    Google,
    Naver,
}

impl ReviewSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewSource::Google => "google",
            ReviewSource::Naver => "naver",
        }
    }
}

impl std::str::FromStr for ReviewSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(ReviewSource::Google),
            "naver" => Ok(ReviewSource::Naver),
            other => Err(format!("unknown review source: {}", other)),
        }
    }
}

impl std::fmt::Display for ReviewSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregates attached to a queue-mention count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueMeta {
    pub window_hours: u32,
    pub total_reviews_scanned: u32,
    /// hits / total_reviews_scanned, 0 when nothing qualified.
    pub rate: f64,
}

/// Count of queue/wait mentions in recent reviews of one venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueMentionSignal {
    pub ts: DateTime<Utc>,
    pub venue_id: String,
    pub metric: String,
    pub value: f64,
    pub meta: QueueMeta,
    pub source: String,
}

impl QueueMentionSignal {
    pub fn new(
        venue_id: &str,
        source: ReviewSource,
        window_hours: u32,
        total_reviews_scanned: u32,
        hits: u32,
        ts: DateTime<Utc>,
    ) -> Self {
        let rate = if total_reviews_scanned == 0 {
            0.0
        } else {
            let raw = f64::from(hits) / f64::from(total_reviews_scanned);
            (raw * 10_000.0).round() / 10_000.0
        };
        Self {
            ts,
            venue_id: venue_id.to_string(),
            metric: format!("queue_mentions_{}h", window_hours),
            value: f64::from(hits),
            meta: QueueMeta {
                window_hours,
                total_reviews_scanned,
                rate,
            },
            source: format!("reviews_{}", source.as_str()),
        }
    }
}

/// Any signal record this crate produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Signal {
    Busyness(BusynessSignal),
    Queue(QueueMentionSignal),
}

/// Outcome of probing every venue once, cache bypassed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Venues that returned no data.
    pub problematic: Vec<String>,
}
