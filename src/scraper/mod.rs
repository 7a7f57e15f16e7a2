//! Scraping engine for venue activity signals.
//!
//! Provides browser rendering, snapshot extraction, lexicon matching,
//! and the orchestrator that ties them together.

pub mod browser;
pub mod busyness;
pub mod cache;
pub mod lexicon;
pub mod orchestrator;
pub mod rate_limiter;
pub mod reltime;
pub mod reviews;
pub mod snapshot;

pub use browser::{ChromeRenderer, PageRenderer};
pub use cache::SignalCache;
pub use orchestrator::Orchestrator;
pub use rate_limiter::RateLimiter;
pub use snapshot::PageSnapshot;

use crate::types::{VenueAddress, VenueDescriptor};

/// Place lookup URL prefix for a stable place identifier.
pub const PLACE_LOOKUP_URL: &str = "https://www.google.com/maps/place/?q=place_id:";

/// Search URL prefix for the free-text fallback.
pub const SEARCH_URL: &str = "https://www.google.com/maps/search/";

/// Area qualifier appended to free-text searches to disambiguate.
pub const SEARCH_AREA_QUALIFIER: &str = "성수";

/// Resolve the page URL for a venue.
///
/// Priority is fixed: an explicit page URL wins, then a place
/// identifier, and only as a last resort a name search scoped to the
/// area qualifier.
pub fn resolve_url(venue: &VenueDescriptor) -> String {
    match &venue.address {
        VenueAddress::PageUrl(url) => url.clone(),
        VenueAddress::PlaceId(place_id) => format!("{}{}", PLACE_LOOKUP_URL, place_id),
        VenueAddress::Search { name } => format!(
            "{}{}+{}",
            SEARCH_URL,
            name.replace(' ', "+"),
            SEARCH_AREA_QUALIFIER
        ),
    }
}
