//! Scrape orchestration: caching, retries, rate limiting, batching.
//!
//! The orchestrator owns the cache and the politeness machinery and is
//! the only public entry point. Every failure is absorbed here and
//! surfaced as `None` plus a diagnostic log line; callers never see an
//! error cross this boundary.

use chrono::Utc;
use futures::future::join_all;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::ScrapeError;
use crate::retry::RetryPolicy;
use crate::scraper::browser::{ChromeRenderer, PageRenderer};
use crate::scraper::busyness::BusynessExtractor;
use crate::scraper::cache::SignalCache;
use crate::scraper::rate_limiter::RateLimiter;
use crate::scraper::resolve_url;
use crate::scraper::reviews::ReviewMiner;
use crate::scraper::snapshot::PageSnapshot;
use crate::types::{
    AvailabilityReport, BusynessSignal, QueueMentionSignal, ReviewSource, Signal, VenueDescriptor,
};

/// Public scraping surface.
pub struct Orchestrator {
    renderer: Box<dyn PageRenderer>,
    cache: SignalCache,
    retry: RetryPolicy,
    limiter: RateLimiter,
    extractor: BusynessExtractor,
    miner: ReviewMiner,
    batch_pause: Duration,
    availability_pause: Duration,
    max_expansion_steps: u32,
}

impl Orchestrator {
    /// Orchestrator backed by headless Chrome.
    pub fn new(config: &AppConfig) -> Self {
        let cache = SignalCache::new(chrono::Duration::seconds(config.cache.ttl_secs as i64));
        Self::with_renderer(config, Box::new(ChromeRenderer::new(config.render.clone())), cache)
    }

    /// Orchestrator with an injected renderer and cache.
    ///
    /// This is the seam test code and alternative rendering backends
    /// plug into; `new` is this with the Chrome renderer.
    pub fn with_renderer(
        config: &AppConfig,
        renderer: Box<dyn PageRenderer>,
        cache: SignalCache,
    ) -> Self {
        Self {
            renderer,
            cache,
            retry: RetryPolicy::new(
                config.scrape.max_attempts,
                Duration::from_secs(config.scrape.retry_delay_secs),
            ),
            limiter: RateLimiter::new(
                config.rate_limit.requests_per_minute,
                config.rate_limit.min_delay_secs,
                config.rate_limit.max_delay_secs,
            ),
            extractor: BusynessExtractor::new(),
            miner: ReviewMiner::new(),
            batch_pause: Duration::from_secs(config.scrape.batch_pause_secs),
            availability_pause: Duration::from_secs(config.scrape.availability_pause_secs),
            max_expansion_steps: config.scrape.max_expansion_steps,
        }
    }

    /// Fetch the current busyness estimate for one venue.
    ///
    /// Returns `None` when the venue exposes no busyness data or every
    /// attempt failed; neither interrupts a surrounding batch.
    pub async fn fetch_busyness(
        &self,
        venue: &VenueDescriptor,
        use_cache: bool,
    ) -> Option<BusynessSignal> {
        if use_cache {
            if let Some(Signal::Busyness(signal)) = self.cache.get(&venue.venue_id) {
                return Some(signal);
            }
        }

        let url = resolve_url(venue);
        let outcome = self
            .retry
            .run("fetch_busyness", || self.scrape_busyness_once(venue, &url))
            .await;

        match outcome {
            Ok(Some(signal)) => {
                if use_cache {
                    self.cache
                        .set(&venue.venue_id, Signal::Busyness(signal.clone()));
                }
                Some(signal)
            }
            Ok(None) => {
                debug!("{}: no busyness data exposed", venue.venue_id);
                None
            }
            Err(e) => {
                warn!("{}: busyness scrape failed: {}", venue.venue_id, e);
                None
            }
        }
    }

    async fn scrape_busyness_once(
        &self,
        venue: &VenueDescriptor,
        url: &str,
    ) -> Result<Option<BusynessSignal>, ScrapeError> {
        self.limiter.acquire().await;
        let html = self.renderer.place_html(url).await?;
        let snapshot = PageSnapshot::from_place_html(&html);
        Ok(self.extractor.extract(&snapshot, &venue.venue_id, Utc::now()))
    }

    /// Count queue mentions in a venue's recent reviews.
    ///
    /// Returns `None` when the reviews panel cannot be located or the
    /// render failed outright.
    pub async fn fetch_queue_mentions(
        &self,
        venue: &VenueDescriptor,
        source: ReviewSource,
        window_hours: u32,
    ) -> Option<QueueMentionSignal> {
        let cache_key = format!("{}:queue:{}h:{}", venue.venue_id, window_hours, source);
        if let Some(Signal::Queue(signal)) = self.cache.get(&cache_key) {
            return Some(signal);
        }

        let url = resolve_url(venue);
        let outcome = self
            .retry
            .run("fetch_queue_mentions", || {
                self.scrape_queue_mentions_once(venue, &url, source, window_hours)
            })
            .await;

        match outcome {
            Ok(signal) => {
                self.cache.set(&cache_key, Signal::Queue(signal.clone()));
                Some(signal)
            }
            Err(e) => {
                warn!("{}: queue mention scrape failed: {}", venue.venue_id, e);
                None
            }
        }
    }

    async fn scrape_queue_mentions_once(
        &self,
        venue: &VenueDescriptor,
        url: &str,
        source: ReviewSource,
        window_hours: u32,
    ) -> Result<QueueMentionSignal, ScrapeError> {
        self.limiter.acquire().await;
        let html = self
            .renderer
            .reviews_html(url, source, self.max_expansion_steps)
            .await?;
        let snapshot = PageSnapshot::from_reviews_html(&html);
        Ok(self
            .miner
            .mine(&snapshot, &venue.venue_id, source, window_hours, Utc::now()))
    }

    /// Scrape busyness for many venues in bounded concurrent groups.
    ///
    /// Groups run strictly one after another with a politeness pause
    /// between them, which caps concurrent browser sessions at
    /// `concurrency`. The result is the null-filtered concatenation of
    /// every group's successes.
    pub async fn scrape_venues_batch(
        &self,
        venues: &[VenueDescriptor],
        concurrency: usize,
    ) -> Vec<Signal> {
        let concurrency = concurrency.max(1);
        let mut results = Vec::new();

        for (group_index, group) in venues.chunks(concurrency).enumerate() {
            if group_index > 0 {
                sleep(self.batch_pause).await;
            }

            let group_results =
                join_all(group.iter().map(|venue| self.fetch_busyness(venue, true))).await;

            let successful: Vec<BusynessSignal> =
                group_results.into_iter().flatten().collect();
            info!(
                "batch group {} done: {}/{} venues yielded data",
                group_index + 1,
                successful.len(),
                group.len()
            );
            results.extend(successful.into_iter().map(Signal::Busyness));
        }

        results
    }

    /// Probe every venue once, cache bypassed, to find venues that no
    /// longer return data.
    pub async fn check_availability(&self, venues: &[VenueDescriptor]) -> AvailabilityReport {
        let mut report = AvailabilityReport {
            total: venues.len(),
            ..Default::default()
        };

        for (index, venue) in venues.iter().enumerate() {
            if index > 0 {
                // Long pause: availability probes are background work.
                sleep(self.availability_pause).await;
            }
            match self.fetch_busyness(venue, false).await {
                Some(_) => report.successful += 1,
                None => {
                    report.failed += 1;
                    report.problematic.push(venue.venue_id.clone());
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VenueAddress;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    const BUSY_HTML: &str = r#"<div aria-label="Live busyness: 73%"></div>"#;
    const QUIET_HTML: &str = "<html><body><p>Open until 10 PM</p></body></html>";

    const REVIEWS_HTML: &str = r#"
<div data-review-id="r1"><span>3시간 전</span><p>웨이팅 한시간</p></div>
<div data-review-id="r2"><span>2 days ago</span><p>walked right in</p></div>
<div data-review-id="r3"><span>5주 전</span><p>대기 줄이 길어요</p></div>"#;

    /// Renderer returning canned HTML, or errors when unset.
    struct FakeRenderer {
        place_calls: AtomicU32,
        review_calls: AtomicU32,
        place_html: Option<String>,
        reviews_html: Option<String>,
    }

    impl FakeRenderer {
        fn with_place(html: &str) -> Arc<Self> {
            Arc::new(Self {
                place_calls: AtomicU32::new(0),
                review_calls: AtomicU32::new(0),
                place_html: Some(html.to_string()),
                reviews_html: None,
            })
        }

        fn with_reviews(html: &str) -> Arc<Self> {
            Arc::new(Self {
                place_calls: AtomicU32::new(0),
                review_calls: AtomicU32::new(0),
                place_html: None,
                reviews_html: Some(html.to_string()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                place_calls: AtomicU32::new(0),
                review_calls: AtomicU32::new(0),
                place_html: None,
                reviews_html: None,
            })
        }
    }

    #[async_trait]
    impl PageRenderer for Arc<FakeRenderer> {
        async fn place_html(&self, _url: &str) -> Result<String, ScrapeError> {
            self.place_calls.fetch_add(1, Ordering::SeqCst);
            match &self.place_html {
                Some(html) => Ok(html.clone()),
                None => Err(ScrapeError::Unavailable("no chrome".into())),
            }
        }

        async fn reviews_html(
            &self,
            _url: &str,
            _source: ReviewSource,
            _max_expansion_steps: u32,
        ) -> Result<String, ScrapeError> {
            self.review_calls.fetch_add(1, Ordering::SeqCst);
            match &self.reviews_html {
                Some(html) => Ok(html.clone()),
                None => Err(ScrapeError::PanelNotFound),
            }
        }
    }

    fn orchestrator(renderer: Arc<FakeRenderer>) -> Orchestrator {
        let config = AppConfig::default();
        Orchestrator::with_renderer(&config, Box::new(renderer), SignalCache::with_default_ttl())
    }

    fn venue(venue_id: &str) -> VenueDescriptor {
        VenueDescriptor {
            venue_id: venue_id.to_string(),
            address: VenueAddress::PageUrl(format!("https://maps.google.com/?cid={}", venue_id)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_fetch_renders_once() {
        let renderer = FakeRenderer::with_place(BUSY_HTML);
        let orch = orchestrator(renderer.clone());

        let first = orch.fetch_busyness(&venue("v1"), true).await.unwrap();
        let second = orch.fetch_busyness(&venue("v1"), true).await.unwrap();

        assert_eq!(first.value, 0.73);
        assert_eq!(second.value, 0.73);
        assert_eq!(renderer.place_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_bypass_renders_each_time() {
        let renderer = FakeRenderer::with_place(BUSY_HTML);
        let orch = orchestrator(renderer.clone());

        orch.fetch_busyness(&venue("v1"), false).await;
        orch.fetch_busyness(&venue("v1"), false).await;

        assert_eq!(renderer.place_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_match_returns_none_without_retry() {
        let renderer = FakeRenderer::with_place(QUIET_HTML);
        let orch = orchestrator(renderer.clone());

        let result = orch.fetch_busyness(&venue("v1"), true).await;

        assert!(result.is_none());
        assert_eq!(renderer.place_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_failure_retried_then_absorbed() {
        let renderer = FakeRenderer::failing();
        let orch = orchestrator(renderer.clone());

        let result = orch.fetch_busyness(&venue("v1"), true).await;

        assert!(result.is_none());
        // Default policy: two attempts total.
        assert_eq!(renderer.place_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_not_cached() {
        let renderer = FakeRenderer::failing();
        let orch = orchestrator(renderer.clone());

        orch.fetch_busyness(&venue("v1"), true).await;
        orch.fetch_busyness(&venue("v1"), true).await;

        assert_eq!(renderer.place_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_mentions_end_to_end() {
        let renderer = FakeRenderer::with_reviews(REVIEWS_HTML);
        let orch = orchestrator(renderer.clone());

        let sig = orch
            .fetch_queue_mentions(&venue("v1"), ReviewSource::Google, 72)
            .await
            .unwrap();

        assert_eq!(sig.value, 1.0);
        assert_eq!(sig.meta.total_reviews_scanned, 2);
        assert_eq!(sig.meta.rate, 0.5);
        assert_eq!(sig.metric, "queue_mentions_72h");
        assert_eq!(sig.source, "reviews_google");
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_panel_fails_whole_call_without_retry() {
        let renderer = FakeRenderer::failing();
        let orch = orchestrator(renderer.clone());

        let result = orch
            .fetch_queue_mentions(&venue("v1"), ReviewSource::Naver, 72)
            .await;

        assert!(result.is_none());
        assert_eq!(renderer.review_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_returns_all_successes() {
        let renderer = FakeRenderer::with_place(BUSY_HTML);
        let orch = orchestrator(renderer.clone());
        let venues: Vec<VenueDescriptor> = (1..=5).map(|i| venue(&format!("v{}", i))).collect();

        let signals = orch.scrape_venues_batch(&venues, 2).await;

        assert_eq!(signals.len(), 5);
        assert_eq!(renderer.place_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_absorbs_per_venue_failures() {
        let renderer = FakeRenderer::failing();
        let orch = orchestrator(renderer.clone());
        let venues: Vec<VenueDescriptor> = (1..=3).map(|i| venue(&format!("v{}", i))).collect();

        let signals = orch.scrape_venues_batch(&venues, 2).await;

        assert!(signals.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_availability_reports_problem_venues() {
        let renderer = FakeRenderer::failing();
        let orch = orchestrator(renderer.clone());
        let venues = vec![venue("v1"), venue("v2")];

        let report = orch.check_availability(&venues).await;

        assert_eq!(report.total, 2);
        assert_eq!(report.successful, 0);
        assert_eq!(report.failed, 2);
        assert_eq!(report.problematic, vec!["v1".to_string(), "v2".to_string()]);
    }
}
