//! Configuration for venuepulse.

use serde::{Deserialize, Serialize};

/// Scrape flow configuration: retries, pauses, review expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Total tries per venue, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Politeness pause between tries for the same venue.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Politeness pause between concurrent batches.
    #[serde(default = "default_batch_pause_secs")]
    pub batch_pause_secs: u64,
    /// Pause between probes in an availability check.
    #[serde(default = "default_availability_pause_secs")]
    pub availability_pause_secs: u64,
    /// Bound on load-more/scroll actions when expanding reviews.
    #[serde(default = "default_max_expansion_steps")]
    pub max_expansion_steps: u32,
}

fn default_max_attempts() -> u32 {
    2
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_batch_pause_secs() -> u64 {
    2
}

fn default_availability_pause_secs() -> u64 {
    20
}

fn default_max_expansion_steps() -> u32 {
    8
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            batch_pause_secs: default_batch_pause_secs(),
            availability_pause_secs: default_availability_pause_secs(),
            max_expansion_steps: default_max_expansion_steps(),
        }
    }
}

/// Browser rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Hard bound on navigation, in seconds.
    #[serde(default = "default_nav_timeout_secs")]
    pub nav_timeout_secs: u64,
    /// Fixed settle period after navigation so dynamic widgets populate.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_nav_timeout_secs() -> u64 {
    25
}

fn default_settle_ms() -> u64 {
    3000
}

fn default_window_width() -> u32 {
    1366
}

fn default_window_height() -> u32 {
    900
}

fn default_locale() -> String {
    "ko-KR".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            nav_timeout_secs: default_nav_timeout_secs(),
            settle_ms: default_settle_ms(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            locale: default_locale(),
            user_agent: default_user_agent(),
        }
    }
}

/// Signal cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default time-to-live for cached signals.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    7200
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Rate limiter configuration for page navigations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: f64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,
}

fn default_requests_per_minute() -> u32 {
    20
}

fn default_min_delay_secs() -> f64 {
    1.0
}

fn default_max_delay_secs() -> f64 {
    2.5
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            min_delay_secs: default_min_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (VENUEPULSE_SCRAPE_MAX_ATTEMPTS, etc.)
            .add_source(
                config::Environment::with_prefix("VENUEPULSE")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.scrape.max_attempts, 2);
        assert_eq!(config.scrape.retry_delay_secs, 2);
        assert_eq!(config.cache.ttl_secs, 7200);
        assert_eq!(config.render.nav_timeout_secs, 25);
        assert_eq!(config.render.locale, "ko-KR");
    }
}
