//! Browser automation using chromiumoxide.
//!
//! One session per scrape: launched, navigated, snapshotted, and torn
//! down inside a single call. Sessions are never shared across
//! concurrent scrapes and never outlive the call that opened them.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as ChromeBrowser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::time::{sleep, timeout, Duration};
use tracing::debug;

use crate::config::RenderConfig;
use crate::error::ScrapeError;
use crate::types::ReviewSource;

/// Pause after opening the reviews panel or a sort control.
const PANEL_SETTLE: Duration = Duration::from_millis(1500);

/// Pause between expansion steps while reviews stream in.
const EXPANSION_PAUSE: Duration = Duration::from_millis(900);

/// Scroll distance per expansion step when no load-more control exists.
const SCROLL_STEP_PX: u32 = 2400;

/// Rendering surface behind the orchestrator.
///
/// The production implementation launches a headless Chrome session
/// per call; tests substitute canned HTML.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Render a venue's place page and return its HTML after settling.
    async fn place_html(&self, url: &str) -> Result<String, ScrapeError>;

    /// Render a venue's page, open and expand its reviews panel, and
    /// return the HTML. Fails with `PanelNotFound` when no reviews
    /// control can be located.
    async fn reviews_html(
        &self,
        url: &str,
        source: ReviewSource,
        max_expansion_steps: u32,
    ) -> Result<String, ScrapeError>;
}

/// `PageRenderer` that owns a fresh Chrome session per call.
pub struct ChromeRenderer {
    config: RenderConfig,
}

impl ChromeRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn place_html(&self, url: &str) -> Result<String, ScrapeError> {
        let session = BrowserSession::launch(&self.config).await?;
        let result = session.place_html(url).await;
        session.close().await;
        result
    }

    async fn reviews_html(
        &self,
        url: &str,
        source: ReviewSource,
        max_expansion_steps: u32,
    ) -> Result<String, ScrapeError> {
        let session = BrowserSession::launch(&self.config).await?;
        let result = session.reviews_html(url, source, max_expansion_steps).await;
        session.close().await;
        result
    }
}

/// Browser wrapper owning one headless Chrome instance.
pub struct BrowserSession {
    browser: ChromeBrowser,
    handle: tokio::task::JoinHandle<()>,
    nav_timeout: Duration,
    settle: Duration,
}

impl BrowserSession {
    /// Launch a new headless browser instance.
    pub async fn launch(config: &RenderConfig) -> Result<Self, ScrapeError> {
        // Find Chrome executable
        let chrome_path = if cfg!(target_os = "macos") {
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"
        } else if cfg!(target_os = "windows") {
            "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe"
        } else {
            "google-chrome"
        };

        let browser_config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .no_sandbox()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--mute-audio")
            .arg(format!("--lang={}", config.locale))
            .arg(format!("--user-agent={}", config.user_agent))
            .window_size(config.window_width, config.window_height)
            .build()
            .map_err(ScrapeError::Unavailable)?;

        let (browser, mut handler) = ChromeBrowser::launch(browser_config)
            .await
            .map_err(|e| ScrapeError::Unavailable(e.to_string()))?;

        // Spawn handler task - must keep running for browser to work
        let handle = tokio::spawn(async move {
            loop {
                match handler.next().await {
                    Some(Ok(_)) => continue,
                    Some(Err(_)) => continue, // Don't break on errors
                    None => break,
                }
            }
        });

        Ok(Self {
            browser,
            handle,
            nav_timeout: Duration::from_secs(config.nav_timeout_secs),
            settle: Duration::from_millis(config.settle_ms),
        })
    }

    /// Navigate and let client-side widgets render.
    async fn open(&self, url: &str) -> Result<Page, ScrapeError> {
        debug!("navigating to {}", url);
        let page = timeout(self.nav_timeout, self.browser.new_page(url))
            .await
            .map_err(|_| ScrapeError::RenderTimeout(self.nav_timeout.as_secs()))?
            .map_err(|e| ScrapeError::Navigation(e.to_string()))?;

        // Live indicators and popular-times widgets stream in after load.
        sleep(self.settle).await;
        Ok(page)
    }

    /// Fetch a place page's HTML after the settle period.
    pub async fn place_html(&self, url: &str) -> Result<String, ScrapeError> {
        let page = self.open(url).await?;
        let result = page
            .content()
            .await
            .map_err(|e| ScrapeError::Navigation(e.to_string()));
        let _ = page.close().await;
        result
    }

    /// Open the reviews panel, expand it, and fetch the HTML.
    pub async fn reviews_html(
        &self,
        url: &str,
        source: ReviewSource,
        max_expansion_steps: u32,
    ) -> Result<String, ScrapeError> {
        let page = self.open(url).await?;
        let result = self.expand_reviews(&page, source, max_expansion_steps).await;
        let _ = page.close().await;
        result
    }

    async fn expand_reviews(
        &self,
        page: &Page,
        source: ReviewSource,
        max_expansion_steps: u32,
    ) -> Result<String, ScrapeError> {
        // Open the reviews tab; without it there is nothing to mine.
        let mut opened = false;
        for selector in tab_selectors(source) {
            if let Ok(element) = page.find_element(*selector).await {
                if element.click().await.is_ok() {
                    sleep(PANEL_SETTLE).await;
                    opened = true;
                    break;
                }
            }
        }
        if !opened {
            return Err(ScrapeError::PanelNotFound);
        }

        // Prefer newest-first ordering when the control exists.
        for selector in recent_sort_selectors(source) {
            if let Ok(element) = page.find_element(*selector).await {
                if element.click().await.is_ok() {
                    sleep(PANEL_SETTLE).await;
                    break;
                }
            }
        }

        // Reviews materialize incrementally: click load-more where the
        // layout has one, otherwise scroll.
        for step in 0..max_expansion_steps {
            let mut clicked = false;
            for selector in load_more_selectors(source) {
                if let Ok(element) = page.find_element(*selector).await {
                    if element.click().await.is_ok() {
                        clicked = true;
                        break;
                    }
                }
            }
            if !clicked {
                let scroll = format!("window.scrollBy(0, {})", SCROLL_STEP_PX);
                let _ = page.evaluate(scroll.as_str()).await;
            }
            debug!("review expansion step {} (clicked: {})", step + 1, clicked);
            sleep(EXPANSION_PAUSE).await;
        }

        page.content()
            .await
            .map_err(|e| ScrapeError::Navigation(e.to_string()))
    }

    /// Close the browser.
    pub async fn close(mut self) {
        let _ = self.browser.close().await;
        self.handle.abort();
    }
}

/// Selectors that open the reviews panel, tried in order.
fn tab_selectors(source: ReviewSource) -> &'static [&'static str] {
    match source {
        ReviewSource::Google => &[
            "button[aria-label*='리뷰']",
            "div[role='tab'][aria-label*='리뷰']",
            "button[aria-label*='Reviews']",
            "div[role='tab'][aria-label*='Reviews']",
        ],
        ReviewSource::Naver => &[
            "a[aria-label*='리뷰']",
            "button[aria-label*='리뷰']",
            "a[role='tab'][aria-label*='리뷰']",
        ],
    }
}

/// Selectors for a newest-first sort control.
fn recent_sort_selectors(source: ReviewSource) -> &'static [&'static str] {
    match source {
        ReviewSource::Google => &["button[aria-label*='정렬']", "button[aria-label*='Sort']"],
        ReviewSource::Naver => &["button[aria-label*='최근']", "a[aria-label*='최근']"],
    }
}

/// Selectors for a load-more control.
fn load_more_selectors(source: ReviewSource) -> &'static [&'static str] {
    match source {
        ReviewSource::Google => &["button[aria-label*='More reviews']"],
        ReviewSource::Naver => &["a[aria-label*='더보기']", "button[aria-label*='더보기']"],
    }
}
