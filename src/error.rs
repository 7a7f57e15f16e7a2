//! Error taxonomy for the scraping pipeline.
//!
//! Only conditions that abort a scrape attempt are errors. An extraction
//! that finds nothing is a valid empty result and is modeled as `None`
//! by the components, never as a variant here.

use thiserror::Error;

/// Failures that can abort a single scrape attempt.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The browser session could not be started at all.
    #[error("browser unavailable: {0}")]
    Unavailable(String),

    /// Navigation or settle exceeded the configured timeout.
    #[error("render timed out after {0}s")]
    RenderTimeout(u64),

    /// The page loaded but a CDP call against it failed.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The reviews panel could not be located on the page.
    #[error("reviews panel not found")]
    PanelNotFound,
}

impl ScrapeError {
    /// Whether a fresh attempt could plausibly succeed.
    ///
    /// A missing reviews panel is a property of the page, not of the
    /// attempt, so retrying it is pointless.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScrapeError::Unavailable(_) => true,
            ScrapeError::RenderTimeout(_) => true,
            ScrapeError::Navigation(_) => true,
            ScrapeError::PanelNotFound => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_failures_are_retryable() {
        assert!(ScrapeError::Unavailable("no chrome".into()).is_retryable());
        assert!(ScrapeError::RenderTimeout(25).is_retryable());
        assert!(ScrapeError::Navigation("net::ERR_FAILED".into()).is_retryable());
    }

    #[test]
    fn test_missing_panel_is_not_retryable() {
        assert!(!ScrapeError::PanelNotFound.is_retryable());
    }
}
