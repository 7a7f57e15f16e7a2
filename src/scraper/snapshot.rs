//! Snapshot of a rendered page's visible text and structural labels.
//!
//! A snapshot is built once from the HTML a browser session yields and
//! lives only for the duration of one extraction call. Extraction
//! never touches the live page.

use scraper::{ElementRef, Html, Selector};

/// Node scan caps, matching what a place page can reasonably carry.
const MAX_LABEL_FRAGMENTS: usize = 400;
const MAX_REGION_FRAGMENTS: usize = 50;
const MAX_REVIEW_FRAGMENTS: usize = 400;

/// Markers that identify a timestamp-looking span inside a review.
const TIMESTAMP_MARKERS: [&str; 9] = [
    "전", "어제", "오늘", "년", "월", "일", "ago", "yesterday", "today",
];

/// One text fragment from a rendered page.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub text: String,
    /// Structural attribute (aria-label or role) the fragment came from.
    pub label: Option<String>,
    /// Unparsed timestamp string, present only for review fragments.
    pub raw_timestamp: Option<String>,
}

/// Ephemeral view of a rendered page.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    pub fragments: Vec<Fragment>,
}

impl PageSnapshot {
    /// Snapshot a place page: aria-label attributes first, then the
    /// visible text of sidebar/region containers.
    pub fn from_place_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut fragments = Vec::new();

        let label_selector = Selector::parse("[aria-label]").unwrap();
        for element in document.select(&label_selector).take(MAX_LABEL_FRAGMENTS) {
            let label = match element.value().attr("aria-label") {
                Some(value) if !value.trim().is_empty() => value.trim().to_string(),
                _ => continue,
            };
            fragments.push(Fragment {
                text: element_text(&element),
                label: Some(label),
                raw_timestamp: None,
            });
        }

        let region_selector = Selector::parse("div[role='feed'], div[role='region']").unwrap();
        for element in document.select(&region_selector).take(MAX_REGION_FRAGMENTS) {
            let text = element_text(&element);
            if text.is_empty() {
                continue;
            }
            fragments.push(Fragment {
                text,
                label: None,
                raw_timestamp: None,
            });
        }

        Self { fragments }
    }

    /// Snapshot an expanded reviews panel into review fragments with
    /// their raw timestamp strings.
    pub fn from_reviews_html(html: &str) -> Self {
        let document = Html::parse_document(html);

        let block_selector = Selector::parse("div[data-review-id], li[data-review-id]").unwrap();
        let mut blocks: Vec<ElementRef> = document.select(&block_selector).collect();

        if blocks.is_empty() {
            // Layouts without review ids: fall back to list items that
            // carry a timestamp-looking token.
            let item_selector = Selector::parse("li").unwrap();
            blocks = document
                .select(&item_selector)
                .filter(|el| {
                    let text = element_text(el);
                    TIMESTAMP_MARKERS.iter().any(|m| text.contains(m))
                })
                .collect();
        }

        let span_selector = Selector::parse("span, time").unwrap();
        let mut fragments = Vec::new();
        for block in blocks.into_iter().take(MAX_REVIEW_FRAGMENTS) {
            let text = element_text(&block);
            if text.is_empty() {
                continue;
            }
            let raw_timestamp = block
                .select(&span_selector)
                .map(|span| element_text(&span))
                .find(|t| TIMESTAMP_MARKERS.iter().any(|m| t.contains(m)));
            fragments.push(Fragment {
                text,
                label: None,
                raw_timestamp,
            });
        }

        Self { fragments }
    }

    /// Structural attribute strings, in document order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().filter_map(|f| f.label.as_deref())
    }

    /// Region/sidebar body texts (fragments without a label).
    pub fn body_texts(&self) -> impl Iterator<Item = &str> {
        self.fragments
            .iter()
            .filter(|f| f.label.is_none() && f.raw_timestamp.is_none())
            .map(|f| f.text.as_str())
    }

    /// Review fragments (the only fragments carrying raw timestamps).
    pub fn reviews(&self) -> impl Iterator<Item = &Fragment> {
        self.fragments.iter()
    }

    /// All text and labels joined, for whole-page phrase scans.
    pub fn text_blob(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(self.fragments.len() * 2);
        for fragment in &self.fragments {
            if !fragment.text.is_empty() {
                parts.push(&fragment.text);
            }
            if let Some(label) = &fragment.label {
                parts.push(label);
            }
        }
        parts.join("\n")
    }
}

/// Collapse an element's text into one whitespace-normalized string.
fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
