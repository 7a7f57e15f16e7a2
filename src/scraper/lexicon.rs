//! Pattern dictionaries for busyness and queue vocabulary.
//!
//! The phrasings below track what the map services actually render in
//! aria-labels and visible text, in both Korean and English layouts.
//! They change without notice; extend the tables as new variants show
//! up in the wild.

use regex::Regex;

/// Percentages above this are treated as noise rather than busyness.
/// Some layouts encode over-capacity as up to 2x.
const OVER_CAPACITY_CEILING: u32 = 200;

/// Queue/wait vocabulary. One hit per text fragment, however many
/// terms it contains.
const QUEUE_TERMS: [&str; 16] = [
    "웨이팅",
    "웨이팅줄",
    "대기",
    "대기줄",
    "줄서",
    "줄 섰",
    "기다리",
    "기다림",
    "오픈런",
    "오픈 런",
    "waiting",
    "wait time",
    "waited",
    "queue",
    "in line",
    "already packed",
];

/// Compiled matching tables for busyness and queue phrases.
#[derive(Debug, Clone)]
pub struct Lexicon {
    percent_patterns: Vec<Regex>,
    qualitative_patterns: Vec<(Regex, f64)>,
    queue_pattern: Regex,
}

impl Lexicon {
    pub fn new() -> Self {
        let percent_patterns = vec![
            // "Live busyness: 73%"
            Regex::new(r"(?i)live\s*(?:busyness|activity)\s*[:\-]?\s*(\d{1,3})\s*%").unwrap(),
            // "현재 혼잡도: 73%"
            Regex::new(r"현재\s*혼잡도\s*[:\-]?\s*(\d{1,3})\s*%").unwrap(),
            // "73% busy" / "73% 혼잡"
            Regex::new(r"(?i)(\d{1,3})\s*%\s*(?:busy|혼잡)").unwrap(),
        ];

        // Ordered: specific phrases before the generic busy pattern, so
        // "busier than usual" and "약간 혼잡" are not shadowed by the
        // bare 혼잡 match. The values are calibration constants.
        let qualitative_patterns = vec![
            (
                Regex::new(r"(?i)busier than usual|평소보다 붐빔").unwrap(),
                0.70,
            ),
            (
                Regex::new(r"보통 수준|약간\s*혼잡|보통").unwrap(),
                0.55,
            ),
            (
                Regex::new(r"(?i)(?:매우\s*)?혼잡|very busy").unwrap(),
                0.85,
            ),
            (
                Regex::new(r"(?i)여유|한산|not\s+(?:too\s+)?busy|quieter?\s+than\s+usual").unwrap(),
                0.25,
            ),
        ];

        let escaped: Vec<String> = QUEUE_TERMS.iter().map(|t| regex::escape(t)).collect();
        let queue_pattern = Regex::new(&format!("(?i){}", escaped.join("|"))).unwrap();

        Self {
            percent_patterns,
            qualitative_patterns,
            queue_pattern,
        }
    }

    /// Extract a busyness percentage from text.
    ///
    /// The first pattern that matches wins. Values above 100 are
    /// clamped to 100; values above the over-capacity ceiling are
    /// rejected as noise and scanning continues.
    pub fn match_percentage(&self, text: &str) -> Option<u32> {
        for pattern in &self.percent_patterns {
            if let Some(caps) = pattern.captures(text) {
                if let Ok(value) = caps[1].parse::<u32>() {
                    if value <= OVER_CAPACITY_CEILING {
                        return Some(value.min(100));
                    }
                }
            }
        }
        None
    }

    /// Map a coarse busyness phrase to its fixed estimate.
    pub fn match_qualitative(&self, text: &str) -> Option<f64> {
        for (pattern, value) in &self.qualitative_patterns {
            if pattern.is_match(text) {
                return Some(*value);
            }
        }
        None
    }

    /// Whether a text fragment contains at least one queue/wait term.
    pub fn has_queue_term(&self, text: &str) -> bool {
        self.queue_pattern.is_match(text)
    }

    /// Count fragments containing at least one queue/wait term.
    pub fn count_queue_hits<S: AsRef<str>>(&self, texts: &[S]) -> usize {
        texts
            .iter()
            .filter(|t| self.has_queue_term(t.as_ref()))
            .count()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_percentage_live_busyness() {
        let lexicon = Lexicon::new();
        assert_eq!(lexicon.match_percentage("Live busyness: 73%"), Some(73));
        assert_eq!(lexicon.match_percentage("Live activity - 40 %"), Some(40));
    }

    #[test]
    fn test_match_percentage_korean() {
        let lexicon = Lexicon::new();
        assert_eq!(lexicon.match_percentage("현재 혼잡도: 62%"), Some(62));
        assert_eq!(lexicon.match_percentage("85% 혼잡"), Some(85));
    }

    #[test]
    fn test_match_percentage_suffix_form() {
        let lexicon = Lexicon::new();
        assert_eq!(lexicon.match_percentage("usually 55% busy at 6 PM"), Some(55));
    }

    #[test]
    fn test_match_percentage_clamps_over_100() {
        let lexicon = Lexicon::new();
        assert_eq!(lexicon.match_percentage("150% busy"), Some(100));
    }

    #[test]
    fn test_match_percentage_rejects_beyond_ceiling() {
        let lexicon = Lexicon::new();
        assert_eq!(lexicon.match_percentage("999% busy"), None);
    }

    #[test]
    fn test_match_percentage_no_match() {
        let lexicon = Lexicon::new();
        assert_eq!(lexicon.match_percentage("open until 10 PM"), None);
    }

    #[test]
    fn test_match_qualitative_fixed_values() {
        let lexicon = Lexicon::new();
        assert_eq!(lexicon.match_qualitative("busier than usual"), Some(0.70));
        assert_eq!(lexicon.match_qualitative("평소보다 붐빔"), Some(0.70));
        assert_eq!(lexicon.match_qualitative("very busy right now"), Some(0.85));
        assert_eq!(lexicon.match_qualitative("매우 혼잡"), Some(0.85));
        assert_eq!(lexicon.match_qualitative("보통 수준"), Some(0.55));
        assert_eq!(lexicon.match_qualitative("not too busy"), Some(0.25));
        assert_eq!(lexicon.match_qualitative("한산"), Some(0.25));
    }

    #[test]
    fn test_match_qualitative_specific_beats_generic() {
        let lexicon = Lexicon::new();
        // Contains 혼잡, but the moderate phrasing must win.
        assert_eq!(lexicon.match_qualitative("약간 혼잡"), Some(0.55));
    }

    #[test]
    fn test_match_qualitative_unknown_phrase() {
        let lexicon = Lexicon::new();
        assert_eq!(lexicon.match_qualitative("lovely atmosphere"), None);
    }

    #[test]
    fn test_count_queue_hits_once_per_fragment() {
        let lexicon = Lexicon::new();
        let texts = [
            "한시간 웨이팅하고 대기줄이 길었어요", // two terms, one hit
            "분위기가 좋아요",
            "we waited in line for 40 minutes", // two terms, one hit
        ];
        assert_eq!(lexicon.count_queue_hits(&texts), 2);
    }

    #[test]
    fn test_count_queue_hits_empty() {
        let lexicon = Lexicon::new();
        let texts: [&str; 0] = [];
        assert_eq!(lexicon.count_queue_hits(&texts), 0);
    }
}
