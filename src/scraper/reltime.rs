//! Normalization of review timestamps to absolute instants.
//!
//! Review timestamps come as human-relative strings ("3시간 전",
//! "2 days ago", "어제") or occasionally as absolute dates. Anything
//! unrecognized resolves to `None`; callers must exclude those
//! fragments from time-window filters rather than treat them as now.

use chrono::{DateTime, Duration, TimeZone, Utc};
use regex::Regex;

/// Compiled timestamp patterns.
#[derive(Debug, Clone)]
pub struct TimeNormalizer {
    relative_kr: Regex,
    relative_en: Regex,
    absolute: Regex,
}

impl TimeNormalizer {
    pub fn new() -> Self {
        Self {
            relative_kr: Regex::new(r"(\d+)\s*(분|시간|일|주|개월|년)\s*전").unwrap(),
            relative_en: Regex::new(r"(?i)(\d+)\s*(minute|min|hour|day|week|month|year)s?\s+ago")
                .unwrap(),
            // "2025.08.12", "2025년 8월 12일", "2025-08-12"
            absolute: Regex::new(r"(\d{4})\s*[.년/\-]\s*(\d{1,2})\s*[.월/\-]\s*(\d{1,2})").unwrap(),
        }
    }

    /// Parse a relative or absolute timestamp string.
    ///
    /// Months count as 30 days and years as 365; review windows are
    /// hours wide, so the approximation never affects a filter.
    pub fn parse(&self, text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let lowered = text.to_lowercase();
        if text.contains("방금") || text.contains("오늘") || lowered.contains("just now") || lowered.contains("today") {
            return Some(now);
        }
        if text.contains("어제") || lowered.contains("yesterday") {
            return Some(now - Duration::days(1));
        }

        if let Some(caps) = self.relative_kr.captures(text) {
            let amount: i64 = caps[1].parse().ok()?;
            let delta = match &caps[2] {
                "분" => Duration::minutes(amount),
                "시간" => Duration::hours(amount),
                "일" => Duration::days(amount),
                "주" => Duration::weeks(amount),
                "개월" => Duration::days(amount * 30),
                "년" => Duration::days(amount * 365),
                _ => return None,
            };
            return Some(now - delta);
        }

        if let Some(caps) = self.relative_en.captures(text) {
            let amount: i64 = caps[1].parse().ok()?;
            let delta = match caps[2].to_lowercase().as_str() {
                "minute" | "min" => Duration::minutes(amount),
                "hour" => Duration::hours(amount),
                "day" => Duration::days(amount),
                "week" => Duration::weeks(amount),
                "month" => Duration::days(amount * 30),
                "year" => Duration::days(amount * 365),
                _ => return None,
            };
            return Some(now - delta);
        }

        if let Some(caps) = self.absolute.captures(text) {
            let year: i32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let day: u32 = caps[3].parse().ok()?;
            return Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single();
        }

        None
    }
}

impl Default for TimeNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_just_now_and_today() {
        let tn = TimeNormalizer::new();
        assert_eq!(tn.parse("방금 전", now()), Some(now()));
        assert_eq!(tn.parse("오늘", now()), Some(now()));
        assert_eq!(tn.parse("Today", now()), Some(now()));
        assert_eq!(tn.parse("just now", now()), Some(now()));
    }

    #[test]
    fn test_yesterday() {
        let tn = TimeNormalizer::new();
        assert_eq!(tn.parse("어제", now()), Some(now() - Duration::days(1)));
        assert_eq!(tn.parse("yesterday", now()), Some(now() - Duration::days(1)));
    }

    #[test]
    fn test_korean_relative_forms() {
        let tn = TimeNormalizer::new();
        assert_eq!(tn.parse("5분 전", now()), Some(now() - Duration::minutes(5)));
        assert_eq!(tn.parse("3시간 전", now()), Some(now() - Duration::hours(3)));
        assert_eq!(tn.parse("2일 전", now()), Some(now() - Duration::days(2)));
        assert_eq!(tn.parse("1주 전", now()), Some(now() - Duration::weeks(1)));
        assert_eq!(tn.parse("2개월 전", now()), Some(now() - Duration::days(60)));
        assert_eq!(tn.parse("1년 전", now()), Some(now() - Duration::days(365)));
    }

    #[test]
    fn test_english_relative_forms() {
        let tn = TimeNormalizer::new();
        assert_eq!(tn.parse("3 hours ago", now()), Some(now() - Duration::hours(3)));
        assert_eq!(tn.parse("a review from 2 days ago", now()), Some(now() - Duration::days(2)));
        assert_eq!(tn.parse("4 weeks ago", now()), Some(now() - Duration::weeks(4)));
        assert_eq!(tn.parse("1 month ago", now()), Some(now() - Duration::days(30)));
    }

    #[test]
    fn test_absolute_dates() {
        let tn = TimeNormalizer::new();
        let expected = Utc.with_ymd_and_hms(2025, 8, 12, 0, 0, 0).unwrap();
        assert_eq!(tn.parse("2025.08.12.", now()), Some(expected));
        assert_eq!(tn.parse("2025년 8월 12일", now()), Some(expected));
        assert_eq!(tn.parse("2025-08-12", now()), Some(expected));
    }

    #[test]
    fn test_invalid_calendar_date() {
        let tn = TimeNormalizer::new();
        assert_eq!(tn.parse("2025.13.40", now()), None);
    }

    #[test]
    fn test_unrecognized_returns_none() {
        let tn = TimeNormalizer::new();
        assert_eq!(tn.parse("gibberish", now()), None);
        assert_eq!(tn.parse("", now()), None);
        assert_eq!(tn.parse("리뷰 4개", now()), None);
    }
}
