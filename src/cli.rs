//! CLI commands for venuepulse.
//!
//! Reads a venue registry file (JSON array of venue descriptors) and
//! prints signal records as JSON for downstream collectors.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::AppConfig;
use crate::scraper::Orchestrator;
use crate::types::{ReviewSource, Signal, VenueDescriptor};

#[derive(Parser)]
#[command(name = "venuepulse")]
#[command(version, about = "Venue activity signals from map pages", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape the live busyness estimate for venues
    Busyness {
        /// Path to the venues JSON file
        #[arg(value_name = "VENUES")]
        venues: PathBuf,

        /// Only scrape this venue id
        #[arg(short, long)]
        venue_id: Option<String>,

        /// Bypass the signal cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Count queue/wait mentions in recent reviews
    QueueMentions {
        /// Path to the venues JSON file
        #[arg(value_name = "VENUES")]
        venues: PathBuf,

        /// Only scrape this venue id
        #[arg(short, long)]
        venue_id: Option<String>,

        /// Review surface to mine (google, naver)
        #[arg(short, long, default_value = "google")]
        source: String,

        /// Time window in hours
        #[arg(short, long, default_value_t = 72)]
        window_hours: u32,
    },

    /// Scrape busyness for all venues in concurrent groups
    Batch {
        /// Path to the venues JSON file
        #[arg(value_name = "VENUES")]
        venues: PathBuf,

        /// Venues rendered concurrently per group
        #[arg(short, long, default_value_t = 3)]
        concurrency: usize,
    },

    /// Probe every venue once and report the ones returning no data
    Check {
        /// Path to the venues JSON file
        #[arg(value_name = "VENUES")]
        venues: PathBuf,
    },
}

/// Scrape busyness for the selected venues.
pub async fn run_busyness(
    venues_path: PathBuf,
    venue_id: Option<String>,
    no_cache: bool,
) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let orchestrator = Orchestrator::new(&config);
    let venues = load_venues(&venues_path, venue_id.as_deref())?;

    eprintln!("Scraping busyness for {} venue(s)", venues.len());

    let mut signals = Vec::new();
    for venue in &venues {
        if let Some(signal) = orchestrator.fetch_busyness(venue, !no_cache).await {
            signals.push(Signal::Busyness(signal));
        }
    }

    println!("{}", serde_json::to_string_pretty(&signals)?);
    Ok(())
}

/// Count queue mentions for the selected venues.
pub async fn run_queue_mentions(
    venues_path: PathBuf,
    venue_id: Option<String>,
    source: String,
    window_hours: u32,
) -> anyhow::Result<()> {
    let source = ReviewSource::from_str(&source).map_err(|e| anyhow::anyhow!(e))?;
    let config = AppConfig::load()?;
    let orchestrator = Orchestrator::new(&config);
    let venues = load_venues(&venues_path, venue_id.as_deref())?;

    eprintln!(
        "Mining {} reviews ({}h window) for {} venue(s)",
        source,
        window_hours,
        venues.len()
    );

    let mut signals = Vec::new();
    for venue in &venues {
        if let Some(signal) = orchestrator
            .fetch_queue_mentions(venue, source, window_hours)
            .await
        {
            signals.push(Signal::Queue(signal));
        }
    }

    println!("{}", serde_json::to_string_pretty(&signals)?);
    Ok(())
}

/// Scrape all venues in concurrent groups.
pub async fn run_batch(venues_path: PathBuf, concurrency: usize) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let orchestrator = Orchestrator::new(&config);
    let venues = load_venues(&venues_path, None)?;

    eprintln!(
        "Batch scraping {} venue(s), {} at a time",
        venues.len(),
        concurrency
    );

    let signals = orchestrator.scrape_venues_batch(&venues, concurrency).await;

    eprintln!("{}/{} venues yielded data", signals.len(), venues.len());
    println!("{}", serde_json::to_string_pretty(&signals)?);
    Ok(())
}

/// Probe every venue once and report availability.
pub async fn run_check(venues_path: PathBuf) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let orchestrator = Orchestrator::new(&config);
    let venues = load_venues(&venues_path, None)?;

    eprintln!("Checking availability of {} venue(s)", venues.len());

    let report = orchestrator.check_availability(&venues).await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Read the venue registry file, optionally narrowed to one venue.
fn load_venues(path: &PathBuf, venue_id: Option<&str>) -> anyhow::Result<Vec<VenueDescriptor>> {
    let raw = std::fs::read_to_string(path)?;
    let mut venues: Vec<VenueDescriptor> = serde_json::from_str(&raw)?;

    if let Some(id) = venue_id {
        venues.retain(|v| v.venue_id == id);
        if venues.is_empty() {
            anyhow::bail!("venue id {} not found in {}", id, path.display());
        }
    }

    Ok(venues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_venues_filters_by_id() {
        let dir = std::env::temp_dir();
        let path = dir.join("venuepulse_test_venues.json");
        std::fs::write(
            &path,
            r#"[
  {"venue_id": "onion", "page_url": "https://maps.google.com/?cid=1"},
  {"venue_id": "blue_bottle", "place_id": "ChIJabc"}
]"#,
        )
        .unwrap();

        let all = load_venues(&path, None).unwrap();
        assert_eq!(all.len(), 2);

        let one = load_venues(&path, Some("onion")).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].venue_id, "onion");

        assert!(load_venues(&path, Some("missing")).is_err());

        let _ = std::fs::remove_file(&path);
    }
}
