//! Rebuilds this year's series from GitHub's per-day commit history.
//!
//! Follower counts have no history, so every rebuilt day carries today's
//! social values.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use coc_core::clock::{local_now, to_fixed, year_start_utc};
use coc_core::{resolve_counts, AppConfig, Counts, DailyEntry, HistoricalDataset};
use coc_store::{load_history, save_history, ObjectStore};

use crate::pipeline::{fetch_social_counts, Providers};

/// Backfills from January 1st through today.
///
/// The rebuilt series is written to `output`, merged into stored history
/// with `upload`, or printed to stdout when neither is given.
///
/// # Errors
///
/// GitHub repository listing, storage, or file write failures.
pub(crate) async fn run_backfill(
    config: &AppConfig,
    output: Option<&Path>,
    upload: bool,
) -> anyhow::Result<()> {
    let providers = Providers::from_app_config(config)?;
    let store = ObjectStore::from_app_config(config)?;
    let tz = config.timezone;
    let now = local_now(tz);
    let since = year_start_utc(now.year(), tz)?;

    let daily = providers
        .github
        .daily_commit_counts(since, now.with_timezone(&Utc), tz)
        .await
        .context("fetching daily commit counts")?;
    if !daily.failed_repos.is_empty() {
        tracing::warn!(
            count = daily.failed_repos.len(),
            repos = ?daily.failed_repos,
            "backfill skipped repositories"
        );
    }

    let mut history = load_history(&store, &config.history_key, &config.history_backup_key).await?;
    let social = fetch_social_counts(&providers).await;
    let previous = history.fallback_for(now.date_naive());
    let (counts, _) = resolve_counts(&social.counts, previous.as_ref());

    let rebuilt = build_series(&daily.counts, counts, to_fixed(&now));
    tracing::info!(
        days = rebuilt.len(),
        repos_scanned = daily.repos_scanned,
        github_commits = rebuilt.latest().map_or(0, |e| e.github_commits),
        "rebuilt series"
    );

    if let Some(path) = output {
        tokio::fs::write(path, rebuilt.to_json_pretty()?)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Backfilled history written to {}", path.display());
    }

    if upload {
        merge_into(&mut history, &rebuilt);
        save_history(&store, &history, &config.history_key, &config.history_backup_key).await?;
        println!(
            "Merged {} days into {} ({} entries total)",
            rebuilt.len(),
            store.describe(),
            history.len()
        );
    }

    if output.is_none() && !upload {
        println!("{}", rebuilt.to_json_pretty()?);
    }

    Ok(())
}

/// Turns per-day commit counts into cumulative daily entries.
///
/// Only `github_commits` varies; the social counters come from `social`.
pub(crate) fn build_series(
    daily: &BTreeMap<NaiveDate, u64>,
    social: Counts,
    last_updated: DateTime<FixedOffset>,
) -> HistoricalDataset {
    let mut dataset = HistoricalDataset::default();
    let mut cumulative = 0;
    for (date, count) in daily {
        cumulative += count;
        let counts = Counts {
            github_commits: cumulative,
            ..social
        };
        dataset.upsert(DailyEntry::new(*date, counts, last_updated));
    }
    dataset
}

/// Merges a rebuilt series into stored history.
///
/// Stored days keep their recorded social counts and only take the rebuilt
/// commit total. Days missing from storage are inserted whole.
pub(crate) fn merge_into(history: &mut HistoricalDataset, rebuilt: &HistoricalDataset) {
    for entry in rebuilt.entries() {
        match history.data.iter_mut().find(|stored| stored.date == entry.date) {
            Some(stored) => {
                stored.github_commits = entry.github_commits;
                stored.recompute();
            }
            None => history.upsert(entry.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn stamp() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2026-01-04T12:00:00-08:00").unwrap()
    }

    #[test]
    fn series_is_cumulative_with_constant_social_counts() {
        let daily: BTreeMap<NaiveDate, u64> =
            [(day(1), 2), (day(2), 0), (day(3), 5)].into_iter().collect();
        let social = Counts {
            github_commits: 999,
            twitter_followers: 3,
            youtube_subscribers: 1,
            bluesky_followers: 0,
        };

        let series = build_series(&daily, social, stamp());

        let commits: Vec<u64> = series.entries().iter().map(|e| e.github_commits).collect();
        assert_eq!(commits, vec![2, 2, 7]);
        assert!(series.entries().iter().all(|e| e.total_followers == 4));
        assert!((series.entries()[2].ratio - 1.8).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_history_builds_empty_series() {
        let series = build_series(&BTreeMap::new(), Counts::default(), stamp());
        assert!(series.is_empty());
    }

    #[test]
    fn merge_keeps_stored_social_counts() {
        let stored_counts = Counts {
            github_commits: 1,
            twitter_followers: 40,
            youtube_subscribers: 2,
            bluesky_followers: 3,
        };
        let mut history = HistoricalDataset {
            data: vec![DailyEntry::new(day(1), stored_counts, stamp())],
        };
        let daily: BTreeMap<NaiveDate, u64> = [(day(1), 4), (day(2), 6)].into_iter().collect();
        let social = Counts {
            github_commits: 0,
            twitter_followers: 500,
            youtube_subscribers: 0,
            bluesky_followers: 0,
        };
        let rebuilt = build_series(&daily, social, stamp());

        merge_into(&mut history, &rebuilt);

        assert_eq!(history.len(), 2);
        let jan1 = history.get(day(1)).unwrap();
        assert_eq!(jan1.github_commits, 4);
        assert_eq!(jan1.twitter_followers, 40);
        assert_eq!(jan1.total_followers, 45);
        assert!((jan1.ratio - 0.1).abs() < f64::EPSILON);
        let jan2 = history.get(day(2)).unwrap();
        assert_eq!(jan2.github_commits, 10);
        assert_eq!(jan2.twitter_followers, 500);
    }
}
