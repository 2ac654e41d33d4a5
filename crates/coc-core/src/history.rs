//! The persisted time series of daily snapshots.
//!
//! ## On-disk shape
//!
//! ```json
//! { "data": [ { "date": "2026-01-01", "github_commits": 3, "twitter_followers": 35,
//!               "youtube_subscribers": 10, "bluesky_followers": 4,
//!               "total_followers": 49, "ratio": 0.1,
//!               "last_updated": "2026-01-01T09:30:00-08:00" } ] }
//! ```
//!
//! Files written before YouTube and Bluesky were tracked lack those fields
//! (and `total_followers`); they deserialize as 0 and [`HistoricalDataset::normalize`]
//! recomputes the derived fields.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::metric::Metric;
use crate::CoreError;

/// Commits-per-follower multiplier, rounded to one decimal.
///
/// The follower count is floored at 1 so a brand-new account never divides
/// by zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_ratio(commits: u64, total_followers: u64) -> f64 {
    let followers = total_followers.max(1) as f64;
    ((commits as f64 / followers) * 10.0).round() / 10.0
}

/// The four raw counters one run produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub github_commits: u64,
    pub twitter_followers: u64,
    pub youtube_subscribers: u64,
    pub bluesky_followers: u64,
}

impl Counts {
    #[must_use]
    pub fn total_followers(&self) -> u64 {
        self.twitter_followers
            .saturating_add(self.youtube_subscribers)
            .saturating_add(self.bluesky_followers)
    }
}

/// Per-provider results of the current run. `None` means the fetch failed
/// or the provider is not configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchedCounts {
    pub github_commits: Option<u64>,
    pub twitter_followers: Option<u64>,
    pub youtube_subscribers: Option<u64>,
    pub bluesky_followers: Option<u64>,
}

/// Fill every missing counter from `previous`, or 0 when there is no
/// previous entry.
///
/// Returns the resolved counts and the metrics that were not fetched this run.
#[must_use]
pub fn resolve_counts(
    fetched: &FetchedCounts,
    previous: Option<&DailyEntry>,
) -> (Counts, Vec<Metric>) {
    let mut fell_back = Vec::new();
    let mut pick = |value: Option<u64>, metric: Metric, prior: fn(&DailyEntry) -> u64| {
        value.unwrap_or_else(|| {
            fell_back.push(metric);
            previous.map_or(0, prior)
        })
    };

    let counts = Counts {
        github_commits: pick(fetched.github_commits, Metric::GithubCommits, |e| {
            e.github_commits
        }),
        twitter_followers: pick(fetched.twitter_followers, Metric::TwitterFollowers, |e| {
            e.twitter_followers
        }),
        youtube_subscribers: pick(
            fetched.youtube_subscribers,
            Metric::YoutubeSubscribers,
            |e| e.youtube_subscribers,
        ),
        bluesky_followers: pick(fetched.bluesky_followers, Metric::BlueskyFollowers, |e| {
            e.bluesky_followers
        }),
    };

    (counts, fell_back)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub github_commits: u64,
    #[serde(default)]
    pub twitter_followers: u64,
    #[serde(default)]
    pub youtube_subscribers: u64,
    #[serde(default)]
    pub bluesky_followers: u64,
    #[serde(default)]
    pub total_followers: u64,
    #[serde(default)]
    pub ratio: f64,
    pub last_updated: DateTime<FixedOffset>,
}

impl DailyEntry {
    #[must_use]
    pub fn new(date: NaiveDate, counts: Counts, last_updated: DateTime<FixedOffset>) -> Self {
        let mut entry = Self {
            date,
            github_commits: counts.github_commits,
            twitter_followers: counts.twitter_followers,
            youtube_subscribers: counts.youtube_subscribers,
            bluesky_followers: counts.bluesky_followers,
            total_followers: 0,
            ratio: 0.0,
            last_updated,
        };
        entry.recompute();
        entry
    }

    #[must_use]
    pub fn counts(&self) -> Counts {
        Counts {
            github_commits: self.github_commits,
            twitter_followers: self.twitter_followers,
            youtube_subscribers: self.youtube_subscribers,
            bluesky_followers: self.bluesky_followers,
        }
    }

    /// Re-derive `total_followers` and `ratio` from the raw counters.
    pub fn recompute(&mut self) {
        self.total_followers = self.counts().total_followers();
        self.ratio = compute_ratio(self.github_commits, self.total_followers);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDataset {
    #[serde(default)]
    pub data: Vec<DailyEntry>,
}

impl HistoricalDataset {
    /// Parse stored JSON and normalize it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if the bytes are not a valid dataset.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        let mut dataset: Self = serde_json::from_slice(bytes)?;
        dataset.normalize();
        Ok(dataset)
    }

    /// Serialize as indented JSON, the format the dashboard embeds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[DailyEntry] {
        &self.data
    }

    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<&DailyEntry> {
        self.data
            .binary_search_by_key(&date, |e| e.date)
            .ok()
            .map(|idx| &self.data[idx])
    }

    #[must_use]
    pub fn latest(&self) -> Option<&DailyEntry> {
        self.data.last()
    }

    /// Most recent entry strictly before `date`.
    #[must_use]
    pub fn latest_before(&self, date: NaiveDate) -> Option<&DailyEntry> {
        self.data.iter().rev().find(|e| e.date < date)
    }

    /// The entry whose counters fill in for failed fetches on `date`.
    ///
    /// This is the latest entry. Its commit count is reset to 0 when it
    /// comes from an earlier year, since commits are cumulative per year.
    #[must_use]
    pub fn fallback_for(&self, date: NaiveDate) -> Option<DailyEntry> {
        let mut previous = self.latest()?.clone();
        if previous.date.year() < date.year() {
            previous.github_commits = 0;
            previous.recompute();
        }
        Some(previous)
    }

    /// Insert `entry`, replacing any existing entry for the same date.
    /// The series stays sorted.
    pub fn upsert(&mut self, mut entry: DailyEntry) {
        entry.recompute();
        match self.data.binary_search_by_key(&entry.date, |e| e.date) {
            Ok(idx) => self.data[idx] = entry,
            Err(idx) => self.data.insert(idx, entry),
        }
    }

    /// Sort by date, keep the last entry written for any repeated date, and
    /// recompute the derived fields.
    pub fn normalize(&mut self) {
        self.data.sort_by_key(|e| e.date);
        let mut deduped: Vec<DailyEntry> = Vec::with_capacity(self.data.len());
        for mut entry in self.data.drain(..) {
            entry.recompute();
            match deduped.last_mut() {
                Some(last) if last.date == entry.date => *last = entry,
                _ => deduped.push(entry),
            }
        }
        self.data = deduped;
    }

    /// Entries dated within `year`.
    pub fn for_year(&self, year: i32) -> impl Iterator<Item = &DailyEntry> + '_ {
        self.data.iter().filter(move |e| e.date.year() == year)
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
