use std::str::FromStr;

use crate::history::DailyEntry;
use crate::CoreError;

/// A single plottable series of the historical dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    GithubCommits,
    TwitterFollowers,
    YoutubeSubscribers,
    BlueskyFollowers,
    TotalFollowers,
    Ratio,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::GithubCommits,
        Metric::TwitterFollowers,
        Metric::YoutubeSubscribers,
        Metric::BlueskyFollowers,
        Metric::TotalFollowers,
        Metric::Ratio,
    ];

    /// Field name as it appears in the history JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::GithubCommits => "github_commits",
            Metric::TwitterFollowers => "twitter_followers",
            Metric::YoutubeSubscribers => "youtube_subscribers",
            Metric::BlueskyFollowers => "bluesky_followers",
            Metric::TotalFollowers => "total_followers",
            Metric::Ratio => "ratio",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Metric::GithubCommits => "GitHub Commits",
            Metric::TwitterFollowers => "X/Twitter Followers",
            Metric::YoutubeSubscribers => "YouTube Subscribers",
            Metric::BlueskyFollowers => "Bluesky Followers",
            Metric::TotalFollowers => "Total Followers",
            Metric::Ratio => "Commits per Follower",
        }
    }

    /// Accent color used by the dashboard and the SVG chart.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Metric::GithubCommits => "#238636",
            Metric::TwitterFollowers => "#1d9bf0",
            Metric::YoutubeSubscribers => "#ff0000",
            Metric::BlueskyFollowers => "#0085ff",
            Metric::TotalFollowers => "#a371f7",
            Metric::Ratio => "#f0883e",
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(self, entry: &DailyEntry) -> f64 {
        match self {
            Metric::GithubCommits => entry.github_commits as f64,
            Metric::TwitterFollowers => entry.twitter_followers as f64,
            Metric::YoutubeSubscribers => entry.youtube_subscribers as f64,
            Metric::BlueskyFollowers => entry.bluesky_followers as f64,
            Metric::TotalFollowers => entry.total_followers as f64,
            Metric::Ratio => entry.ratio,
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| CoreError::UnknownMetric(s.to_string()))
    }
}
