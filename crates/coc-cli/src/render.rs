//! Local dashboard rendering for previewing the template.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use coc_core::clock::{format_last_updated, local_now, to_fixed};
use coc_core::{AppConfig, Counts, DailyEntry, HistoricalDataset};
use coc_render::{render_dashboard, DashboardContext, Profiles};

use crate::pipeline;

const SAMPLE_DAYS: u64 = 30;

const SAMPLE_PROFILES: Profiles<'static> = Profiles {
    github_username: "octocat",
    twitter_username: Some("octocat"),
    youtube_channel_id: Some("UCxxxxxxxxxxxxxxxxxxxxxx"),
    bluesky_handle: Some("octocat.bsky.social"),
};

/// Renders `history` (or a sample series) to `output`.
///
/// Works without credentials; profile links fall back to placeholders.
///
/// # Errors
///
/// Unreadable or empty history, or a failed write.
pub(crate) async fn run_render(
    config: Option<&AppConfig>,
    history: Option<&Path>,
    output: &Path,
) -> anyhow::Result<()> {
    let tz = timezone(config);
    let now = local_now(tz);

    let dataset = match history {
        Some(path) => read_history_file(path).await?,
        None => sample_history(now.date_naive(), to_fixed(&now)),
    };
    let current = dataset
        .latest()
        .context("history has no entries to render")?;

    let last_updated = format_last_updated(&now);
    let html = render_dashboard(&DashboardContext {
        current,
        history: &dataset,
        profiles: config.map_or(SAMPLE_PROFILES, pipeline::profiles),
        last_updated: &last_updated,
    })?;

    tokio::fs::write(output, html)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Dashboard written to {}", output.display());
    Ok(())
}

pub(crate) fn timezone(config: Option<&AppConfig>) -> Tz {
    config.map_or(chrono_tz::America::Los_Angeles, |c| c.timezone)
}

pub(crate) async fn read_history_file(path: &Path) -> anyhow::Result<HistoricalDataset> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    HistoricalDataset::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
}

/// Thirty days of steadily growing counters ending on `today`.
fn sample_history(today: NaiveDate, last_updated: DateTime<FixedOffset>) -> HistoricalDataset {
    let mut dataset = HistoricalDataset::default();
    for offset in 0..SAMPLE_DAYS {
        let Some(date) = today.checked_sub_days(Days::new(SAMPLE_DAYS - 1 - offset)) else {
            continue;
        };
        let day = offset + 1;
        let counts = Counts {
            github_commits: 250 * day / SAMPLE_DAYS,
            twitter_followers: 90 + day / 3,
            youtube_subscribers: 20 + day / 6,
            bluesky_followers: 10 + day / 15,
        };
        dataset.upsert(DailyEntry::new(date, counts, last_updated));
    }
    dataset
}
