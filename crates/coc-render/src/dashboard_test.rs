use chrono::{FixedOffset, NaiveDate, TimeZone};
use coc_core::{Counts, DailyEntry, HistoricalDataset};

use super::*;

fn entry(commits: u64, twitter: u64, youtube: u64, bluesky: u64) -> DailyEntry {
    let pdt = FixedOffset::west_opt(7 * 3600).unwrap();
    DailyEntry::new(
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap(),
        Counts {
            github_commits: commits,
            twitter_followers: twitter,
            youtube_subscribers: youtube,
            bluesky_followers: bluesky,
        },
        pdt.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap(),
    )
}

fn render(current: &DailyEntry, profiles: Profiles<'_>) -> String {
    let mut history = HistoricalDataset::default();
    history.upsert(current.clone());
    render_dashboard(&DashboardContext {
        current,
        history: &history,
        profiles,
        last_updated: "October 15, 2026 at 09:30 AM PDT",
    })
    .unwrap()
}

fn profiles() -> Profiles<'static> {
    Profiles {
        github_username: "octocat",
        twitter_username: Some("octo"),
        youtube_channel_id: None,
        bluesky_handle: Some("octo.bsky.social"),
    }
}

#[test]
fn ratio_text_always_shows_one_decimal() {
    assert_eq!(
        ratio_text(2.0, 2026),
        "I have 2.0x as many commits in 2026 as followers"
    );
    assert_eq!(format_ratio(0.3), "0.3");
    assert_eq!(format_ratio(12.5), "12.5");
}

#[test]
fn subtitle_flips_above_one() {
    assert_eq!(
        ratio_subtitle(1.1),
        "Focusing more on building than on social media presence!"
    );
    assert_eq!(ratio_subtitle(1.0), "I need to build more...");
    assert_eq!(ratio_subtitle(0.2), "I need to build more...");
}

#[test]
fn dashboard_shows_all_counts_and_ratio() {
    let current = entry(150, 40, 20, 15);
    let html = render(&current, profiles());

    assert!(html.contains(r#"<div class="card-value">150</div>"#));
    assert!(html.contains(r#"<div class="card-value">40</div>"#));
    assert!(html.contains(r#"<div class="card-value">20</div>"#));
    assert!(html.contains(r#"<div class="card-value">15</div>"#));
    assert!(html.contains("I have 2.0x as many commits in 2026 as followers"));
    assert!(html.contains("Focusing more on building than on social media presence!"));
    assert!(html.contains("Last updated: <span id=\"last-updated\">October 15, 2026 at 09:30 AM PDT</span>"));
    assert!(!html.contains("{{"), "unfilled placeholder left in output");
}

#[test]
fn footer_links_only_configured_profiles() {
    let html = render(&entry(1, 1, 0, 0), profiles());
    assert!(html.contains(r#"href="https://github.com/octocat""#));
    assert!(html.contains(r#"href="https://x.com/octo""#));
    assert!(html.contains(r#"href="https://bsky.app/profile/octo.bsky.social""#));
    assert!(!html.contains("youtube.com/channel"));
}

#[test]
fn hostile_usernames_are_escaped() {
    let hostile = Profiles {
        github_username: "\"><script>alert(1)</script>",
        ..profiles()
    };
    let html = render(&entry(1, 1, 0, 0), hostile);
    assert!(!html.contains("<script>alert(1)</script>"));
    assert!(html.contains("&lt;script&gt;"));
}

#[test]
fn embedded_history_is_script_safe_json() {
    let html = render(&entry(3, 10, 0, 0), profiles());
    let start = html.find("const historicalData = ").unwrap() + "const historicalData = ".len();
    let end = start + html[start..].find(";\n").unwrap();
    let value: serde_json::Value = serde_json::from_str(&html[start..end]).unwrap();
    assert_eq!(value["data"][0]["date"], "2026-10-15");
    assert_eq!(value["data"][0]["github_commits"], 3);
}

#[test]
fn fill_does_not_rescan_inserted_values() {
    let out = fill(
        "a {{x}} b {{ y }}",
        &[("x", "{{y}}".to_owned()), ("y", "Y".to_owned())],
    )
    .unwrap();
    assert_eq!(out, "a {{y}} b Y");
}

#[test]
fn fill_reports_unknown_and_unclosed_placeholders() {
    assert!(matches!(
        fill("{{missing}}", &[]),
        Err(RenderError::UnknownPlaceholder(name)) if name == "missing"
    ));
    assert!(matches!(
        fill("ok {{oops", &[]),
        Err(RenderError::UnclosedPlaceholder(3))
    ));
}
