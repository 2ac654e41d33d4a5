//! The public dashboard page.

use chrono::Datelike;
use coc_core::{DailyEntry, HistoricalDataset};

use crate::error::RenderError;
use crate::escape;

const TEMPLATE: &str = include_str!("../templates/dashboard.html");

/// Account identifiers shown as profile links in the footer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Profiles<'a> {
    pub github_username: &'a str,
    pub twitter_username: Option<&'a str>,
    pub youtube_channel_id: Option<&'a str>,
    pub bluesky_handle: Option<&'a str>,
}

pub struct DashboardContext<'a> {
    /// The entry whose counts fill the stat cards, normally today's.
    pub current: &'a DailyEntry,
    pub history: &'a HistoricalDataset,
    pub profiles: Profiles<'a>,
    /// Preformatted, e.g. `October 15, 2026 at 09:30 AM PDT`.
    pub last_updated: &'a str,
}

/// One decimal place, always shown (`2.0`, not `2`).
#[must_use]
pub fn format_ratio(ratio: f64) -> String {
    format!("{ratio:.1}")
}

#[must_use]
pub fn ratio_text(ratio: f64, year: i32) -> String {
    format!(
        "I have {}x as many commits in {year} as followers",
        format_ratio(ratio)
    )
}

#[must_use]
pub fn ratio_subtitle(ratio: f64) -> &'static str {
    if ratio > 1.0 {
        "Focusing more on building than on social media presence!"
    } else {
        "I need to build more..."
    }
}

/// Renders the full dashboard HTML.
///
/// # Errors
///
/// Returns [`RenderError::Json`] if the history cannot be serialized, or a
/// placeholder error if the template references an unknown value.
pub fn render_dashboard(ctx: &DashboardContext<'_>) -> Result<String, RenderError> {
    let entry = ctx.current;
    let history_json = escape::script_json(&serde_json::to_string(ctx.history)?);

    let values = [
        ("github_commits", entry.github_commits.to_string()),
        ("twitter_followers", entry.twitter_followers.to_string()),
        ("youtube_subscribers", entry.youtube_subscribers.to_string()),
        ("bluesky_followers", entry.bluesky_followers.to_string()),
        ("total_followers", entry.total_followers.to_string()),
        (
            "ratio_text",
            escape::html(&ratio_text(entry.ratio, entry.date.year())),
        ),
        ("ratio_subtitle", escape::html(ratio_subtitle(entry.ratio))),
        ("profile_links", profile_links(&ctx.profiles)),
        ("last_updated", escape::html(ctx.last_updated)),
        ("history_json", history_json),
    ];

    fill(TEMPLATE, &values)
}

fn profile_links(profiles: &Profiles<'_>) -> String {
    let mut links = vec![link(
        &format!("https://github.com/{}", profiles.github_username),
        &format!("@{}", profiles.github_username),
    )];
    if let Some(user) = profiles.twitter_username {
        links.push(link(&format!("https://x.com/{user}"), &format!("@{user}")));
    }
    if let Some(channel) = profiles.youtube_channel_id {
        links.push(link(
            &format!("https://www.youtube.com/channel/{channel}"),
            "YouTube",
        ));
    }
    if let Some(handle) = profiles.bluesky_handle {
        links.push(link(
            &format!("https://bsky.app/profile/{handle}"),
            &format!("@{handle}"),
        ));
    }
    links.join("\n                ")
}

fn link(href: &str, text: &str) -> String {
    format!(
        r#"<a href="{}" target="_blank" rel="noopener">{}</a>"#,
        escape::html(href),
        escape::html(text)
    )
}

/// Single-pass `{{name}}` substitution. Values are inserted verbatim and
/// never rescanned, so a value containing `{{` cannot inject a placeholder.
fn fill(template: &str, values: &[(&str, String)]) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len() + 4096);
    let mut rest = template;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or(RenderError::UnclosedPlaceholder(offset + start))?;
        let name = after[..end].trim();
        let value = values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, v)| v)
            .ok_or_else(|| RenderError::UnknownPlaceholder(name.to_owned()))?;
        out.push_str(value);

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod tests;
