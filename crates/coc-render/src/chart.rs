//! Standalone SVG line chart of one metric over time, with a stats box.

use std::fmt::Write as _;

use chrono::NaiveDate;
use coc_core::Metric;

use crate::escape;

const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;
const Y_TICKS: usize = 5;
const MAX_X_LABELS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Summary shown in the chart's stats box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    /// Last value of the series.
    pub current: f64,
    pub min: f64,
    pub max: f64,
    /// `current` minus the first value.
    pub growth: f64,
}

impl SeriesStats {
    /// `None` for an empty series.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let (&first, &current) = (values.first()?, values.last()?);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            current,
            min,
            max,
            growth: current - first,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub title: String,
    pub y_label: String,
    pub color: String,
    pub width: u32,
    pub height: u32,
}

impl ChartOptions {
    /// Title `"{label} Over Time - {year}"` in the metric's colour.
    #[must_use]
    pub fn for_metric(metric: Metric, year: i32) -> Self {
        Self {
            title: format!("{} Over Time - {year}", metric.label()),
            y_label: metric.label().to_owned(),
            color: metric.color().to_owned(),
            width: 1200,
            height: 800,
        }
    }
}

/// Renders `points` (assumed sorted by date) as an SVG document.
#[must_use]
pub fn render_metric_chart(points: &[ChartPoint], options: &ChartOptions) -> String {
    let width = f64::from(options.width);
    let height = f64::from(options.height);
    let plot_w = (width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
    let plot_h = (height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="Helvetica, Arial, sans-serif">"#,
        w = options.width,
        h = options.height
    );
    let _ = writeln!(svg, r#"  <rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"  <text x="{}" y="35" font-size="22" font-weight="bold" text-anchor="middle">{}</text>"#,
        width / 2.0,
        escape::html(&options.title)
    );

    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let Some(stats) = SeriesStats::from_values(&values) else {
        let _ = writeln!(
            svg,
            r##"  <text x="{}" y="{}" font-size="18" fill="#666" text-anchor="middle">No data</text>"##,
            width / 2.0,
            height / 2.0
        );
        svg.push_str("</svg>\n");
        return svg;
    };

    let (y_min, y_max) = y_range(stats.min, stats.max);
    let y_of = |v: f64| MARGIN_TOP + plot_h - (v - y_min) / (y_max - y_min) * plot_h;

    let first = points[0].date;
    let span_days = (points[points.len() - 1].date - first).num_days().max(0);
    #[allow(clippy::cast_precision_loss)]
    let x_of = |d: NaiveDate| {
        if span_days == 0 {
            MARGIN_LEFT + plot_w / 2.0
        } else {
            MARGIN_LEFT + (d - first).num_days() as f64 / span_days as f64 * plot_w
        }
    };

    // Grid and y-axis labels.
    for i in 0..=Y_TICKS {
        #[allow(clippy::cast_precision_loss)]
        let v = y_min + (y_max - y_min) * i as f64 / Y_TICKS as f64;
        let y = y_of(v);
        let _ = writeln!(
            svg,
            r##"  <line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#000" stroke-opacity="0.1"/>"##,
            MARGIN_LEFT + plot_w
        );
        let _ = writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" font-size="12" text-anchor="end">{}</text>"#,
            MARGIN_LEFT - 8.0,
            y + 4.0,
            format_value(v)
        );
    }

    // X-axis labels, evenly thinned.
    let step = points.len().div_ceil(MAX_X_LABELS).max(1);
    for point in points.iter().step_by(step) {
        let x = x_of(point.date);
        let y = MARGIN_TOP + plot_h + 20.0;
        let _ = writeln!(
            svg,
            r#"  <text x="{x:.1}" y="{y:.1}" font-size="12" text-anchor="end" transform="rotate(-45 {x:.1} {y:.1})">{}</text>"#,
            point.date.format("%m/%d")
        );
    }

    let _ = writeln!(
        svg,
        r#"  <text x="{:.1}" y="{:.1}" font-size="14" text-anchor="middle">Date</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        height - 12.0
    );
    let _ = writeln!(
        svg,
        r#"  <text x="20" y="{y:.1}" font-size="14" text-anchor="middle" transform="rotate(-90 20 {y:.1})">{}</text>"#,
        escape::html(&options.y_label),
        y = MARGIN_TOP + plot_h / 2.0
    );

    let color = escape::html(&options.color);
    let polyline: Vec<String> = points
        .iter()
        .map(|p| format!("{:.1},{:.1}", x_of(p.date), y_of(p.value)))
        .collect();
    let _ = writeln!(
        svg,
        r#"  <polyline fill="none" stroke="{color}" stroke-width="2" points="{}"/>"#,
        polyline.join(" ")
    );
    for p in points {
        let _ = writeln!(
            svg,
            r#"  <circle cx="{:.1}" cy="{:.1}" r="3" fill="{color}"/>"#,
            x_of(p.date),
            y_of(p.value)
        );
    }

    write_stats_box(&mut svg, &stats);
    svg.push_str("</svg>\n");
    svg
}

fn write_stats_box(svg: &mut String, stats: &SeriesStats) {
    let lines = [
        format!("Current: {}", format_value(stats.current)),
        format!("Min: {}", format_value(stats.min)),
        format!("Max: {}", format_value(stats.max)),
        format!("Growth: {}", format_growth(stats.growth)),
    ];
    let x = MARGIN_LEFT + 12.0;
    let y = MARGIN_TOP + 12.0;
    let _ = writeln!(
        svg,
        r##"  <rect x="{x}" y="{y}" width="170" height="92" rx="8" fill="#f5deb3" fill-opacity="0.8" stroke="#c8a96e"/>"##
    );
    for (i, line) in lines.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let line_y = y + 22.0 + i as f64 * 20.0;
        let _ = writeln!(
            svg,
            r#"  <text x="{:.1}" y="{line_y:.1}" font-size="14">{}</text>"#,
            x + 10.0,
            escape::html(line)
        );
    }
}

/// Axis bounds with a little headroom; a flat series gets a unit band.
fn y_range(min: f64, max: f64) -> (f64, f64) {
    let pad = if (max - min).abs() < f64::EPSILON {
        1.0
    } else {
        (max - min) * 0.05
    };
    let lower = if min >= 0.0 { (min - pad).max(0.0) } else { min - pad };
    (lower, max + pad)
}

/// Whole numbers without decimals, anything else with one.
fn format_value(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

fn format_growth(v: f64) -> String {
    if v >= 0.0 {
        format!("+{}", format_value(v))
    } else {
        format_value(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(values: &[f64]) -> Vec<ChartPoint> {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        values
            .iter()
            .zip(start.iter_days())
            .map(|(&value, date)| ChartPoint { date, value })
            .collect()
    }

    #[test]
    fn stats_track_current_min_max_growth() {
        let stats = SeriesStats::from_values(&[35.0, 30.0, 52.0, 48.0]).unwrap();
        assert_eq!(
            stats,
            SeriesStats {
                current: 48.0,
                min: 30.0,
                max: 52.0,
                growth: 13.0
            }
        );
    }

    #[test]
    fn stats_of_empty_series_is_none() {
        assert!(SeriesStats::from_values(&[]).is_none());
    }

    #[test]
    fn growth_is_signed() {
        assert_eq!(format_growth(13.0), "+13");
        assert_eq!(format_growth(0.0), "+0");
        assert_eq!(format_growth(-4.0), "-4");
        assert_eq!(format_growth(1.5), "+1.5");
    }

    #[test]
    fn chart_draws_every_point_and_stats() {
        let options = ChartOptions::for_metric(Metric::TwitterFollowers, 2026);
        let svg = render_metric_chart(&points(&[35.0, 40.0, 42.0]), &options);
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<circle").count(), 3);
        assert!(svg.contains("X/Twitter Followers Over Time - 2026"));
        assert!(svg.contains("Current: 42"));
        assert!(svg.contains("Growth: +7"));
        assert!(svg.contains(Metric::TwitterFollowers.color()));
    }

    #[test]
    fn single_point_chart_is_centered() {
        let options = ChartOptions::for_metric(Metric::Ratio, 2026);
        let svg = render_metric_chart(&points(&[1.5]), &options);
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(svg.contains("Current: 1.5"));
    }

    #[test]
    fn empty_chart_says_no_data() {
        let options = ChartOptions::for_metric(Metric::GithubCommits, 2026);
        let svg = render_metric_chart(&[], &options);
        assert!(svg.contains("No data"));
        assert!(!svg.contains("<polyline"));
    }

    #[test]
    fn x_labels_are_thinned() {
        let values: Vec<f64> = (0..100u32).map(f64::from).collect();
        let options = ChartOptions::for_metric(Metric::GithubCommits, 2026);
        let svg = render_metric_chart(&points(&values), &options);
        assert!(svg.matches("rotate(-45").count() <= MAX_X_LABELS);
    }
}
