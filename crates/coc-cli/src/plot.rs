//! Per-metric SVG charts for one calendar year.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Datelike;
use coc_core::clock::local_now;
use coc_core::{AppConfig, HistoricalDataset, Metric};
use coc_render::{render_metric_chart, ChartOptions, ChartPoint, SeriesStats};
use coc_store::{load_history, ObjectStore};

use crate::render::{read_history_file, timezone};

/// Charts `metric` for `year` and prints summary statistics.
///
/// # Errors
///
/// Missing configuration when reading from storage, unreadable history, no
/// entries for the year, or a failed write.
pub(crate) async fn run_plot(
    config: Option<&AppConfig>,
    metric: Metric,
    year: Option<i32>,
    history: Option<&Path>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let year = year.unwrap_or_else(|| local_now(timezone(config)).year());

    let dataset = match history {
        Some(path) => read_history_file(path).await?,
        None => {
            let config =
                config.context("storage configuration is required unless --history is given")?;
            let store = ObjectStore::from_app_config(config)?;
            load_history(&store, &config.history_key, &config.history_backup_key).await?
        }
    };

    let points = year_points(&dataset, metric, year);
    if points.is_empty() {
        anyhow::bail!("no {metric} data for {year}");
    }

    let svg = render_metric_chart(&points, &ChartOptions::for_metric(metric, year));
    let output = output.map_or_else(|| default_output(metric, year), Path::to_path_buf);
    tokio::fs::write(&output, svg)
        .await
        .with_context(|| format!("writing {}", output.display()))?;

    println!("{} chart written to {}", metric.label(), output.display());
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    if let Some(stats) = SeriesStats::from_values(&values) {
        println!(
            "current {} | min {} | max {} | growth {}",
            stats.current, stats.min, stats.max, stats.growth
        );
    }
    Ok(())
}

fn year_points(dataset: &HistoricalDataset, metric: Metric, year: i32) -> Vec<ChartPoint> {
    dataset
        .for_year(year)
        .map(|entry| ChartPoint {
            date: entry.date,
            value: metric.value(entry),
        })
        .collect()
}

fn default_output(metric: Metric, year: i32) -> PathBuf {
    PathBuf::from(format!("{metric}_{year}.svg"))
}
