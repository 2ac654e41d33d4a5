//! Static dashboard and SVG chart rendering.
//!
//! Both outputs are self-contained strings: the dashboard is one HTML page
//! (Chart.js loads from a CDN) and the chart is one SVG document.

pub mod chart;
pub mod dashboard;
pub mod error;
mod escape;

pub use chart::{render_metric_chart, ChartOptions, ChartPoint, SeriesStats};
pub use dashboard::{format_ratio, ratio_subtitle, ratio_text, render_dashboard, DashboardContext, Profiles};
pub use error::RenderError;
