//! Shared configuration and data model for Commits or Clout.
//!
//! Holds the environment-driven [`AppConfig`], the persisted
//! [`HistoricalDataset`] with its merge and ratio rules, and the timezone
//! helpers every other crate uses to decide what "today" means.

pub mod app_config;
pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod metric;

pub use app_config::{AppConfig, StoreBackend};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use error::{ConfigError, CoreError};
pub use history::{
    compute_ratio, resolve_counts, Counts, DailyEntry, FetchedCounts, HistoricalDataset,
};
pub use metric::Metric;
