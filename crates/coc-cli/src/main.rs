mod alert;
mod backfill;
mod check;
mod pipeline;
mod plot;
mod render;
mod scheduler;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "coc")]
#[command(about = "Commits or Clout: GitHub commits vs. social following dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch every counter once, update the history, and publish the dashboard.
    Run {
        /// Fetch and render, but write nothing to storage.
        #[arg(long)]
        dry_run: bool,
    },
    /// Run on the configured cron schedule until Ctrl-C or SIGTERM.
    Schedule {
        /// Also run once immediately on startup.
        #[arg(long)]
        now: bool,
    },
    /// Rebuild this year's series from GitHub's per-day commit history.
    Backfill {
        /// Write the rebuilt history JSON to this file.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Merge the rebuilt series into stored history.
        #[arg(long)]
        upload: bool,
    },
    /// Render the dashboard to a local file.
    Render {
        /// History JSON to render; sample data when omitted.
        #[arg(long)]
        history: Option<PathBuf>,
        #[arg(long, default_value = "index.html")]
        output: PathBuf,
    },
    /// Chart one metric for a year as SVG.
    Plot {
        #[arg(long, default_value = "twitter_followers")]
        metric: coc_core::Metric,
        /// Defaults to the current year in the configured timezone.
        #[arg(long)]
        year: Option<i32>,
        /// History JSON to read instead of storage.
        #[arg(long)]
        history: Option<PathBuf>,
        /// Defaults to `{metric}_{year}.svg`.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Query live values from the providers without storing anything.
    Check {
        #[arg(value_enum, default_value_t = Provider::All)]
        provider: Provider,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Provider {
    Github,
    Twitter,
    Youtube,
    Bluesky,
    All,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // `render` and `plot --history` work without credentials, so a config
    // error is only fatal for the commands that need one.
    let config = coc_core::load_app_config_from_env();
    let log_level = config.as_ref().map_or("info", |c| c.log_level.as_str());
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { dry_run } => {
            let config = config?;
            let report = pipeline::run_once(&config, dry_run).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Schedule { now } => scheduler::run_scheduled(config?, now).await?,
        Commands::Backfill { output, upload } => {
            backfill::run_backfill(&config?, output.as_deref(), upload).await?;
        }
        Commands::Render { history, output } => {
            render::run_render(config.ok().as_ref(), history.as_deref(), &output).await?;
        }
        Commands::Plot {
            metric,
            year,
            history,
            output,
        } => {
            plot::run_plot(
                config.ok().as_ref(),
                metric,
                year,
                history.as_deref(),
                output.as_deref(),
            )
            .await?;
        }
        Commands::Check { provider } => check::run_check(&config?, provider).await?,
    }

    Ok(())
}
