//! Recurring updates on the configured cron schedule.
//!
//! Clients and storage are built once and shared by every tick. A tick that
//! fires while the previous run is still going is skipped, never queued.

use std::sync::Arc;

use coc_core::clock::local_now;
use coc_core::AppConfig;
use coc_store::ObjectStore;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::pipeline::{self, Providers};

struct RunContext {
    config: AppConfig,
    providers: Providers,
    store: ObjectStore,
    running: Mutex<()>,
}

/// Runs until Ctrl-C or SIGTERM, optionally starting with an immediate run.
///
/// # Errors
///
/// Client or storage construction failures, an invalid cron expression, or
/// a scheduler that fails to start or stop.
pub(crate) async fn run_scheduled(config: AppConfig, run_now: bool) -> anyhow::Result<()> {
    let providers = Providers::from_app_config(&config)?;
    let store = ObjectStore::from_app_config(&config)?;
    let context = Arc::new(RunContext {
        config,
        providers,
        store,
        running: Mutex::new(()),
    });

    let mut scheduler = build_scheduler(Arc::clone(&context)).await?;
    tracing::info!(
        schedule = %context.config.schedule,
        timezone = %context.config.timezone,
        "scheduler started"
    );

    if run_now {
        run_guarded(&context).await;
    }

    shutdown_signal().await;
    scheduler.shutdown().await?;
    tracing::info!("scheduler stopped");
    Ok(())
}

async fn build_scheduler(context: Arc<RunContext>) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    let schedule = context.config.schedule.clone();

    let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
        let context = Arc::clone(&context);
        Box::pin(async move {
            run_guarded(&context).await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn run_guarded(context: &RunContext) {
    let Ok(_guard) = context.running.try_lock() else {
        tracing::warn!("scheduler: previous run still in progress; skipping tick");
        return;
    };

    let now = local_now(context.config.timezone);
    tracing::info!(%now, "scheduler: starting run");
    match pipeline::run_update(
        &context.config,
        &context.providers,
        &context.store,
        now,
        false,
    )
    .await
    {
        Ok(report) => tracing::info!(
            date = %report.entry.date,
            github_commits = report.entry.github_commits,
            total_followers = report.entry.total_followers,
            ratio = report.entry.ratio,
            failed_providers = report.failed_providers.len(),
            "scheduler: run complete"
        ),
        Err(e) => tracing::error!(error = %format!("{e:#}"), "scheduler: run failed"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping scheduler");
}
