//! Reading and writing the published artifacts with backup-before-overwrite.

use coc_core::HistoricalDataset;

use crate::error::StoreError;
use crate::{ObjectStore, HTML_CONTENT_TYPE, JSON_CONTENT_TYPE};

/// Loads the history, falling back to the backup object when the main one
/// is absent or unparsable. Both absent yields an empty dataset.
///
/// # Errors
///
/// Storage failures, or [`StoreError::Corrupt`] when at least one object
/// exists and none parses. Both are left untouched for manual recovery.
pub async fn load_history(
    store: &ObjectStore,
    key: &str,
    backup_key: &str,
) -> Result<HistoricalDataset, StoreError> {
    let mut found_unreadable = false;
    for candidate in [key, backup_key] {
        let Some(bytes) = store.get(candidate).await? else {
            tracing::info!(key = candidate, "history object not found");
            continue;
        };
        match HistoricalDataset::from_slice(&bytes) {
            Ok(dataset) => {
                tracing::info!(key = candidate, entries = dataset.len(), "loaded history");
                return Ok(dataset);
            }
            Err(e) => {
                tracing::warn!(key = candidate, error = %e, "history object is unreadable");
                found_unreadable = true;
            }
        }
    }

    if found_unreadable {
        return Err(StoreError::Corrupt {
            key: key.to_owned(),
            backup_key: backup_key.to_owned(),
        });
    }

    tracing::info!("starting with empty history");
    Ok(HistoricalDataset::default())
}

/// Copies the current history to `backup_key`, then writes `dataset` as
/// pretty-printed JSON to `key`.
///
/// # Errors
///
/// Storage or serialization failures.
pub async fn save_history(
    store: &ObjectStore,
    dataset: &HistoricalDataset,
    key: &str,
    backup_key: &str,
) -> Result<(), StoreError> {
    let json = dataset.to_json_pretty()?;
    let backed_up = store.copy(key, backup_key, JSON_CONTENT_TYPE).await?;
    store.put(key, json.as_bytes(), JSON_CONTENT_TYPE).await?;
    tracing::info!(key, entries = dataset.len(), backed_up, "saved history");
    Ok(())
}

/// Copies the current dashboard to `backup_key`, then publishes `html`.
///
/// # Errors
///
/// Storage failures.
pub async fn publish_html(
    store: &ObjectStore,
    html: &str,
    key: &str,
    backup_key: &str,
) -> Result<(), StoreError> {
    let backed_up = store.copy(key, backup_key, HTML_CONTENT_TYPE).await?;
    store.put(key, html.as_bytes(), HTML_CONTENT_TYPE).await?;
    tracing::info!(key, bytes = html.len(), backed_up, "published dashboard");
    Ok(())
}
