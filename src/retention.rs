//! Bounded per-owner dataset history.
//!
//! After every successful ingestion the pipeline calls [`enforce`], which
//! deletes everything beyond the [`RETENTION_LIMIT`] most recent
//! datasets. Enforcement is idempotent: a dataset that vanished between
//! listing and deletion is treated as already enforced, so re-running
//! after a crash is always safe.

use crate::error::{EquipError, Result};
use crate::model::DatasetSummary;
use crate::store::DatasetStore;

/// How many datasets each owner keeps.
pub const RETENTION_LIMIT: usize = 5;

/// Delete the owner's datasets beyond the retained window. Returns how
/// many were deleted.
pub async fn enforce(store: &dyn DatasetStore, owner: &str) -> Result<usize> {
    let all = store.list_datasets(owner, None).await?;

    let mut deleted = 0;
    for stale in all.iter().skip(RETENTION_LIMIT) {
        match store.delete_dataset(owner, stale.id).await {
            Ok(()) => {
                tracing::info!(owner = %owner, id = %stale.id, "retention deleted dataset");
                deleted += 1;
            }
            // Already gone — enforcement raced or re-ran; both are fine.
            Err(EquipError::NotFound) => {}
            Err(e) => return Err(e),
        }
    }

    Ok(deleted)
}

/// Read-side of the same contract: the owner's history, newest first,
/// capped at the retention limit.
pub async fn history(store: &dyn DatasetStore, owner: &str) -> Result<Vec<DatasetSummary>> {
    store.list_datasets(owner, Some(RETENTION_LIMIT)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DatasetStats, Distribution, EquipmentRecord};
    use crate::store::NewDataset;
    use crate::store::file::FileStore;
    use tempfile::TempDir;

    fn new_dataset(owner: &str, filename: &str) -> NewDataset {
        NewDataset {
            owner: owner.to_owned(),
            filename: filename.to_owned(),
            stats: DatasetStats {
                total_count: 1,
                avg_flowrate: 1.0,
                avg_pressure: 1.0,
                avg_temperature: 1.0,
                distribution: Distribution::from([("Pump".to_owned(), 1)]),
            },
            records: vec![EquipmentRecord {
                name: "Pump-1".to_owned(),
                equipment_type: "Pump".to_owned(),
                flowrate: 1.0,
                pressure: 1.0,
                temperature: 1.0,
            }],
        }
    }

    #[tokio::test]
    async fn test_enforce_keeps_five_most_recent() -> Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path().to_path_buf())?;

        let mut ids = Vec::new();
        for i in 0..8 {
            let created = store
                .create_dataset(new_dataset("alice", &format!("batch-{i}.csv")))
                .await?;
            ids.push(created.id);
        }

        let deleted = enforce(&store, "alice").await?;
        assert_eq!(deleted, 3);

        let remaining = store.list_datasets("alice", None).await?;
        assert_eq!(remaining.len(), RETENTION_LIMIT);
        // The five most recent survive, newest first.
        let remaining_ids: Vec<_> = remaining.iter().map(|d| d.id).collect();
        assert_eq!(
            remaining_ids,
            ids.iter().rev().take(5).copied().collect::<Vec<_>>()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_enforce_is_idempotent() -> Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path().to_path_buf())?;

        for i in 0..6 {
            store
                .create_dataset(new_dataset("alice", &format!("batch-{i}.csv")))
                .await?;
        }

        assert_eq!(enforce(&store, "alice").await?, 1);
        assert_eq!(enforce(&store, "alice").await?, 0);
        assert_eq!(enforce(&store, "alice").await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_enforce_leaves_other_owners_alone() -> Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path().to_path_buf())?;

        for i in 0..7 {
            store
                .create_dataset(new_dataset("alice", &format!("batch-{i}.csv")))
                .await?;
        }
        store.create_dataset(new_dataset("bob", "solo.csv")).await?;

        enforce(&store, "alice").await?;

        assert_eq!(store.list_datasets("bob", None).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_history_caps_at_limit() -> Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path().to_path_buf())?;

        for i in 0..4 {
            store
                .create_dataset(new_dataset("alice", &format!("batch-{i}.csv")))
                .await?;
        }
        assert_eq!(history(&store, "alice").await?.len(), 4);

        for i in 4..9 {
            store
                .create_dataset(new_dataset("alice", &format!("batch-{i}.csv")))
                .await?;
        }
        assert_eq!(history(&store, "alice").await?.len(), RETENTION_LIMIT);
        Ok(())
    }
}
