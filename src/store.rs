//! Dataset persistence contract and backends.
//!
//! The pipeline only ever talks to [`DatasetStore`]; every call is scoped
//! by the owner identity, so a backend can never leak one owner's data to
//! another. Creation is atomic — the dataset row and its bulk-inserted
//! records land together or not at all — and stored datasets are
//! immutable until deleted.
//!
//! Two backends ship with the crate: [`file::FileStore`] (one JSON
//! document per dataset under a base directory, the default for local
//! use) and [`postgres::PgStore`] (sqlx, selected by `--db-url`).

pub mod file;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{Dataset, DatasetStats, DatasetSummary, EquipmentRecord};

/// Everything needed to persist one ingestion event. The store assigns
/// the id, creation timestamp, and per-owner sequence number.
#[derive(Debug, Clone)]
pub struct NewDataset {
    pub owner: String,
    pub filename: String,
    pub stats: DatasetStats,
    pub records: Vec<EquipmentRecord>,
}

#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Persist a dataset together with its records, atomically.
    async fn create_dataset(&self, new: NewDataset) -> Result<Dataset>;

    /// The owner's datasets, newest first (`(created_at, seq)`
    /// descending). `None` returns all of them.
    async fn list_datasets(
        &self,
        owner: &str,
        limit: Option<usize>,
    ) -> Result<Vec<DatasetSummary>>;

    /// Full dataset with records. `NotFound` if absent or owned by
    /// someone else — the two cases are indistinguishable.
    async fn get_dataset(&self, owner: &str, id: Uuid) -> Result<Dataset>;

    /// Delete a dataset and all its records. `NotFound` if absent.
    async fn delete_dataset(&self, owner: &str, id: Uuid) -> Result<()>;
}
