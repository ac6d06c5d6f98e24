//! Domain types for ingested equipment measurement data.
//!
//! A [`Dataset`] is one ingestion event: derived statistics plus the
//! ordered records it was computed from. Datasets are immutable after
//! creation — there is no update path, only deletion (explicit or via
//! retention).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Count of records per equipment type. Serialized as a JSON object at
/// every boundary, never as an array of pairs.
pub type Distribution = HashMap<String, u64>;

/// One row of input: name, categorical type, and three physical
/// measurements (flowrate m³/h, pressure bar, temperature °C).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub name: String,
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

/// Summary statistics derived from one batch of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_count: usize,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    pub distribution: Distribution,
}

impl DatasetStats {
    /// Distribution entries in presentation order: count descending, then
    /// type name ascending. Shared by the report tables and the charts so
    /// both render identically.
    pub fn ordered_distribution(&self) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .distribution
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }
}

/// One persisted ingestion event with its owned records.
///
/// `seq` is a per-owner creation sequence assigned by the store; ordering
/// is `(created_at, seq)` descending everywhere, so equal timestamps
/// resolve to most-recently-created wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: Uuid,
    pub owner: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub seq: i64,
    pub stats: DatasetStats,
    pub records: Vec<EquipmentRecord>,
}

impl Dataset {
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            id: self.id,
            filename: self.filename.clone(),
            created_at: self.created_at,
            seq: self.seq,
            stats: self.stats.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// List view of a dataset: statistics without the record payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: Uuid,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub seq: i64,
    pub stats: DatasetStats,
}
