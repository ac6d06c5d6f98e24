//! File-backed dataset store: one pretty-JSON document per dataset under
//! `<base>/<owner>/<uuid>.json`.

use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{EquipError, Result, ResultExt as _};
use crate::model::{Dataset, DatasetSummary};
use crate::store::{DatasetStore, NewDataset};

/// Local dataset store rooted at a base directory.
///
/// Writers (create, delete) run under one async mutex, which covers the
/// same-owner serialization the pipeline needs: retention never observes
/// a dataset mid-creation. Reads take no lock — a dataset file is only
/// ever visible after its atomic rename.
#[derive(Debug)]
pub struct FileStore {
    base_path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(base_path: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_path).context("Failed to create dataset store directory")?;
        Ok(Self {
            base_path,
            write_lock: Mutex::new(()),
        })
    }

    fn owner_dir(&self, owner: &str) -> PathBuf {
        self.base_path.join(sanitize_owner(owner))
    }

    fn dataset_path(&self, owner: &str, id: Uuid) -> PathBuf {
        self.owner_dir(owner).join(format!("{id}.json"))
    }

    fn load_owner_datasets(&self, owner: &str) -> Result<Vec<Dataset>> {
        let dir = self.owner_dir(owner);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut datasets = Vec::new();
        for entry in fs::read_dir(&dir).context("Failed to read owner directory")? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let json = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read dataset file: {}", path.display()))?;
            let dataset = Dataset::from_json(&json)
                .with_context(|| format!("Failed to parse dataset file: {}", path.display()))?;
            datasets.push(dataset);
        }

        // Newest first; seq breaks creation-timestamp ties.
        datasets.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(datasets)
    }
}

#[async_trait]
impl DatasetStore for FileStore {
    async fn create_dataset(&self, new: NewDataset) -> Result<Dataset> {
        let _guard = self.write_lock.lock().await;

        let existing = self.load_owner_datasets(&new.owner)?;
        let seq = existing.iter().map(|d| d.seq).max().unwrap_or(0) + 1;

        let dataset = Dataset {
            id: Uuid::new_v4(),
            owner: new.owner,
            filename: new.filename,
            created_at: Utc::now(),
            seq,
            stats: new.stats,
            records: new.records,
        };

        let dir = self.owner_dir(&dataset.owner);
        fs::create_dir_all(&dir).context("Failed to create owner directory")?;

        // Write to a temp name then rename, so a dataset file is either
        // complete or absent — never partially persisted.
        let final_path = self.dataset_path(&dataset.owner, dataset.id);
        let tmp_path = dir.join(format!("{}.json.tmp", dataset.id));
        let json = dataset.to_json()?;
        fs::write(&tmp_path, json).context("Failed to write dataset file")?;
        fs::rename(&tmp_path, &final_path).context("Failed to commit dataset file")?;

        tracing::info!(
            owner = %dataset.owner,
            id = %dataset.id,
            records = dataset.records.len(),
            "dataset persisted"
        );
        Ok(dataset)
    }

    async fn list_datasets(
        &self,
        owner: &str,
        limit: Option<usize>,
    ) -> Result<Vec<DatasetSummary>> {
        let datasets = self.load_owner_datasets(owner)?;
        let take = limit.unwrap_or(datasets.len());
        Ok(datasets.iter().take(take).map(Dataset::summary).collect())
    }

    async fn get_dataset(&self, owner: &str, id: Uuid) -> Result<Dataset> {
        let path = self.dataset_path(owner, id);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EquipError::NotFound);
            }
            Err(e) => {
                return Err(EquipError::Io(e));
            }
        };
        Dataset::from_json(&json)
            .with_context(|| format!("Failed to parse dataset file: {}", path.display()))
    }

    async fn delete_dataset(&self, owner: &str, id: Uuid) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let path = self.dataset_path(owner, id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(EquipError::NotFound),
            Err(e) => Err(EquipError::Io(e)),
        }
    }
}

/// Owner identities become directory names; anything outside a safe
/// character set is replaced so identities can never traverse paths.
fn sanitize_owner(owner: &str) -> String {
    let sanitized: String = owner
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "_".to_owned()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, clippy::indexing_slicing)]
    use super::*;
    use crate::model::{DatasetStats, Distribution, EquipmentRecord};
    use tempfile::TempDir;

    fn new_dataset(owner: &str, filename: &str) -> NewDataset {
        NewDataset {
            owner: owner.to_owned(),
            filename: filename.to_owned(),
            stats: DatasetStats {
                total_count: 1,
                avg_flowrate: 10.0,
                avg_pressure: 2.0,
                avg_temperature: 25.0,
                distribution: Distribution::from([("Pump".to_owned(), 1)]),
            },
            records: vec![EquipmentRecord {
                name: "Pump-1".to_owned(),
                equipment_type: "Pump".to_owned(),
                flowrate: 10.0,
                pressure: 2.0,
                temperature: 25.0,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_then_get_roundtrip() -> Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path().to_path_buf())?;

        let created = store.create_dataset(new_dataset("alice", "plant.csv")).await?;
        assert_eq!(created.seq, 1);

        let fetched = store.get_dataset("alice", created.id).await?;
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.stats, created.stats);
        assert_eq!(fetched.records, created.records);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() -> Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path().to_path_buf())?;

        let mut ids = Vec::new();
        for i in 0..4 {
            let created = store
                .create_dataset(new_dataset("alice", &format!("batch-{i}.csv")))
                .await?;
            ids.push(created.id);
        }

        let listed = store.list_datasets("alice", Some(3)).await?;
        assert_eq!(listed.len(), 3);
        // Reverse creation order, even when timestamps collide: seq wins.
        assert_eq!(listed[0].id, ids[3]);
        assert_eq!(listed[1].id, ids[2]);
        assert_eq!(listed[2].id, ids[1]);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_scoped_by_owner() -> Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path().to_path_buf())?;

        let created = store.create_dataset(new_dataset("alice", "plant.csv")).await?;
        let err = store.get_dataset("mallory", created.id).await.unwrap_err();
        assert!(matches!(err, EquipError::NotFound));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_is_not_found_when_absent() -> Result<()> {
        let temp = TempDir::new()?;
        let store = FileStore::new(temp.path().to_path_buf())?;

        let created = store.create_dataset(new_dataset("alice", "plant.csv")).await?;
        store.delete_dataset("alice", created.id).await?;

        let err = store.delete_dataset("alice", created.id).await.unwrap_err();
        assert!(matches!(err, EquipError::NotFound));

        let err = store.get_dataset("alice", created.id).await.unwrap_err();
        assert!(matches!(err, EquipError::NotFound));
        Ok(())
    }

    #[test]
    fn test_sanitize_owner() {
        assert_eq!(sanitize_owner("alice"), "alice");
        assert_eq!(sanitize_owner("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_owner(""), "_");
    }
}
