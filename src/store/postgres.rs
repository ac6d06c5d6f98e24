//! Postgres-backed dataset store.
//!
//! Creation runs in one transaction per dataset: a per-owner advisory
//! lock, the dataset row, then the bulk record insert. Retention deletes
//! issued right after creation therefore never see a torn state for that
//! owner. The `equipment` table cascades on dataset deletion.

use std::str::FromStr as _;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{Pool, Postgres, Row as _};
use uuid::Uuid;

use crate::error::{EquipError, Result, ResultExt as _};
use crate::model::{Dataset, DatasetStats, DatasetSummary, Distribution, EquipmentRecord};
use crate::store::{DatasetStore, NewDataset};

pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    /// Connect and ensure the schema exists.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = PgConnectOptions::from_str(url).context("Invalid connection URL")?;
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .connect_with(options)
            .await
            .context("Failed to connect to PostgreSQL (timeout after 10s)")?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS datasets (
                id UUID PRIMARY KEY,
                owner_name TEXT NOT NULL,
                filename TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                seq BIGINT NOT NULL,
                total_count BIGINT NOT NULL,
                avg_flowrate DOUBLE PRECISION NOT NULL,
                avg_pressure DOUBLE PRECISION NOT NULL,
                avg_temperature DOUBLE PRECISION NOT NULL,
                type_distribution TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS equipment (
                id BIGSERIAL PRIMARY KEY,
                dataset_id UUID NOT NULL REFERENCES datasets(id) ON DELETE CASCADE,
                position BIGINT NOT NULL,
                equipment_name TEXT NOT NULL,
                equipment_type TEXT NOT NULL,
                flowrate DOUBLE PRECISION NOT NULL,
                pressure DOUBLE PRECISION NOT NULL,
                temperature DOUBLE PRECISION NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_datasets_owner
             ON datasets (owner_name, created_at DESC, seq DESC)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn stats_from_row(row: &PgRow) -> Result<DatasetStats> {
    let distribution_json: String = row.try_get("type_distribution")?;
    let distribution: Distribution = serde_json::from_str(&distribution_json)?;
    Ok(DatasetStats {
        total_count: row.try_get::<i64, _>("total_count")? as usize,
        avg_flowrate: row.try_get("avg_flowrate")?,
        avg_pressure: row.try_get("avg_pressure")?,
        avg_temperature: row.try_get("avg_temperature")?,
        distribution,
    })
}

fn summary_from_row(row: &PgRow) -> Result<DatasetSummary> {
    Ok(DatasetSummary {
        id: row.try_get("id")?,
        filename: row.try_get("filename")?,
        created_at: row.try_get("created_at")?,
        seq: row.try_get("seq")?,
        stats: stats_from_row(row)?,
    })
}

#[async_trait]
impl DatasetStore for PgStore {
    async fn create_dataset(&self, new: NewDataset) -> Result<Dataset> {
        let mut tx = self.pool.begin().await?;

        // Serialize same-owner creation and retention for the duration
        // of this transaction.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&new.owner)
            .execute(&mut *tx)
            .await?;

        let seq: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(seq), 0) + 1 FROM datasets WHERE owner_name = $1")
                .bind(&new.owner)
                .fetch_one(&mut *tx)
                .await?;

        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let distribution_json = serde_json::to_string(&new.stats.distribution)?;

        sqlx::query(
            "INSERT INTO datasets (id, owner_name, filename, created_at, seq, total_count,
                avg_flowrate, avg_pressure, avg_temperature, type_distribution)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(id)
        .bind(&new.owner)
        .bind(&new.filename)
        .bind(created_at)
        .bind(seq)
        .bind(new.stats.total_count as i64)
        .bind(new.stats.avg_flowrate)
        .bind(new.stats.avg_pressure)
        .bind(new.stats.avg_temperature)
        .bind(&distribution_json)
        .execute(&mut *tx)
        .await?;

        let positions: Vec<i64> = (0..new.records.len() as i64).collect();
        let names: Vec<String> = new.records.iter().map(|r| r.name.clone()).collect();
        let types: Vec<String> = new
            .records
            .iter()
            .map(|r| r.equipment_type.clone())
            .collect();
        let flowrates: Vec<f64> = new.records.iter().map(|r| r.flowrate).collect();
        let pressures: Vec<f64> = new.records.iter().map(|r| r.pressure).collect();
        let temperatures: Vec<f64> = new.records.iter().map(|r| r.temperature).collect();

        sqlx::query(
            "INSERT INTO equipment (dataset_id, position, equipment_name, equipment_type,
                flowrate, pressure, temperature)
             SELECT $1::uuid, * FROM UNNEST($2::bigint[], $3::text[], $4::text[],
                $5::double precision[], $6::double precision[], $7::double precision[])",
        )
        .bind(id)
        .bind(&positions)
        .bind(&names)
        .bind(&types)
        .bind(&flowrates)
        .bind(&pressures)
        .bind(&temperatures)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            owner = %new.owner,
            id = %id,
            records = new.records.len(),
            "dataset persisted"
        );

        Ok(Dataset {
            id,
            owner: new.owner,
            filename: new.filename,
            created_at,
            seq,
            stats: new.stats,
            records: new.records,
        })
    }

    async fn list_datasets(
        &self,
        owner: &str,
        limit: Option<usize>,
    ) -> Result<Vec<DatasetSummary>> {
        // LIMIT NULL means "no limit" in Postgres.
        let rows = sqlx::query(
            "SELECT id, filename, created_at, seq, total_count,
                avg_flowrate, avg_pressure, avg_temperature, type_distribution
             FROM datasets
             WHERE owner_name = $1
             ORDER BY created_at DESC, seq DESC
             LIMIT $2",
        )
        .bind(owner)
        .bind(limit.map(|l| l as i64))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(summary_from_row).collect()
    }

    async fn get_dataset(&self, owner: &str, id: Uuid) -> Result<Dataset> {
        let row = sqlx::query(
            "SELECT id, filename, created_at, seq, total_count,
                avg_flowrate, avg_pressure, avg_temperature, type_distribution
             FROM datasets
             WHERE id = $1 AND owner_name = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(EquipError::NotFound)?;

        let record_rows = sqlx::query(
            "SELECT equipment_name, equipment_type, flowrate, pressure, temperature
             FROM equipment
             WHERE dataset_id = $1
             ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(record_rows.len());
        for r in &record_rows {
            records.push(EquipmentRecord {
                name: r.try_get("equipment_name")?,
                equipment_type: r.try_get("equipment_type")?,
                flowrate: r.try_get("flowrate")?,
                pressure: r.try_get("pressure")?,
                temperature: r.try_get("temperature")?,
            });
        }

        Ok(Dataset {
            id,
            owner: owner.to_owned(),
            filename: row.try_get("filename")?,
            created_at: row.try_get("created_at")?,
            seq: row.try_get("seq")?,
            stats: stats_from_row(&row)?,
            records,
        })
    }

    async fn delete_dataset(&self, owner: &str, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM datasets WHERE id = $1 AND owner_name = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(EquipError::NotFound);
        }
        Ok(())
    }
}
