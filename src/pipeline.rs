//! The two flows gluing the pipeline together.
//!
//! Ingestion is strictly sequential: parse → aggregate → persist →
//! retain. Persistence is atomic, so a fatal error anywhere leaves no
//! partial dataset behind; retention runs as part of the same logical
//! unit of work and is idempotent, so a crash between the two steps is
//! not an error state — the next ingestion squares it away.
//!
//! Report generation is read-only. A failed chart is a normal outcome
//! (the report omits its visualization section); only failures of the
//! document assembly itself fail the request.

use uuid::Uuid;

use crate::chart;
use crate::error::{EquipError, Result};
use crate::ingest;
use crate::model::Dataset;
use crate::report::{self, ReportArtifact};
use crate::retention;
use crate::stats;
use crate::store::{DatasetStore, NewDataset};

/// Dashboard dimensions used when the caller has no configured size.
pub const DEFAULT_CHART_WIDTH: u32 = 900;
pub const DEFAULT_CHART_HEIGHT: u32 = 700;

/// Ingest one CSV upload for an owner: validate, aggregate, persist
/// atomically, then enforce the retention window.
pub async fn ingest_csv(
    store: &dyn DatasetStore,
    owner: &str,
    filename: &str,
    data: &[u8],
) -> Result<Dataset> {
    tracing::info!(owner, filename, bytes = data.len(), "ingestion started");

    let records = ingest::parse_records(data)?;
    if records.is_empty() {
        return Err(EquipError::EmptyDataset);
    }
    let stats = stats::summarize(&records)?;

    let dataset = store
        .create_dataset(NewDataset {
            owner: owner.to_owned(),
            filename: filename.to_owned(),
            stats,
            records,
        })
        .await?;

    let deleted = retention::enforce(store, owner).await?;
    tracing::info!(
        owner,
        id = %dataset.id,
        records = dataset.stats.total_count,
        retired = deleted,
        "ingestion complete"
    );

    Ok(dataset)
}

/// Render the report for one stored dataset at the default dashboard
/// size.
pub async fn generate_report(
    store: &dyn DatasetStore,
    owner: &str,
    id: Uuid,
) -> Result<ReportArtifact> {
    generate_report_sized(store, owner, id, DEFAULT_CHART_WIDTH, DEFAULT_CHART_HEIGHT).await
}

/// Render the report with explicit dashboard dimensions.
pub async fn generate_report_sized(
    store: &dyn DatasetStore,
    owner: &str,
    id: Uuid,
    chart_width: u32,
    chart_height: u32,
) -> Result<ReportArtifact> {
    let dataset = store.get_dataset(owner, id).await?;

    // None here means the chart failed and was logged; the report is
    // still produced.
    let dashboard = chart::render_dashboard(&dataset, chart_width, chart_height);

    report::render_report(&dataset, dashboard.as_ref())
}
