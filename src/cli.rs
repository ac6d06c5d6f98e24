use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use equipscope::config;
use equipscope::pipeline;
use equipscope::retention;
use equipscope::store::DatasetStore;
use equipscope::store::file::FileStore;
use equipscope::store::postgres::PgStore;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "equipscope", about = "Equipment measurement analysis and reporting tool")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a CSV file of equipment measurements
    Ingest {
        /// Path to the CSV file to ingest
        #[arg(short, long)]
        file: PathBuf,

        /// Owner identity the dataset is stored under
        #[arg(short, long)]
        owner: String,

        /// Database connection URL (file store is used when absent)
        #[arg(long, env = "DATABASE_URL")]
        db_url: Option<String>,
    },
    /// List the owner's retained datasets, newest first
    List {
        #[arg(short, long)]
        owner: String,

        #[arg(long, env = "DATABASE_URL")]
        db_url: Option<String>,
    },
    /// Show one dataset: statistics, distribution, and records
    Show {
        #[arg(short, long)]
        owner: String,

        /// Dataset id
        id: Uuid,

        #[arg(long, env = "DATABASE_URL")]
        db_url: Option<String>,
    },
    /// Delete a dataset and all its records
    Delete {
        #[arg(short, long)]
        owner: String,

        /// Dataset id
        id: Uuid,

        #[arg(long, env = "DATABASE_URL")]
        db_url: Option<String>,
    },
    /// Render the PDF report for a dataset
    Report {
        #[arg(short, long)]
        owner: String,

        /// Dataset id
        id: Uuid,

        /// Directory the report file is written into. Defaults to the
        /// configured report directory.
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, env = "DATABASE_URL")]
        db_url: Option<String>,
    },
}

pub async fn run_command(command: Commands) -> Result<()> {
    match command {
        Commands::Ingest { file, owner, db_url } => handle_ingest(file, owner, db_url).await,
        Commands::List { owner, db_url } => handle_list(owner, db_url).await,
        Commands::Show { owner, id, db_url } => handle_show(owner, id, db_url).await,
        Commands::Delete { owner, id, db_url } => handle_delete(owner, id, db_url).await,
        Commands::Report {
            owner,
            id,
            output,
            db_url,
        } => handle_report(owner, id, output, db_url).await,
    }
}

async fn open_store(db_url: Option<String>) -> Result<Box<dyn DatasetStore>> {
    let settings = config::load_app_config().settings;
    match db_url.or(settings.database_url) {
        Some(url) => Ok(Box::new(PgStore::connect(&url).await?)),
        None => Ok(Box::new(FileStore::new(settings.data_dir)?)),
    }
}

async fn handle_ingest(file: PathBuf, owner: String, db_url: Option<String>) -> Result<()> {
    let is_csv = file
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    anyhow::ensure!(is_csv, "File must be a CSV: {}", file.display());

    let data = std::fs::read(&file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let filename = file
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("upload.csv")
        .to_owned();

    let store = open_store(db_url).await?;
    let dataset = pipeline::ingest_csv(store.as_ref(), &owner, &filename, &data).await?;

    println!("Ingested {} as dataset {}", filename, dataset.id);
    println!(
        "  {} records | avg flowrate {:.2} m³/h | avg pressure {:.2} bar | avg temperature {:.2} °C",
        dataset.stats.total_count,
        dataset.stats.avg_flowrate,
        dataset.stats.avg_pressure,
        dataset.stats.avg_temperature
    );
    Ok(())
}

async fn handle_list(owner: String, db_url: Option<String>) -> Result<()> {
    let store = open_store(db_url).await?;
    let datasets = retention::history(store.as_ref(), &owner).await?;

    if datasets.is_empty() {
        println!("No datasets stored for {owner}");
        return Ok(());
    }
    for summary in datasets {
        println!(
            "{}  {}  {}  ({} records)",
            summary.id,
            summary.created_at.format("%Y-%m-%d %H:%M:%S"),
            summary.filename,
            summary.stats.total_count
        );
    }
    Ok(())
}

async fn handle_show(owner: String, id: Uuid, db_url: Option<String>) -> Result<()> {
    let store = open_store(db_url).await?;
    let dataset = store.get_dataset(&owner, id).await?;

    println!("{} ({})", dataset.filename, dataset.id);
    println!("Uploaded: {}", dataset.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Records:  {}", dataset.stats.total_count);
    println!(
        "Averages: flowrate {:.2} m³/h, pressure {:.2} bar, temperature {:.2} °C",
        dataset.stats.avg_flowrate, dataset.stats.avg_pressure, dataset.stats.avg_temperature
    );
    println!("Distribution:");
    for (kind, count) in dataset.stats.ordered_distribution() {
        println!("  {kind}: {count}");
    }
    Ok(())
}

async fn handle_delete(owner: String, id: Uuid, db_url: Option<String>) -> Result<()> {
    let store = open_store(db_url).await?;
    store.delete_dataset(&owner, id).await?;
    println!("Deleted dataset {id}");
    Ok(())
}

async fn handle_report(
    owner: String,
    id: Uuid,
    output: Option<PathBuf>,
    db_url: Option<String>,
) -> Result<()> {
    let settings = config::load_app_config().settings;
    let store = open_store(db_url).await?;

    let artifact = pipeline::generate_report_sized(
        store.as_ref(),
        &owner,
        id,
        settings.chart_width,
        settings.chart_height,
    )
    .await?;

    let out_dir = output.unwrap_or(settings.report_dir);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create report directory: {}", out_dir.display()))?;
    let path = out_dir.join(&artifact.file_name);
    std::fs::write(&path, &artifact.bytes)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;

    println!("Report written to {}", path.display());
    println!("Suggested download name: {}", artifact.download_name);
    Ok(())
}
