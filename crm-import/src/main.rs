//! crm-import - Bulk contact import pipeline
//!
//! Offline three-stage pipeline: convert (CSV to normalized records),
//! import (batched inserts with duplicate-skipping), validate (integrity
//! checks and report artifact). Stages run independently so a failed stage
//! can be rerun without repeating the others.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crm_common::config::{database_path, resolve_root_folder, TomlConfig};
use crm_common::db::init_database;
use crm_import::importer::{self, DEFAULT_BATCH_SIZE};
use crm_import::parser;
use crm_import::validator;

/// Command-line arguments for crm-import
#[derive(Parser, Debug)]
#[command(name = "crm-import")]
#[command(about = "Bulk contact import pipeline")]
#[command(version)]
struct Args {
    /// Root folder containing the CRM database and pipeline artifacts
    #[arg(short, long)]
    root_folder: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse the CSV source into the normalized-record artifact
    Convert {
        /// Path to the delimited source file
        #[arg(long)]
        source: PathBuf,

        /// Artifact path (defaults to import.json in the root folder)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Insert the normalized records in batches
    Import {
        /// Artifact path (defaults to import.json in the root folder)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Records per batch
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Run integrity checks and write the validation report
    Validate {
        /// Expected number of imported contacts
        #[arg(long, default_value_t = 350)]
        expected: i64,

        /// Report path (defaults to validation-report.json in the root folder)
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting CRM Import (crm-import) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let toml_config = TomlConfig::load();
    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &toml_config);

    match args.command {
        Command::Convert { source, output } => {
            let artifact = output.unwrap_or_else(|| root_folder.join("import.json"));
            std::fs::create_dir_all(&root_folder)?;
            let outcome = parser::parse_source(&source, &artifact)?;
            if outcome.records.is_empty() {
                bail!("No valid records in {}", source.display());
            }
        }
        Command::Import { input, batch_size } => {
            let artifact = input.unwrap_or_else(|| root_folder.join("import.json"));
            let records = importer::load_records(&artifact)?;
            info!("Loaded {} records from {}", records.len(), artifact.display());

            let db_path = database_path(&root_folder)?;
            let pool = init_database(&db_path).await?;
            info!("✓ Connected to database");

            let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
                .fetch_one(&pool)
                .await?;
            if existing > 0 {
                info!(
                    "Database already holds {} contacts; duplicates will be skipped",
                    existing
                );
            }

            let outcome = importer::run_import(&pool, &records, batch_size).await?;
            if !outcome.failures.is_empty() {
                bail!("{} of {} batches failed", outcome.failures.len(), outcome.batches);
            }
        }
        Command::Validate { expected, report } => {
            let report_path =
                report.unwrap_or_else(|| root_folder.join("validation-report.json"));

            let db_path = database_path(&root_folder)?;
            let pool = init_database(&db_path).await?;
            info!("✓ Connected to database");

            let result = validator::run_validation(&pool, expected).await?;
            validator::write_report(&result, &report_path)?;
            if result.has_failures() {
                bail!("Validation failed with {} errors", result.failed());
            }
            info!("✓ Validation passed; data integrity verified");
        }
    }

    Ok(())
}
