//! Insert stage: fixed-size batches with duplicate-skipping
//!
//! Each batch runs in its own transaction and is attempted independently; a
//! failed batch is recorded with a small record sample and the run carries
//! on. Duplicates (by the email UNIQUE constraint) are skipped silently via
//! INSERT OR IGNORE, within and across batches, which also makes reruns
//! safe against double-insertion.

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::types::{BatchFailure, ImportOutcome, ImportRecord};

/// Reference batch size; overridable from the command line
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Load the normalized-record artifact produced by the parse stage
pub fn load_records(artifact: &Path) -> Result<Vec<ImportRecord>> {
    let json = std::fs::read_to_string(artifact).with_context(|| {
        format!(
            "Artifact not found: {} (run the convert stage first)",
            artifact.display()
        )
    })?;
    let records: Vec<ImportRecord> =
        serde_json::from_str(&json).context("Artifact is not a valid record list")?;
    Ok(records)
}

/// Insert records in batches, skipping duplicates, isolating batch failures
pub async fn run_import(
    pool: &SqlitePool,
    records: &[ImportRecord],
    batch_size: usize,
) -> Result<ImportOutcome> {
    let batch_size = batch_size.max(1);
    let total_batches = records.len().div_ceil(batch_size);

    info!(
        "Import configuration: {} records, batch size {}, {} batches",
        records.len(),
        batch_size,
        total_batches
    );

    let mut imported = 0u64;
    let mut failed = 0usize;
    let mut failures: Vec<BatchFailure> = Vec::new();

    for (index, batch) in records.chunks(batch_size).enumerate() {
        let batch_num = index + 1;
        match insert_batch(pool, batch).await {
            Ok(inserted) => {
                imported += inserted;
                info!(
                    "Batch {}/{}: {} inserted, {} duplicates skipped",
                    batch_num,
                    total_batches,
                    inserted,
                    batch.len() as u64 - inserted
                );
            }
            Err(e) => {
                failed += batch.len();
                let sample = batch
                    .iter()
                    .take(3)
                    .map(|r| format!("{}: {}", r.rank, r.contact_name))
                    .collect();
                error!("Batch {}/{} FAILED: {}", batch_num, total_batches, e);
                failures.push(BatchFailure {
                    batch: batch_num,
                    error: e.to_string(),
                    sample,
                });
            }
        }
    }

    let stored_total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
        .fetch_one(pool)
        .await?;

    info!(
        "Import summary: {} inserted, {} failed, {} contacts now in storage",
        imported, failed, stored_total
    );
    for failure in &failures {
        info!(
            "  batch {}: {} (sample: {})",
            failure.batch,
            failure.error,
            failure.sample.join(", ")
        );
    }

    Ok(ImportOutcome {
        imported,
        failed,
        batches: total_batches,
        failures,
        stored_total,
    })
}

/// Insert one batch inside a transaction
///
/// Returns the number of rows actually inserted; rows skipped by the email
/// UNIQUE constraint count as zero.
async fn insert_batch(pool: &SqlitePool, batch: &[ImportRecord]) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for record in batch {
        let pain_points = record
            .pain_points
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let ai_solutions = record
            .ai_solutions
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO contacts (
                rank, company, contact_name, email,
                phone, role, industry, tier,
                linkedin_url, website, lead_score,
                deep_research, pain_points, ai_solutions, status
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.rank)
        .bind(&record.company)
        .bind(&record.contact_name)
        .bind(&record.email)
        .bind(&record.phone)
        .bind(&record.role)
        .bind(&record.industry)
        .bind(&record.tier)
        .bind(&record.linkedin_url)
        .bind(&record.website)
        .bind(record.lead_score)
        .bind(&record.deep_research)
        .bind(pain_points)
        .bind(ai_solutions)
        .bind(&record.status)
        .execute(&mut *tx)
        .await?;

        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rank: i64, email: &str) -> ImportRecord {
        ImportRecord {
            rank,
            company: "Acme".to_string(),
            contact_name: format!("Contact {}", rank),
            email: email.to_string(),
            phone: None,
            role: None,
            industry: None,
            tier: None,
            linkedin_url: None,
            website: None,
            lead_score: None,
            deep_research: None,
            status: None,
            pain_points: None,
            ai_solutions: None,
        }
    }

    async fn test_pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .expect("connect");
        crm_common::db::create_schema(&pool).await.expect("schema");
        pool
    }

    #[tokio::test]
    async fn duplicates_are_skipped_not_errored() {
        let pool = test_pool().await;
        let records = vec![
            record(1, "a@example.com"),
            record(2, "b@example.com"),
            record(3, "a@example.com"), // duplicate email
        ];

        let outcome = run_import(&pool, &records, 2).await.expect("import");
        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.failed, 0);
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.stored_total, 2);
    }

    #[tokio::test]
    async fn rerun_inserts_nothing_new() {
        let pool = test_pool().await;
        let records = vec![record(1, "a@example.com"), record(2, "b@example.com")];

        let first = run_import(&pool, &records, 50).await.expect("first run");
        assert_eq!(first.imported, 2);

        let second = run_import(&pool, &records, 50).await.expect("second run");
        assert_eq!(second.imported, 0);
        assert_eq!(second.stored_total, 2);
    }

    #[tokio::test]
    async fn batch_count_rounds_up() {
        let pool = test_pool().await;
        let records: Vec<ImportRecord> = (1..=5)
            .map(|i| record(i, &format!("c{}@example.com", i)))
            .collect();

        let outcome = run_import(&pool, &records, 2).await.expect("import");
        assert_eq!(outcome.batches, 3);
        assert_eq!(outcome.imported, 5);
    }
}
