//! End-to-end tests for the import pipeline
//!
//! Drives a temp CSV source through convert, import and validate, checking
//! the counters and report the stages are contracted to produce.

use sqlx::SqlitePool;
use tempfile::TempDir;

use crm_common::db::init_database;
use crm_import::importer::{load_records, run_import};
use crm_import::parser::parse_source;
use crm_import::types::CheckStatus;
use crm_import::validator::{run_validation, write_report};

const CSV_HEADER: &str =
    "Rank,Company,Contact_Name,Email,Phone,Role,Industry,Tier,LinkedIn,Website,Lead_Score,Notes,Status";

fn write_source(dir: &TempDir, rows: &[&str]) -> std::path::PathBuf {
    let path = dir.path().join("source.csv");
    let mut content = String::from(CSV_HEADER);
    for row in rows {
        content.push('\n');
        content.push_str(row);
    }
    std::fs::write(&path, content).expect("Should write source CSV");
    path
}

async fn temp_db(dir: &TempDir) -> SqlitePool {
    init_database(&dir.path().join("crm.db"))
        .await
        .expect("Should init database")
}

#[tokio::test]
async fn pipeline_drops_bad_rows_and_skips_duplicates() {
    let dir = TempDir::new().unwrap();
    let source = write_source(
        &dir,
        &[
            "1,Acme Corp,Alice,alice@acme.example,,CEO,Healthcare,A - Enterprise,,,90,Deep research note,active",
            "2,Beta LLC,Bob,bob@beta.example,555-0101,CTO,,,,,,,",
            // Duplicate email: parsed fine, skipped at insert time
            "3,Gamma Inc,Carol,alice@acme.example,,,,,,,,,",
            // Missing rank: dropped at parse time, counted as an error
            ",NoRank Co,Dave,dave@norank.example,,,,,,,,,",
            "5,Delta,Eve,eve@delta.example,,,Retail,B - Mid-Market,,,70,,",
        ],
    );
    let artifact = dir.path().join("import.json");

    // Parse stage: one row dropped, the rest normalized
    let outcome = parse_source(&source, &artifact).expect("Should parse");
    assert_eq!(outcome.rows_read, 5);
    assert_eq!(outcome.error_rows, 1);
    assert_eq!(outcome.records.len(), 4);
    assert!(
        !outcome.records.iter().any(|r| r.email == "dave@norank.example"),
        "dropped row must not reach the artifact"
    );

    // Derivation rules applied during parse
    let alice = &outcome.records[0];
    assert_eq!(
        alice.pain_points.clone().unwrap(),
        vec!["Industry-specific challenges in Healthcare"]
    );
    assert_eq!(alice.ai_solutions.as_ref().unwrap().len(), 3);

    // Import stage: duplicate email silently skipped, not errored
    let records = load_records(&artifact).expect("Should load artifact");
    assert_eq!(records.len(), 4);

    let pool = temp_db(&dir).await;
    let outcome = run_import(&pool, &records, 2).await.expect("Should import");
    assert_eq!(outcome.batches, 2);
    assert_eq!(outcome.imported, 3);
    assert_eq!(outcome.failed, 0);
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.stored_total, 3);

    // Validate stage: count matches when expected = unique-by-email rows
    let report = run_validation(&pool, 3).await.expect("Should validate");
    assert!(!report.has_failures());

    let count_check = report
        .checks
        .iter()
        .find(|c| c.name == "Total Contact Count")
        .unwrap();
    assert_eq!(count_check.status, CheckStatus::Pass);

    // Ranks are 1, 2, 5: the range check degrades to WARNING, never FAIL
    let range_check = report.checks.iter().find(|c| c.name == "Rank Range").unwrap();
    assert_eq!(range_check.status, CheckStatus::Warning);
    assert_eq!(report.warnings.len(), 1);

    // Report artifact round-trips as JSON
    let report_path = dir.path().join("validation-report.json");
    write_report(&report, &report_path).expect("Should write report");
    let raw = std::fs::read_to_string(&report_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(parsed["checks"].as_array().unwrap().len() >= 7);
    assert!(parsed["timestamp"].is_string());
}

#[tokio::test]
async fn missing_artifact_is_fatal() {
    let dir = TempDir::new().unwrap();
    let err = load_records(&dir.path().join("does-not-exist.json")).unwrap_err();
    assert!(err.to_string().contains("Artifact not found"));
}

#[tokio::test]
async fn duplicated_rank_fails_validation_listing_the_value() {
    let dir = TempDir::new().unwrap();
    let pool = temp_db(&dir).await;

    for (rank, email) in [(1, "a@x.example"), (7, "b@x.example"), (7, "c@x.example")] {
        sqlx::query(
            "INSERT INTO contacts (rank, company, contact_name, email) VALUES (?, 'Co', 'Name', ?)",
        )
        .bind(rank)
        .bind(email)
        .execute(&pool)
        .await
        .unwrap();
    }

    let report = run_validation(&pool, 3).await.expect("Should validate");
    assert!(report.has_failures());

    let unique_check = report
        .checks
        .iter()
        .find(|c| c.name == "Unique Ranks")
        .unwrap();
    assert_eq!(unique_check.status, CheckStatus::Fail);
    // Exactly the duplicated value, nothing else
    assert_eq!(unique_check.actual, serde_json::json!([7]));
}

#[tokio::test]
async fn rerun_after_partial_state_adds_nothing_for_existing_emails() {
    let dir = TempDir::new().unwrap();
    let source = write_source(
        &dir,
        &[
            "1,Acme,Alice,alice@acme.example,,,,,,,,,",
            "2,Beta,Bob,bob@beta.example,,,,,,,,,",
        ],
    );
    let artifact = dir.path().join("import.json");
    parse_source(&source, &artifact).expect("Should parse");
    let records = load_records(&artifact).expect("Should load");

    let pool = temp_db(&dir).await;
    let first = run_import(&pool, &records, 50).await.unwrap();
    assert_eq!(first.imported, 2);

    // Rerunning the same artifact is duplicate-skip safe
    let second = run_import(&pool, &records, 50).await.unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(second.stored_total, 2);
}
