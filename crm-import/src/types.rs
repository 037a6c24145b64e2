//! Shared types and data contracts between the pipeline stages

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A normalized import record, derived from one source row
///
/// rank, company, contact_name and email are required; a source row missing
/// any of them is dropped by the parse stage and counted as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRecord {
    pub rank: i64,
    pub company: String,
    pub contact_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub industry: Option<String>,
    pub tier: Option<String>,
    pub linkedin_url: Option<String>,
    pub website: Option<String>,
    pub lead_score: Option<i64>,
    pub deep_research: Option<String>,
    pub status: Option<String>,
    /// Derived pain-point notes (None when no rule fired)
    pub pain_points: Option<Vec<String>>,
    /// Derived AI-solution suggestions (None when no rule fired)
    pub ai_solutions: Option<Vec<String>>,
}

/// Outcome of the parse stage
#[derive(Debug)]
pub struct ParseOutcome {
    pub records: Vec<ImportRecord>,
    /// Source rows read, valid or not
    pub rows_read: usize,
    /// Rows dropped for missing/invalid required fields
    pub error_rows: usize,
}

/// One failed batch with diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    /// 1-indexed batch number
    pub batch: usize,
    pub error: String,
    /// First few member records, "rank: contact_name"
    pub sample: Vec<String>,
}

/// Outcome of the insert stage
#[derive(Debug)]
pub struct ImportOutcome {
    /// Rows actually inserted (duplicates skipped are not counted)
    pub imported: u64,
    /// Records in batches that failed outright
    pub failed: usize,
    pub batches: usize,
    pub failures: Vec<BatchFailure>,
    /// Contact rows in storage after the run
    pub stored_total: i64,
}

/// Status of one validation check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warning,
    Info,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "PASS"),
            CheckStatus::Fail => write!(f, "FAIL"),
            CheckStatus::Warning => write!(f, "WARNING"),
            CheckStatus::Info => write!(f, "INFO"),
        }
    }
}

/// One validation check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub expected: Value,
    pub actual: Value,
    pub status: CheckStatus,
}

/// Structured validation report, persisted as a JSON artifact
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationReport {
    pub run_id: Uuid,
    pub timestamp: String,
    pub checks: Vec<CheckResult>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn passed(&self) -> usize {
        self.count(CheckStatus::Pass)
    }

    pub fn failed(&self) -> usize {
        self.count(CheckStatus::Fail)
    }

    pub fn warned(&self) -> usize {
        self.count(CheckStatus::Warning)
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }
}
