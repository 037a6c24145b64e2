//! Parse stage: delimited source file to normalized import records
//!
//! Streams the source row by row. A row missing any required field is
//! dropped and counted, never fatal for the run; only an unreadable source
//! file aborts.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::types::{ImportRecord, ParseOutcome};

/// One raw source row, keyed by the source's column headers
#[derive(Debug, Default, Deserialize)]
pub struct SourceRow {
    #[serde(rename = "Rank")]
    pub rank: Option<String>,
    #[serde(rename = "Company")]
    pub company: Option<String>,
    #[serde(rename = "Contact_Name")]
    pub contact_name: Option<String>,
    #[serde(rename = "Email")]
    pub email: Option<String>,
    #[serde(rename = "Phone")]
    pub phone: Option<String>,
    #[serde(rename = "Role")]
    pub role: Option<String>,
    #[serde(rename = "Industry")]
    pub industry: Option<String>,
    #[serde(rename = "Tier")]
    pub tier: Option<String>,
    #[serde(rename = "LinkedIn")]
    pub linkedin_url: Option<String>,
    #[serde(rename = "Website")]
    pub website: Option<String>,
    #[serde(rename = "Lead_Score")]
    pub lead_score: Option<String>,
    #[serde(rename = "Notes")]
    pub deep_research: Option<String>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
}

/// Parse the source file and write the normalized-record artifact
pub fn parse_source(source: &Path, artifact: &Path) -> Result<ParseOutcome> {
    info!("Reading source file: {}", source.display());

    let mut reader = csv::Reader::from_path(source)
        .with_context(|| format!("Failed to open source file {}", source.display()))?;

    let mut records = Vec::new();
    let mut rows_read = 0usize;
    let mut error_rows = 0usize;

    for row in reader.deserialize::<SourceRow>() {
        rows_read += 1;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Row {}: unreadable ({})", rows_read, e);
                error_rows += 1;
                continue;
            }
        };

        match normalize_row(row) {
            Ok(record) => {
                records.push(record);
                if records.len() % 50 == 0 {
                    info!("Processed {} contacts...", records.len());
                }
            }
            Err(reason) => {
                warn!("Row {}: dropped ({})", rows_read, reason);
                error_rows += 1;
            }
        }
    }

    let json = serde_json::to_string_pretty(&records)?;
    std::fs::write(artifact, json)
        .with_context(|| format!("Failed to write artifact {}", artifact.display()))?;

    info!(
        "Conversion complete: {} rows read, {} valid records, {} errors",
        rows_read,
        records.len(),
        error_rows
    );
    info!("Artifact written: {}", artifact.display());

    Ok(ParseOutcome {
        records,
        rows_read,
        error_rows,
    })
}

/// Normalize one source row, or explain why it must be dropped
pub fn normalize_row(row: SourceRow) -> std::result::Result<ImportRecord, String> {
    let rank = match row.rank.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => raw
            .parse::<i64>()
            .map_err(|_| format!("non-numeric rank {:?}", raw))?,
        _ => return Err("missing rank".to_string()),
    };

    let company = required(row.company, "company")?;
    let contact_name = required(row.contact_name, "contact_name")?;
    let email = required(row.email, "email")?;

    let industry = optional(row.industry);
    let tier = optional(row.tier);

    let pain_points = derive_pain_points(industry.as_deref());
    let ai_solutions = derive_ai_solutions(tier.as_deref(), industry.as_deref());

    Ok(ImportRecord {
        rank,
        company,
        contact_name,
        email,
        phone: optional(row.phone),
        role: optional(row.role),
        industry,
        tier,
        linkedin_url: optional(row.linkedin_url),
        website: optional(row.website),
        lead_score: row
            .lead_score
            .as_deref()
            .map(str::trim)
            .and_then(|s| s.parse::<i64>().ok()),
        deep_research: optional(row.deep_research),
        status: optional(row.status),
        pain_points,
        ai_solutions,
    })
}

fn required(value: Option<String>, field: &str) -> std::result::Result<String, String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("missing {}", field)),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Pain points derived from the industry field (business heuristic)
fn derive_pain_points(industry: Option<&str>) -> Option<Vec<String>> {
    industry.map(|industry| vec![format!("Industry-specific challenges in {}", industry)])
}

/// AI-solution suggestions derived from tier and industry (business
/// heuristic): enterprise and mid-market tiers get two automation
/// suggestions, any industry gets one tailored suggestion
fn derive_ai_solutions(tier: Option<&str>, industry: Option<&str>) -> Option<Vec<String>> {
    let mut solutions = Vec::new();

    if matches!(tier, Some("A - Enterprise") | Some("B - Mid-Market")) {
        solutions.push("Predictive analytics for data-driven decisions".to_string());
        solutions.push("Process automation to reduce manual tasks".to_string());
    }
    if let Some(industry) = industry {
        solutions.push(format!("AI-powered solutions tailored for {}", industry));
    }

    if solutions.is_empty() {
        None
    } else {
        Some(solutions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_row() -> SourceRow {
        SourceRow {
            rank: Some("7".to_string()),
            company: Some("Acme Corp".to_string()),
            contact_name: Some("Jo Smith".to_string()),
            email: Some("jo@acme.example".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_row_normalizes() {
        let record = normalize_row(valid_row()).unwrap();
        assert_eq!(record.rank, 7);
        assert_eq!(record.company, "Acme Corp");
        assert_eq!(record.email, "jo@acme.example");
        assert!(record.pain_points.is_none());
        assert!(record.ai_solutions.is_none());
    }

    #[test]
    fn row_missing_rank_is_dropped() {
        let mut row = valid_row();
        row.rank = None;
        assert_eq!(normalize_row(row).unwrap_err(), "missing rank");
    }

    #[test]
    fn non_numeric_rank_is_a_row_error() {
        let mut row = valid_row();
        row.rank = Some("first".to_string());
        assert!(normalize_row(row).unwrap_err().contains("non-numeric rank"));
    }

    #[test]
    fn row_missing_email_is_dropped() {
        let mut row = valid_row();
        row.email = Some("   ".to_string());
        assert_eq!(normalize_row(row).unwrap_err(), "missing email");
    }

    #[test]
    fn bad_lead_score_becomes_none() {
        let mut row = valid_row();
        row.lead_score = Some("high".to_string());
        assert!(normalize_row(row).unwrap().lead_score.is_none());
    }

    #[test]
    fn industry_drives_pain_points_and_a_tailored_solution() {
        let mut row = valid_row();
        row.industry = Some("Healthcare".to_string());
        let record = normalize_row(row).unwrap();
        assert_eq!(
            record.pain_points.unwrap(),
            vec!["Industry-specific challenges in Healthcare"]
        );
        assert_eq!(
            record.ai_solutions.unwrap(),
            vec!["AI-powered solutions tailored for Healthcare"]
        );
    }

    #[test]
    fn enterprise_tier_gets_two_automation_suggestions() {
        let mut row = valid_row();
        row.tier = Some("A - Enterprise".to_string());
        let solutions = normalize_row(row).unwrap().ai_solutions.unwrap();
        assert_eq!(solutions.len(), 2);
    }

    #[test]
    fn mid_market_tier_plus_industry_gets_three_suggestions() {
        let mut row = valid_row();
        row.tier = Some("B - Mid-Market".to_string());
        row.industry = Some("Retail".to_string());
        let solutions = normalize_row(row).unwrap().ai_solutions.unwrap();
        assert_eq!(solutions.len(), 3);
    }

    #[test]
    fn standard_tier_alone_derives_nothing() {
        let mut row = valid_row();
        row.tier = Some("C - Small".to_string());
        assert!(normalize_row(row).unwrap().ai_solutions.is_none());
    }
}
