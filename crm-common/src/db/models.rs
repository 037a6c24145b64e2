//! Database row models

use serde::{Deserialize, Serialize};

/// A contact row
///
/// The import-era columns (rank, phone, tier, ...) are populated by the bulk
/// import pipeline; API-created contacts leave them NULL.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    pub id: i64,
    pub contact_name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub company_website: Option<String>,
    pub linkedin_url: Option<String>,
    pub activity_level: Option<String>,
    pub top_skills: Option<String>,
    pub email: String,
    pub rank: Option<i64>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub industry: Option<String>,
    pub tier: Option<String>,
    pub website: Option<String>,
    pub lead_score: Option<i64>,
    pub deep_research: Option<String>,
    /// Serialized JSON array of pain-point notes
    pub pain_points: Option<String>,
    /// Serialized JSON array of AI-solution suggestions
    pub ai_solutions: Option<String>,
    pub status: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A deal row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Deal {
    pub id: i64,
    pub contact_id: Option<i64>,
    pub title: String,
    pub value: f64,
    pub stage: String,
    pub status: String,
    pub description: Option<String>,
    pub expected_close_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// An activity row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Activity {
    pub id: i64,
    pub contact_id: Option<i64>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub date: String,
    pub notes: Option<String>,
    pub created_at: String,
}

/// An AI research row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AiResearch {
    pub id: i64,
    pub contact_id: Option<i64>,
    pub research_type: String,
    /// Serialized JSON payload as submitted
    pub research_data: String,
    pub summary: Option<String>,
    pub confidence_score: Option<f64>,
    /// Serialized JSON array of source references
    pub sources: Option<String>,
    /// Serialized JSON object of free-form metadata
    pub metadata: Option<String>,
    pub created_at: String,
}
