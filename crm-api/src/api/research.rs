//! AI research record endpoints: submission and per-contact listing
//!
//! Research payloads are stored as serialized JSON and parsed back into
//! structured values on the way out.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::query::{parse_id, BindValue, PredicateList};
use crate::AppState;
use crm_common::db::AiResearch;

/// Request body for research submission
#[derive(Debug, Deserialize)]
pub struct SubmitResearchRequest {
    pub contact_id: Option<i64>,
    pub research_type: Option<String>,
    pub research_data: Option<Value>,
    pub summary: Option<String>,
    pub confidence_score: Option<f64>,
    pub sources: Option<Value>,
    pub metadata: Option<Value>,
}

/// POST /api/ai-agents/research
///
/// Persists a research record and logs a companion `ai_research` activity
/// for the contact's timeline.
pub async fn submit_research(
    State(state): State<AppState>,
    Json(body): Json<SubmitResearchRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let contact_id = body
        .contact_id
        .ok_or_else(|| ApiError::BadRequest("contact_id is required".to_string()))?;
    let research_data = body
        .research_data
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("research_data is required".to_string()))?;

    let contact: Option<(i64, Option<String>, Option<String>)> =
        sqlx::query_as("SELECT id, contact_name, company FROM contacts WHERE id = ?")
            .bind(contact_id)
            .fetch_optional(&state.db)
            .await?;
    let (contact_id, contact_name, company) =
        contact.ok_or_else(|| ApiError::NotFound("Contact not found".to_string()))?;

    let research_type = body.research_type.as_deref().unwrap_or("general");

    let result = sqlx::query(
        r#"
        INSERT INTO ai_research (
            contact_id, research_type, research_data,
            summary, confidence_score, sources, metadata
        )
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(contact_id)
    .bind(research_type)
    .bind(research_data.to_string())
    .bind(&body.summary)
    .bind(body.confidence_score)
    .bind(body.sources.as_ref().map(|v| v.to_string()))
    .bind(body.metadata.as_ref().map(|v| v.to_string()))
    .execute(&state.db)
    .await?;

    // Log the research on the contact's activity timeline
    sqlx::query(
        r#"
        INSERT INTO activities (contact_id, type, description, notes)
        VALUES (?, 'ai_research', ?, ?)
        "#,
    )
    .bind(contact_id)
    .bind(format!("AI agent completed {} research", research_type))
    .bind(
        body.summary
            .as_deref()
            .unwrap_or("AI research data submitted"),
    )
    .execute(&state.db)
    .await?;

    let created: AiResearch = sqlx::query_as("SELECT * FROM ai_research WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    let mut data = research_to_value(&created)?;
    data["contact"] = json!({
        "id": contact_id,
        "name": contact_name,
        "company": company,
    });

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Research data submitted successfully",
            "data": data,
        })),
    ))
}

/// Query parameters for the research list
#[derive(Debug, Deserialize)]
pub struct ResearchListQuery {
    pub contact_id: Option<String>,
    pub research_type: Option<String>,

    #[serde(default = "default_limit")]
    pub limit: String,
}

fn default_limit() -> String {
    "50".to_string()
}

/// GET /api/ai-agents/research
///
/// Lists research records for one contact, newest first.
pub async fn list_research(
    State(state): State<AppState>,
    Query(params): Query<ResearchListQuery>,
) -> Result<Json<Value>, ApiError> {
    let contact_id = params
        .contact_id
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("contact_id is required".to_string()))?;
    let contact_id = parse_id(contact_id, "contact_id")?;

    let limit: i64 = params
        .limit
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid limit parameter: {}", params.limit)))?;

    let contact: Option<i64> = sqlx::query_scalar("SELECT id FROM contacts WHERE id = ?")
        .bind(contact_id)
        .fetch_optional(&state.db)
        .await?;
    if contact.is_none() {
        return Err(ApiError::NotFound("Contact not found".to_string()));
    }

    let mut predicates = PredicateList::new();
    predicates.push("contact_id = ?", [BindValue::Int(contact_id)]);
    if let Some(research_type) = params.research_type.clone() {
        predicates.push("research_type = ?", [BindValue::Text(research_type)]);
    }

    let sql = format!(
        "SELECT * FROM ai_research{} ORDER BY created_at DESC, id DESC LIMIT ?",
        predicates.where_clause()
    );
    let rows: Vec<AiResearch> = predicates
        .fetch_all_as(&state.db, &sql, &[BindValue::Int(limit)])
        .await?;

    let data: Vec<Value> = rows
        .iter()
        .map(research_to_value)
        .collect::<Result<_, _>>()?;

    Ok(Json(json!({
        "success": true,
        "data": data,
    })))
}

/// Serialize a research row with its JSON text columns parsed back into
/// structured values
fn research_to_value(row: &AiResearch) -> Result<Value, ApiError> {
    let mut value = serde_json::to_value(row)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize research row: {}", e)))?;
    value["research_data"] = parse_json_column(Some(&row.research_data));
    value["sources"] = parse_json_column(row.sources.as_ref());
    value["metadata"] = parse_json_column(row.metadata.as_ref());
    Ok(value)
}

/// Parse a stored JSON column, falling back to the raw text if it was not
/// valid JSON (legacy rows)
fn parse_json_column(raw: Option<&String>) -> Value {
    match raw {
        Some(text) => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
        }
        None => Value::Null,
    }
}
