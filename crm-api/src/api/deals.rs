//! Deal endpoints: filtered listing and creation

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::query::{parse_id, parse_pagination, BindValue, PredicateList};
use crate::AppState;
use crm_common::db::Deal;

/// Query parameters for the deal list
#[derive(Debug, Deserialize)]
pub struct DealListQuery {
    pub contact_id: Option<String>,
    pub stage: Option<String>,
    pub status: Option<String>,

    #[serde(default = "default_limit")]
    pub limit: String,

    #[serde(default = "default_offset")]
    pub offset: String,
}

fn default_limit() -> String {
    "100".to_string()
}

fn default_offset() -> String {
    "0".to_string()
}

/// Deal row joined with its owning contact (LEFT JOIN, so deals survive a
/// missing contact reference)
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DealWithContact {
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
    pub contact_name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
}

/// GET /api/deals
///
/// Optional filters (contact_id, stage, status) combine conjunctively; the
/// COUNT twin reuses the same predicates for the pagination block.
pub async fn list_deals(
    State(state): State<AppState>,
    Query(params): Query<DealListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (limit, offset) = parse_pagination(&params.limit, &params.offset)?;

    let mut predicates = PredicateList::new();
    if let Some(contact_id) = params.contact_id.as_deref() {
        let contact_id = parse_id(contact_id, "contact_id")?;
        predicates.push("d.contact_id = ?", [BindValue::Int(contact_id)]);
    }
    if let Some(stage) = params.stage.clone() {
        predicates.push("d.stage = ?", [BindValue::Text(stage)]);
    }
    if let Some(status) = params.status.clone() {
        predicates.push("d.status = ?", [BindValue::Text(status)]);
    }

    let list_sql = format!(
        "SELECT d.*, c.contact_name, c.company, c.email
         FROM deals d
         LEFT JOIN contacts c ON d.contact_id = c.id{}
         ORDER BY d.created_at DESC, d.id DESC
         LIMIT ? OFFSET ?",
        predicates.where_clause()
    );
    let rows: Vec<DealWithContact> = predicates
        .fetch_all_as(
            &state.db,
            &list_sql,
            &[BindValue::Int(limit), BindValue::Int(offset)],
        )
        .await?;

    let count_sql = format!(
        "SELECT COUNT(*) FROM deals d LEFT JOIN contacts c ON d.contact_id = c.id{}",
        predicates.where_clause()
    );
    let total = predicates.fetch_count(&state.db, &count_sql).await?;

    Ok(Json(json!({
        "success": true,
        "data": rows,
        "pagination": {
            "total": total,
            "limit": limit,
            "offset": offset,
        },
    })))
}

/// Request body for deal creation
#[derive(Debug, Deserialize)]
pub struct CreateDealRequest {
    pub contact_id: Option<i64>,
    pub title: Option<String>,
    pub value: Option<f64>,
    pub stage: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub expected_close_date: Option<String>,
}

/// POST /api/deals
///
/// Requires contact_id and title; the owning contact must exist before the
/// insert is attempted.
pub async fn create_deal(
    State(state): State<AppState>,
    Json(body): Json<CreateDealRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let contact_id = body
        .contact_id
        .ok_or_else(|| ApiError::BadRequest("contact_id is required".to_string()))?;
    let title = body
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Deal title is required".to_string()))?;

    let contact: Option<i64> = sqlx::query_scalar("SELECT id FROM contacts WHERE id = ?")
        .bind(contact_id)
        .fetch_optional(&state.db)
        .await?;
    if contact.is_none() {
        return Err(ApiError::NotFound("Contact not found".to_string()));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO deals (contact_id, title, value, stage, status, description, expected_close_date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(contact_id)
    .bind(title)
    .bind(body.value.unwrap_or(0.0))
    .bind(body.stage.as_deref().unwrap_or("prospecting"))
    .bind(body.status.as_deref().unwrap_or("open"))
    .bind(&body.description)
    .bind(&body.expected_close_date)
    .execute(&state.db)
    .await?;

    let created: Deal = sqlx::query_as("SELECT * FROM deals WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Deal created successfully",
            "data": created,
        })),
    ))
}
