//! Activity endpoints: filtered listing and creation

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
use crm_common::db::Activity;

/// Query parameters for the activity list
#[derive(Debug, Deserialize)]
pub struct ActivityListQuery {
    pub contact_id: Option<String>,

    #[serde(rename = "type")]
    pub kind: Option<String>,

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

/// Activity row joined with its owning contact
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ActivityWithContact {
    pub id: i64,
    pub contact_id: Option<i64>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub description: Option<String>,
    pub date: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub contact_name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
}

/// GET /api/activities
///
/// Ordered by occurrence date, then creation time, both descending.
pub async fn list_activities(
    State(state): State<AppState>,
    Query(params): Query<ActivityListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (limit, offset) = parse_pagination(&params.limit, &params.offset)?;

    let mut predicates = PredicateList::new();
    if let Some(contact_id) = params.contact_id.as_deref() {
        let contact_id = parse_id(contact_id, "contact_id")?;
        predicates.push("a.contact_id = ?", [BindValue::Int(contact_id)]);
    }
    if let Some(kind) = params.kind.clone() {
        predicates.push("a.type = ?", [BindValue::Text(kind)]);
    }

    let list_sql = format!(
        "SELECT a.*, c.contact_name, c.company, c.email
         FROM activities a
         LEFT JOIN contacts c ON a.contact_id = c.id{}
         ORDER BY a.date DESC, a.created_at DESC
         LIMIT ? OFFSET ?",
        predicates.where_clause()
    );
    let rows: Vec<ActivityWithContact> = predicates
        .fetch_all_as(
            &state.db,
            &list_sql,
            &[BindValue::Int(limit), BindValue::Int(offset)],
        )
        .await?;

    let count_sql = format!(
        "SELECT COUNT(*) FROM activities a LEFT JOIN contacts c ON a.contact_id = c.id{}",
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

/// Request body for activity creation
#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    pub contact_id: Option<i64>,

    #[serde(rename = "type")]
    pub kind: Option<String>,

    pub description: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

/// POST /api/activities
///
/// Requires contact_id and type; the owning contact must exist. A missing
/// date defaults to now.
pub async fn create_activity(
    State(state): State<AppState>,
    Json(body): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let contact_id = body
        .contact_id
        .ok_or_else(|| ApiError::BadRequest("contact_id is required".to_string()))?;
    let kind = body
        .kind
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Activity type is required".to_string()))?;

    let contact: Option<i64> = sqlx::query_scalar("SELECT id FROM contacts WHERE id = ?")
        .bind(contact_id)
        .fetch_optional(&state.db)
        .await?;
    if contact.is_none() {
        return Err(ApiError::NotFound("Contact not found".to_string()));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO activities (contact_id, type, description, date, notes)
        VALUES (?, ?, ?, COALESCE(?, CURRENT_TIMESTAMP), ?)
        "#,
    )
    .bind(contact_id)
    .bind(kind)
    .bind(&body.description)
    .bind(&body.date)
    .bind(&body.notes)
    .execute(&state.db)
    .await?;

    let created: Activity = sqlx::query_as("SELECT * FROM activities WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Activity created successfully",
            "data": created,
        })),
    ))
}
