//! Contact endpoints: filtered listing, detail view, create and update

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::query::{execute_with, parse_id, parse_pagination, BindValue, PredicateList};
use crate::AppState;
use crm_common::db::{Activity, Contact, Deal};

/// Query parameters for the contact list
#[derive(Debug, Deserialize)]
pub struct ContactListQuery {
    /// Free-text search across name, company and email
    pub search: Option<String>,

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

/// GET /api/contacts
///
/// Returns contacts ordered by recency, optionally narrowed by a free-text
/// search. The pagination block is computed by a COUNT twin of the same
/// predicates.
pub async fn list_contacts(
    State(state): State<AppState>,
    Query(params): Query<ContactListQuery>,
) -> Result<Json<Value>, ApiError> {
    let (limit, offset) = parse_pagination(&params.limit, &params.offset)?;

    let mut predicates = PredicateList::new();
    if let Some(search) = params.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        predicates.push(
            "(contact_name LIKE ? OR company LIKE ? OR email LIKE ?)",
            [
                BindValue::Text(pattern.clone()),
                BindValue::Text(pattern.clone()),
                BindValue::Text(pattern),
            ],
        );
    }

    let list_sql = format!(
        "SELECT * FROM contacts{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        predicates.where_clause()
    );
    let rows: Vec<Contact> = predicates
        .fetch_all_as(
            &state.db,
            &list_sql,
            &[BindValue::Int(limit), BindValue::Int(offset)],
        )
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM contacts{}", predicates.where_clause());
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

/// GET /api/contacts/:id
///
/// Returns one contact with its activities and deals embedded.
pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id, "contact ID")?;

    let contact: Option<Contact> = sqlx::query_as("SELECT * FROM contacts WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let contact = contact.ok_or_else(|| ApiError::NotFound("Contact not found".to_string()))?;

    let activities: Vec<Activity> = sqlx::query_as(
        "SELECT * FROM activities WHERE contact_id = ? ORDER BY date DESC, created_at DESC",
    )
    .bind(id)
    .fetch_all(&state.db)
    .await?;

    let deals: Vec<Deal> =
        sqlx::query_as("SELECT * FROM deals WHERE contact_id = ? ORDER BY created_at DESC")
            .bind(id)
            .fetch_all(&state.db)
            .await?;

    let mut data = serde_json::to_value(contact)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize contact: {}", e)))?;
    data["activities"] = json!(activities);
    data["deals"] = json!(deals);

    Ok(Json(json!({
        "success": true,
        "data": data,
    })))
}

/// Request body for contact creation
#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub contact_name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub company_website: Option<String>,
    pub linkedin_url: Option<String>,
    pub activity_level: Option<String>,
    pub top_skills: Option<String>,
    pub email: Option<String>,
}

/// POST /api/contacts
///
/// Creates a contact. The duplicate-email pre-check is a fast path; the
/// UNIQUE constraint on insert is the authoritative rejection under races.
pub async fn create_contact(
    State(state): State<AppState>,
    Json(body): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let email = body
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email is required".to_string()))?;

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM contacts WHERE email = ?")
        .bind(email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "Contact with this email already exists".to_string(),
        ));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO contacts (
            contact_name, title, company, company_website,
            linkedin_url, activity_level, top_skills, email
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&body.contact_name)
    .bind(&body.title)
    .bind(&body.company)
    .bind(&body.company_website)
    .bind(&body.linkedin_url)
    .bind(&body.activity_level)
    .bind(&body.top_skills)
    .bind(email)
    .execute(&state.db)
    .await?;

    let created: Contact = sqlx::query_as("SELECT * FROM contacts WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&state.db)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Contact created successfully",
            "data": created,
        })),
    ))
}

/// Request body for contact update; absent fields are left untouched
#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    pub contact_name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub company_website: Option<String>,
    pub linkedin_url: Option<String>,
    pub activity_level: Option<String>,
    pub top_skills: Option<String>,
    pub email: Option<String>,
}

/// PUT /api/contacts/:id
///
/// Updates exactly the supplied fields. A request carrying no recognized
/// field is a client error, not a silent no-op, and does not touch
/// `updated_at`.
pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateContactRequest>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id, "contact ID")?;

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM contacts WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_none() {
        return Err(ApiError::NotFound("Contact not found".to_string()));
    }

    // If email is being changed, reject duplicates held by any other row
    if let Some(email) = &body.email {
        let clash: Option<i64> =
            sqlx::query_scalar("SELECT id FROM contacts WHERE email = ? AND id != ?")
                .bind(email)
                .bind(id)
                .fetch_optional(&state.db)
                .await?;
        if clash.is_some() {
            return Err(ApiError::Conflict(
                "Another contact with this email already exists".to_string(),
            ));
        }
    }

    let mut assignments: Vec<&str> = Vec::new();
    let mut binds: Vec<BindValue> = Vec::new();

    let recognized: [(&str, &Option<String>); 8] = [
        ("contact_name = ?", &body.contact_name),
        ("title = ?", &body.title),
        ("company = ?", &body.company),
        ("company_website = ?", &body.company_website),
        ("linkedin_url = ?", &body.linkedin_url),
        ("activity_level = ?", &body.activity_level),
        ("top_skills = ?", &body.top_skills),
        ("email = ?", &body.email),
    ];
    for (assignment, value) in recognized {
        if let Some(value) = value {
            assignments.push(assignment);
            binds.push(BindValue::Text(value.clone()));
        }
    }

    if assignments.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let sql = format!(
        "UPDATE contacts SET {}, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        assignments.join(", ")
    );
    binds.push(BindValue::Int(id));
    execute_with(&state.db, &sql, &binds).await?;

    let updated: Contact = sqlx::query_as("SELECT * FROM contacts WHERE id = ?")
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Contact updated successfully",
        "data": updated,
    })))
}
