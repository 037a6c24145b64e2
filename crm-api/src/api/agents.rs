//! AI-agent proxy endpoints
//!
//! These routes build a prompt from CRM data, make a single call to the
//! external completion API, and pass the generated text through in a flat
//! response shape (generated text, timestamp, model).

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::services::LlmClient;
use crate::AppState;

/// Request body for outreach personalization
#[derive(Debug, Deserialize)]
pub struct PersonalizeRequest {
    pub contact: Option<Value>,

    #[serde(default = "default_touch_number")]
    pub touch_number: u32,

    #[serde(default)]
    pub context: String,
}

fn default_touch_number() -> u32 {
    1
}

/// POST /api/ai-agents/personalize
///
/// Drafts outreach content for one contact at a given touch in the
/// 12-step sequence.
pub async fn personalize_outreach(
    State(state): State<AppState>,
    Json(body): Json<PersonalizeRequest>,
) -> Result<Json<Value>, ApiError> {
    let contact = body
        .contact
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("Contact information is required".to_string()))?;
    let llm = require_client(&state)?;

    let name = contact_display_name(contact);
    let company = text_field(contact, "company");
    let prompt = format!(
        "You are a sales personalization expert. Generate hyper-personalized \
         outreach content for this contact.\n\n\
         CONTACT INFORMATION:\n\
         - Name: {name}\n\
         - Company: {company}\n\
         - Email: {email}\n\
         - Role/Title: {title}\n\
         - Industry: {industry}\n\
         - Notes: {notes}\n\n\
         CAMPAIGN CONTEXT:\n\
         - Touch number: {touch} of 12\n\
         - Additional context: {context}\n\n\
         Generate for this touch: five subject line options specific to their \
         company and role, a personalized email body that leads with value, a \
         shorter LinkedIn message variant, and a follow-up strategy for the \
         next touch. Never be generic; always reference something specific \
         about their company or role.",
        name = name,
        company = company,
        email = text_field(contact, "email"),
        title = text_field(contact, "title"),
        industry = text_field(contact, "industry"),
        notes = text_field(contact, "notes"),
        touch = body.touch_number,
        context = body.context,
    );

    let generated = llm.complete(&prompt, 4000).await.map_err(ApiError::from)?;

    Ok(Json(json!({
        "touch_number": body.touch_number,
        "contact": {
            "name": name,
            "company": company,
        },
        "generated": generated,
        "timestamp": Utc::now().to_rfc3339(),
        "model": llm.model(),
    })))
}

/// Request body for parallel analysis
#[derive(Debug, Deserialize)]
pub struct AnalyzeParallelsRequest {
    #[serde(default)]
    pub contacts: Vec<Value>,
}

/// POST /api/ai-agents/analyze-parallels
///
/// Produces a cross-contact analysis report (industry clusters, shared pain
/// points, tier recommendations) over the submitted roster.
pub async fn analyze_parallels(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeParallelsRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.contacts.is_empty() {
        return Err(ApiError::BadRequest(
            "Contacts array is required".to_string(),
        ));
    }
    let llm = require_client(&state)?;

    let roster: String = body
        .contacts
        .iter()
        .enumerate()
        .map(|(i, contact)| {
            format!(
                "{}. {} | {} | {} | Industry: {} | Notes: {}",
                i + 1,
                contact_display_name(contact),
                text_field(contact, "company"),
                text_field(contact, "email"),
                text_field(contact, "industry"),
                text_field(contact, "notes"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "You are a sales intelligence analyst expert at finding deep \
         parallels, patterns, and hidden connections that maximize sales \
         opportunities.\n\n\
         CONTACT DATABASE ({count} contacts):\n\n{roster}\n\n\
         Analyze and provide: industry clusters and cross-sell \
         opportunities, geographic patterns, organizational size and \
         maturity patterns, hidden connections and referral chains, pain \
         point clustering, tier recommendations for outreach prioritization, \
         and parallel outreach campaign groupings with the contacts that fit \
         each campaign.",
        count = body.contacts.len(),
        roster = roster,
    );

    let analysis = llm.complete(&prompt, 8000).await.map_err(ApiError::from)?;

    Ok(Json(json!({
        "analysis": analysis,
        "contact_count": body.contacts.len(),
        "timestamp": Utc::now().to_rfc3339(),
        "model": llm.model(),
    })))
}

fn require_client(state: &AppState) -> Result<&Arc<LlmClient>, ApiError> {
    state.llm.as_ref().ok_or_else(|| {
        ApiError::Internal("Completion API key not configured (ANTHROPIC_API_KEY)".to_string())
    })
}

/// Best-effort display name: a stored contact carries `contact_name`, an
/// ad hoc payload may carry firstName/lastName instead
fn contact_display_name(contact: &Value) -> String {
    if let Some(name) = contact.get("contact_name").and_then(Value::as_str) {
        if !name.is_empty() {
            return name.to_string();
        }
    }
    let first = contact
        .get("firstName")
        .and_then(Value::as_str)
        .unwrap_or("");
    let last = contact
        .get("lastName")
        .and_then(Value::as_str)
        .unwrap_or("");
    let joined = format!("{} {}", first, last).trim().to_string();
    if joined.is_empty() {
        "Unknown".to_string()
    } else {
        joined
    }
}

fn text_field<'a>(contact: &'a Value, key: &str) -> &'a str {
    contact
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("Not specified")
}
