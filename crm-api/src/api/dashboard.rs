//! Dashboard aggregation endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::activities::ActivityWithContact;
use crate::error::ApiError;
use crate::AppState;

/// Query parameters for the dashboard
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
}

fn default_timeframe() -> String {
    "all".to_string()
}

/// Map a timeframe label to a created_at cutoff condition. Unknown labels
/// behave like "all".
fn timeframe_condition(timeframe: &str) -> Option<&'static str> {
    match timeframe {
        "today" => Some("created_at >= date('now')"),
        "week" => Some("created_at >= datetime('now', '-7 days')"),
        "month" => Some("created_at >= datetime('now', '-30 days')"),
        "year" => Some("created_at >= datetime('now', '-1 year')"),
        _ => None,
    }
}

/// Round to two decimal places for the rate fields
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A ratio as a percentage, 0 when the denominator is 0
fn rate_percent(numerator: i64, denominator: i64) -> f64 {
    if denominator > 0 {
        round2(numerator as f64 / denominator as f64 * 100.0)
    } else {
        0.0
    }
}

async fn count_where(state: &AppState, base: &str, cutoff: Option<&str>) -> Result<i64, ApiError> {
    let sql = match cutoff {
        Some(cond) => format!("{} AND {}", base, cond),
        None => base.to_string(),
    };
    Ok(sqlx::query_scalar(&sql).fetch_one(&state.db).await?)
}

async fn count_and_value_where(
    state: &AppState,
    base: &str,
    cutoff: Option<&str>,
) -> Result<(i64, f64), ApiError> {
    let sql = match cutoff {
        Some(cond) => format!("{} AND {}", base, cond),
        None => base.to_string(),
    };
    Ok(sqlx::query_as(&sql).fetch_one(&state.db).await?)
}

/// GET /api/dashboard
///
/// Aggregates contact/activity/deal counts for the requested timeframe and
/// derives conversion and close rates.
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<Value>, ApiError> {
    let cutoff = timeframe_condition(&params.timeframe);

    let total_contacts =
        count_where(&state, "SELECT COUNT(*) FROM contacts WHERE 1=1", cutoff).await?;

    let dms_sent = count_where(
        &state,
        "SELECT COUNT(*) FROM activities WHERE type IN ('dm', 'message', 'email')",
        cutoff,
    )
    .await?;

    let replies = count_where(
        &state,
        "SELECT COUNT(*) FROM activities WHERE type IN ('reply', 'response', 'received')",
        cutoff,
    )
    .await?;

    let (deals_closed, closed_value) = count_and_value_where(
        &state,
        "SELECT COUNT(*), COALESCE(SUM(value), 0.0) FROM deals WHERE status IN ('closed', 'won')",
        cutoff,
    )
    .await?;

    let (open_deals, open_value) = count_and_value_where(
        &state,
        "SELECT COUNT(*), COALESCE(SUM(value), 0.0) FROM deals WHERE status = 'open'",
        cutoff,
    )
    .await?;

    // Last 10 activities regardless of timeframe
    let recent_activities: Vec<ActivityWithContact> = sqlx::query_as(
        "SELECT a.*, c.contact_name, c.company, c.email
         FROM activities a
         LEFT JOIN contacts c ON a.contact_id = c.id
         ORDER BY a.created_at DESC
         LIMIT 10",
    )
    .fetch_all(&state.db)
    .await?;

    let conversion_rate = rate_percent(replies, dms_sent);
    let close_rate = rate_percent(deals_closed, deals_closed + open_deals);

    Ok(Json(json!({
        "success": true,
        "data": {
            "overview": {
                "totalContacts": total_contacts,
                "dmsSent": dms_sent,
                "replies": replies,
                "dealsClosed": deals_closed,
                "conversionRate": conversion_rate,
                "closeRate": close_rate,
            },
            "deals": {
                "closed": deals_closed,
                "open": open_deals,
                "totalValue": closed_value,
                "openValue": open_value,
            },
            "recentActivities": recent_activities,
            "timeframe": params.timeframe,
        },
    })))
}
