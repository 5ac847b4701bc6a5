use crate::domain::models::{Recommendation, Session, Task};
use crate::error::ApiError;
use crate::state::SharedState;
use crate::time_utils;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

fn default_range() -> String {
    time_utils::DEFAULT_RANGE.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    pub user_id: i64,
    #[serde(default = "default_range")]
    pub range: String,
    #[serde(default)]
    pub now: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub generated_at: String,
    pub range: String,
    pub recommendations: Vec<Recommendation>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/recommendations", post(create_recommendations))
        .with_state(state)
}

async fn create_recommendations(
    State(state): State<SharedState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let Json(request) = payload?;

    let now = match time_utils::parse_iso(request.now.as_deref()) {
        Some(now) => now,
        None => {
            if let Some(raw) = request.now.as_deref().filter(|raw| !raw.is_empty()) {
                tracing::debug!("Unparseable now {:?}, using wall clock", raw);
            }
            Utc::now()
        }
    };

    let recommendations = state
        .engine
        .recommend(now, &request.range, &request.tasks, &request.sessions);

    tracing::debug!(
        user_id = request.user_id,
        tasks = request.tasks.len(),
        sessions = request.sessions.len(),
        recommended = recommendations.len(),
        top_reason = recommendations
            .first()
            .and_then(|rec| rec.reasons.first())
            .map(|reason| reason.as_str())
            .unwrap_or("-"),
        "Scored recommendations"
    );

    Ok(Json(RecommendResponse {
        generated_at: time_utils::format_utc(now),
        range: request.range,
        recommendations,
    }))
}
