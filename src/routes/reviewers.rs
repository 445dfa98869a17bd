use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;
use serde_json::json;

use crate::models::SuggestReviewersInput;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestReviewersBody {
    paper_abstract: Option<String>,
    paper_keywords: Option<String>,
    conference_name: Option<String>,
}

pub fn reviewers_routes() -> Router<AppState> {
    Router::new().route("/suggest", post(suggest_reviewers))
}

async fn suggest_reviewers(
    State(state): State<AppState>,
    Json(body): Json<SuggestReviewersBody>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let mut missing = Vec::new();
    let paper_abstract = required(body.paper_abstract, "paperAbstract", &mut missing);
    let paper_keywords = required(body.paper_keywords, "paperKeywords", &mut missing);
    let conference_name = required(body.conference_name, "conferenceName", &mut missing);

    if !missing.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid request body.", "missing": missing})),
        ));
    }

    let input = SuggestReviewersInput {
        paper_abstract,
        paper_keywords,
        conference_name,
    };

    let output = state
        .dispatcher
        .suggest_reviewers(&input)
        .await
        .map_err(|e| {
            tracing::error!("Reviewer suggestion failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
        })?;

    tracing::info!(count = output.suggested_reviewers.len(), "Suggested reviewers");
    Ok(Json(output))
}

fn required(value: Option<String>, field: &'static str, missing: &mut Vec<&'static str>) -> String {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) => v,
        None => {
            missing.push(field);
            String::new()
        }
    }
}
