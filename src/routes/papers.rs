use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use sqlx::SqlitePool;

use super::auth::{CurrentUser, extract_current_user};
use crate::models::{
    AnalysisOutcome, AnalysisRequest, AnalyzePaperRequest, CreatePaper, Paper, PaperQuery,
    UpdatePaper,
};
use crate::papers;
use crate::state::AppState;

pub fn papers_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_papers).post(create_paper))
        .route("/summary", get(papers_summary))
        .route("/{paper_id}", get(get_paper).patch(update_paper))
        .route("/{paper_id}/analyze", post(analyze_paper))
}

async fn create_paper(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreatePaper>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let current_user = extract_current_user(&headers, &state.config.auth_jwt_secret)?;

    if input.title.trim().is_empty() {
        return Err(bad_request("Title is required"));
    }
    if input.file_type.trim().is_empty() {
        return Err(bad_request("File type is required"));
    }

    let paper = papers::insert_paper(&state.pool, &current_user.id, &input)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_error) if db_error.is_unique_violation() => (
                StatusCode::CONFLICT,
                Json(json!({"error": "Paper id already exists"})),
            ),
            other => internal_error(other),
        })?;

    tracing::info!(
        paper_id = %paper.id,
        user_id = %current_user.id,
        email = current_user.email.as_deref().unwrap_or("-"),
        "Paper uploaded"
    );
    Ok((StatusCode::CREATED, Json(paper)))
}

async fn list_papers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PaperQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let current_user = extract_current_user(&headers, &state.config.auth_jwt_secret)?;

    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(20);

    let listing = papers::fetch_user_papers(&state.pool, &current_user.id, page, per_page)
        .await
        .map_err(internal_error)?;

    Ok(Json(listing))
}

async fn papers_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let current_user = extract_current_user(&headers, &state.config.auth_jwt_secret)?;

    let summary = papers::fetch_status_summary(&state.pool, &current_user.id)
        .await
        .map_err(internal_error)?;

    Ok(Json(summary))
}

async fn get_paper(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(paper_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let current_user = extract_current_user(&headers, &state.config.auth_jwt_secret)?;
    let paper = load_owned_paper(&state, &current_user, &paper_id).await?;

    Ok(Json(paper))
}

async fn update_paper(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(paper_id): Path<String>,
    Json(input): Json<UpdatePaper>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let current_user = extract_current_user(&headers, &state.config.auth_jwt_secret)?;
    load_owned_paper(&state, &current_user, &paper_id).await?;

    if input
        .title
        .as_deref()
        .is_some_and(|title| title.trim().is_empty())
    {
        return Err(bad_request("Title cannot be empty"));
    }

    let paper = papers::update_paper(&state.pool, &paper_id, &input)
        .await
        .map_err(internal_error)?
        .ok_or_else(paper_not_found)?;

    Ok(Json(paper))
}

/// Runs one analysis on an owned paper: `Analyzing`, then the completed
/// status with the stored result, or `Failed` with the error message.
async fn analyze_paper(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(paper_id): Path<String>,
    Json(input): Json<AnalyzePaperRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let current_user = extract_current_user(&headers, &state.config.auth_jwt_secret)?;
    load_owned_paper(&state, &current_user, &paper_id).await?;

    papers::mark_analyzing(&state.pool, &paper_id)
        .await
        .map_err(internal_error)?;
    tracing::info!(paper_id = %paper_id, analysis_type = %input.analysis_type, "Paper analysis started");

    let request = AnalysisRequest {
        file_data_uri: input.data_uri,
        analysis_type: input.analysis_type.as_str().to_string(),
        paper_id: Some(paper_id.clone()),
    };

    // Spawned so the paper still leaves `Analyzing` if the client disconnects mid-call.
    let pool = state.pool.clone();
    let dispatcher = state.dispatcher.clone();
    let task_paper_id = paper_id.clone();
    let (outcome, recorded) = tokio::spawn(async move {
        let outcome = dispatcher.analyze(&request).await;
        let recorded = record_outcome(&pool, &task_paper_id, &outcome).await;
        (outcome, recorded)
    })
    .await
    .map_err(internal_error)?;
    recorded.map_err(internal_error)?;

    match outcome {
        AnalysisOutcome::Success { analysis_result } => {
            let paper = papers::fetch_paper(&state.pool, &paper_id)
                .await
                .map_err(internal_error)?
                .ok_or_else(paper_not_found)?;

            Ok(Json(json!({
                "paper": paper,
                "analysisType": input.analysis_type,
                "analysisResult": analysis_result,
            })))
        }
        AnalysisOutcome::Failure { error } => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("Analysis failed: {}", error)})),
        )),
    }
}

/// Stores the outcome on the paper. A result that cannot be stored still
/// moves the paper to `Failed`.
async fn record_outcome(
    pool: &SqlitePool,
    paper_id: &str,
    outcome: &AnalysisOutcome,
) -> Result<(), anyhow::Error> {
    match outcome {
        AnalysisOutcome::Success { analysis_result } => {
            if let Err(error) = papers::mark_completed(pool, paper_id, analysis_result).await {
                tracing::error!(paper_id, "Failed to store analysis result: {:#}", error);
                papers::mark_failed(
                    pool,
                    paper_id,
                    &format!("Failed to store analysis result: {:#}", error),
                )
                .await?;
                return Err(error);
            }
            Ok(())
        }
        AnalysisOutcome::Failure { error } => {
            papers::mark_failed(pool, paper_id, error).await?;
            Ok(())
        }
    }
}

async fn load_owned_paper(
    state: &AppState,
    current_user: &CurrentUser,
    paper_id: &str,
) -> Result<Paper, (StatusCode, Json<serde_json::Value>)> {
    let paper = papers::fetch_paper(&state.pool, paper_id)
        .await
        .map_err(internal_error)?
        .ok_or_else(paper_not_found)?;

    ensure_paper_owner(current_user, &paper)?;
    Ok(paper)
}

fn ensure_paper_owner(
    current_user: &CurrentUser,
    paper: &Paper,
) -> Result<(), (StatusCode, Json<serde_json::Value>)> {
    if paper.user_id == current_user.id {
        return Ok(());
    }

    Err((
        StatusCode::FORBIDDEN,
        Json(json!({"error": "Not authorized to access this paper"})),
    ))
}

fn paper_not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "Paper not found"})),
    )
}

fn bad_request(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
}

fn internal_error<E: ToString>(error: E) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": error.to_string()})),
    )
}
