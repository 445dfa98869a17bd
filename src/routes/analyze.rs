use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::{Map, Value, json};

use crate::models::{AnalysisKind, AnalysisOutcome, AnalysisRequest};
use crate::state::AppState;

pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/", post(analyze))
}

async fn analyze(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, (StatusCode, Json<Value>)> {
    tracing::info!("Received analysis request");

    let body: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Unreadable analysis request body: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
    })?;

    let request = validate_analyze_body(&body).map_err(|details| {
        tracing::warn!(%details, "Analysis request failed validation");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid request body.", "details": details})),
        )
    })?;

    let paper_id = request.paper_id.clone().unwrap_or_default();
    match state.dispatcher.analyze(&request).await {
        AnalysisOutcome::Success { analysis_result } => {
            tracing::info!(paper_id = %paper_id, "Analysis request succeeded");
            Ok(Json(analysis_result))
        }
        AnalysisOutcome::Failure { error } => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("Analysis failed: {}", error)})),
        )),
    }
}

/// Checks the body shape and reports problems as
/// `{formErrors: [..], fieldErrors: {field: [..]}}`.
fn validate_analyze_body(body: &Value) -> Result<AnalysisRequest, Value> {
    let Some(fields) = body.as_object() else {
        return Err(json!({
            "formErrors": [format!("Expected object, received {}", json_type_name(body))],
            "fieldErrors": {}
        }));
    };

    let mut field_errors = Map::new();

    let file_data_uri = match optional_string(fields, "dataUri") {
        Ok(value) => value,
        Err(message) => {
            field_errors.insert("dataUri".to_string(), json!([message]));
            None
        }
    };

    let analysis_type = match fields.get("analysisType") {
        None => {
            field_errors.insert("analysisType".to_string(), json!(["Required"]));
            None
        }
        Some(Value::String(raw)) => match raw.parse::<AnalysisKind>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                field_errors.insert(
                    "analysisType".to_string(),
                    json!([format!(
                        "Invalid enum value. Expected {}, received '{}'",
                        expected_kinds(),
                        raw
                    )]),
                );
                None
            }
        },
        Some(other) => {
            field_errors.insert(
                "analysisType".to_string(),
                json!([format!(
                    "Expected {}, received {}",
                    expected_kinds(),
                    json_type_name(other)
                )]),
            );
            None
        }
    };

    let paper_id = match optional_string(fields, "paperId") {
        Ok(value) => value,
        Err(message) => {
            field_errors.insert("paperId".to_string(), json!([message]));
            None
        }
    };

    match analysis_type {
        Some(kind) if field_errors.is_empty() => Ok(AnalysisRequest {
            file_data_uri,
            analysis_type: kind.as_str().to_string(),
            paper_id,
        }),
        _ => Err(json!({
            "formErrors": [],
            "fieldErrors": field_errors
        })),
    }
}

fn optional_string(fields: &Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match fields.get(key) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(format!("Expected string, received {}", json_type_name(other))),
    }
}

fn expected_kinds() -> String {
    AnalysisKind::ALL
        .iter()
        .map(|kind| format!("'{}'", kind))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_analysis::flows::{GRAMMAR_PROMPT, REVIEW_PROMPT};
    use crate::ai_analysis::stub::StubCapability;
    use crate::routes::testing::{json_request, send, test_app};
    use axum::{body::Body, http::Request};

    const HELLO_URI: &str = "data:text/plain;base64,SGVsbG8gd29ybGQ=";

    #[test]
    fn valid_body_becomes_a_request() {
        let request = validate_analyze_body(&json!({
            "dataUri": HELLO_URI,
            "analysisType": "grammar",
            "paperId": "p-1"
        }))
        .unwrap();

        assert_eq!(request.file_data_uri.as_deref(), Some(HELLO_URI));
        assert_eq!(request.analysis_type, "grammar");
        assert_eq!(request.paper_id.as_deref(), Some("p-1"));
    }

    #[test]
    fn field_errors_are_flattened_per_field() {
        let details = validate_analyze_body(&json!({
            "dataUri": null,
            "paperId": 7
        }))
        .unwrap_err();

        assert_eq!(details["formErrors"], json!([]));
        assert_eq!(
            details["fieldErrors"]["dataUri"],
            json!(["Expected string, received null"])
        );
        assert_eq!(details["fieldErrors"]["analysisType"], json!(["Required"]));
        assert_eq!(
            details["fieldErrors"]["paperId"],
            json!(["Expected string, received number"])
        );
    }

    #[test]
    fn unknown_kind_lists_accepted_values() {
        let details = validate_analyze_body(&json!({ "analysisType": "summary" })).unwrap_err();
        assert_eq!(
            details["fieldErrors"]["analysisType"][0],
            "Invalid enum value. Expected 'plagiarism' | 'grammar' | 'review', received 'summary'"
        );
    }

    #[test]
    fn non_object_body_is_a_form_error() {
        let details = validate_analyze_body(&json!(["grammar"])).unwrap_err();
        assert_eq!(
            details["formErrors"],
            json!(["Expected object, received array"])
        );
        assert_eq!(details["fieldErrors"], json!({}));
    }

    #[tokio::test]
    async fn successful_analysis_returns_the_raw_result() {
        let (app, stub) = test_app(StubCapability::canned()).await;

        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/analyze",
                None,
                json!({ "dataUri": HELLO_URI, "analysisType": "grammar", "paperId": "p-1" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["improvedPaperText"], "Hello, world.");
        assert!(body.get("analysisResult").is_none());
        assert_eq!(
            stub.last_input(GRAMMAR_PROMPT).unwrap(),
            json!({ "paperText": "Hello world" })
        );
    }

    #[tokio::test]
    async fn invalid_body_is_rejected_before_the_model() {
        let (app, stub) = test_app(StubCapability::canned()).await;

        let (status, body) = send(
            app,
            json_request(
                "POST",
                "/api/analyze",
                None,
                json!({ "dataUri": HELLO_URI, "analysisType": "translate" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request body.");
        assert!(body["details"]["fieldErrors"]["analysisType"].is_array());
        assert_eq!(stub.total_calls(), 0);
    }

    #[tokio::test]
    async fn dispatcher_errors_become_500() {
        let (app, stub) = test_app(StubCapability::canned()).await;

        let (status, body) = send(
            app,
            json_request("POST", "/api/analyze", None, json!({ "analysisType": "review" })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Analysis failed: File data URI is missing.");
        assert_eq!(stub.calls_for(REVIEW_PROMPT), 0);
    }

    #[tokio::test]
    async fn unparseable_json_is_500_with_the_parser_message() {
        let (app, _) = test_app(StubCapability::canned()).await;

        let request = Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(app, request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["error"].as_str().unwrap().is_empty());
        assert!(body.get("details").is_none());
    }
}
