pub mod analyze;
pub mod auth;
pub mod papers;
pub mod reviewers;

pub use analyze::analyze_routes;
pub use papers::papers_routes;
pub use reviewers::reviewers_routes;

use axum::{Router, extract::DefaultBodyLimit, response::IntoResponse, routing::get};

use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .nest("/api/analyze", analyze_routes())
        .nest("/api/papers", papers_routes())
        .nest("/api/reviewers", reviewers_routes())
        .route("/api/health", get(health_check))
        .layer(body_limit)
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    axum::Json(serde_json::json!({"status": "healthy"}))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::api_router;
    use super::auth::tests::{TEST_SECRET, token_for};
    use crate::ai_analysis::{Dispatcher, flows::AnalysisRegistry, stub::StubCapability};
    use crate::config::AppConfig;
    use crate::db::init_db;
    use crate::state::AppState;

    pub(crate) async fn test_app(stub: StubCapability) -> (Router, Arc<StubCapability>) {
        test_app_with(stub, &[]).await
    }

    pub(crate) async fn test_app_with(
        stub: StubCapability,
        env: &[(&str, &str)],
    ) -> (Router, Arc<StubCapability>) {
        let (state, stub) = test_state(stub, env).await;
        (api_router(state), stub)
    }

    pub(crate) async fn test_state(
        stub: StubCapability,
        env: &[(&str, &str)],
    ) -> (AppState, Arc<StubCapability>) {
        let stub = Arc::new(stub);
        let pool = init_db("sqlite::memory:").await.unwrap();
        let dispatcher = Dispatcher::new(Arc::new(AnalysisRegistry::new()), stub.clone());
        let config = AppConfig::from_lookup(|name| {
            if name == "AUTH_JWT_SECRET" {
                return Some(TEST_SECRET.to_string());
            }
            env.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        })
        .unwrap();

        (AppState::new(pool, dispatcher, config), stub)
    }

    pub(crate) fn bearer_for(user_id: &str) -> String {
        format!("Bearer {}", token_for(user_id, TEST_SECRET, 3600))
    }

    pub(crate) fn json_request(
        method: &str,
        uri: &str,
        user_id: Option<&str>,
        body: Value,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(user_id) = user_id {
            builder = builder.header("authorization", bearer_for(user_id));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    /// Non-JSON bodies (extractor rejections) come back as a JSON string.
    pub(crate) async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }
}
