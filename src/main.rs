mod ai_analysis;
mod config;
mod db;
mod models;
mod papers;
mod routes;
mod state;

use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ai_analysis::{AnalysisRegistry, Dispatcher, GeminiClient};
use config::AppConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "review_desk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let pool = db::init_db(&config.database_url).await?;
    tracing::info!("Database initialized");

    if config.gemini.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; analysis requests will fail");
    }
    let gemini = GeminiClient::from_config(&config.gemini)?;
    let dispatcher = Dispatcher::new(Arc::new(AnalysisRegistry::new()), Arc::new(gemini));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let addr = config.server_addr.clone();
    let app = routes::api_router(AppState::new(pool, dispatcher, config)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
