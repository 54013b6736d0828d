mod classifier;
mod config;
mod denylist;
mod gemini;
mod normalize;
mod server;
mod types;

use std::sync::Arc;

use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use config::Config;
use denylist::Denylist;
use gemini::{GeminiClassifier, GeminiConfig};
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vetter=debug".into()),
        )
        .init();

    let config = Config::parse();
    tracing::info!(model = %config.model, "Starting compliance server");

    let gemini_config = GeminiConfig {
        api_key: config.api_key.clone(),
        model: config.model.clone(),
        base_url: config.gemini_base_url.clone(),
        temp_dir: std::env::temp_dir(),
    };
    let classifier = GeminiClassifier::new(gemini_config);

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let state = AppState::new(Arc::new(classifier), Arc::new(Denylist::default_terms()));
    let app = server::router(state)
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&config.server_address()).await?;
    tracing::info!("Server running on http://{}", config.server_address());
    axum::serve(listener, app).await?;
    Ok(())
}
