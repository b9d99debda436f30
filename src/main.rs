use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

mod config;
mod form;
mod models;
mod shape;
mod upstream;
mod validate;

use config::Config;
use form::SubmittedForm;
use models::ResponseEnvelope;
use upstream::TwitterClient;

const LANDING_PAGE: &str = include_str!("../static/index.html");
const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";
const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    twitter: TwitterClient,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!("configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let twitter = match TwitterClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("failed to build upstream client: {}", e);
            std::process::exit(1);
        }
    };

    let bind_addr = config.bind_addr;
    let app = router(AppState { config, twitter });

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("listening on {}", bind_addr);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing).post(submit))
        .route("/health", get(health))
        .fallback(landing)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn landing() -> Response {
    ([(header::CONTENT_TYPE, HTML_CONTENT_TYPE)], LANDING_PAGE).into_response()
}

async fn submit(
    State(state): State<AppState>,
    SubmittedForm(fields): SubmittedForm,
) -> Response {
    let request = match validate::validate(&fields, &state.config) {
        Ok(request) => request,
        Err(rejection) => {
            tracing::info!(reason = ?rejection, "submission rejected");
            return json_response(&ResponseEnvelope::error(rejection.to_string()));
        }
    };

    tracing::debug!(
        post_id = %request.post_id,
        version = %request.client_version,
        url = %request.source_url,
        "fetching tweet"
    );

    let raw = match state.twitter.fetch_tweet(&request.post_id).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(post_id = %request.post_id, error = %e, "upstream request failed");
            String::new()
        }
    };

    json_response(&shape::shape(&raw, request.show_variant_selector))
}

fn json_response(envelope: &ResponseEnvelope) -> Response {
    match serde_json::to_string(envelope) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to serialize response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
