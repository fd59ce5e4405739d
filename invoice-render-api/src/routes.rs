//! HTTP boundary for the render pipeline.
//!
//! A single `POST /api/generate-pdf` route gates the request (method, then
//! credential, then body shape), resolves the target url, and hands the
//! request to one isolated browser session per call. The session runs on
//! a detached task so engine teardown still executes if the caller drops the
//! connection mid-render. A semaphore caps concurrently in-flight sessions;
//! requests past the cap queue until a slot frees up.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
};
use serde::Serialize;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use invoice_render::{EngineFactory, RenderRequest, render_invoice};

use crate::auth::{self, AuthDecision};
use crate::config::Config;
use crate::emit;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub factory: Arc<dyn EngineFactory>,
    sessions: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: Config, factory: Arc<dyn EngineFactory>) -> Self {
        let sessions = Arc::new(Semaphore::new(config.max_sessions));
        AppState {
            config: Arc::new(config),
            factory,
            sessions,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/generate-pdf",
            post(generate_pdf).fallback(method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Rejected before auth or body parsing ever run
async fn method_not_allowed() -> Response {
    emit::rejection(
        StatusCode::METHOD_NOT_ALLOWED,
        "Method not allowed. Use POST.",
        None,
    )
}

async fn generate_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let provided = headers
        .get(auth::API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if auth::verify(state.config.api_key.as_deref(), provided) == AuthDecision::Unauthorized {
        return emit::rejection(
            StatusCode::UNAUTHORIZED,
            "Unauthorized: missing or invalid x-api-key",
            None,
        );
    }

    // A missing body renders the template defaults against the configured
    // default url.
    let request: RenderRequest = if body.is_empty() {
        RenderRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => {
                return emit::rejection(
                    StatusCode::BAD_REQUEST,
                    "Malformed request body",
                    Some(e.to_string()),
                );
            }
        }
    };

    let url = match request.resolve_url(state.config.default_target_url.as_deref()) {
        Ok(url) => url,
        Err(e) => return emit::failure_response(&e),
    };
    let filename = request.pdf_filename();
    let payload = request.payload();

    let permit = match state.sessions.clone().acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            return emit::rejection(
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalError",
                Some("session limiter closed".to_string()),
            );
        }
    };

    info!(url = %url, filename = %filename, "rendering invoice pdf");

    let factory = state.factory.clone();
    let session_config = state.config.session_config();
    // Detached so teardown still runs if the caller disconnects mid-render.
    let outcome = tokio::spawn(async move {
        let _permit = permit;
        render_invoice(factory.as_ref(), session_config, &url, &payload).await
    })
    .await;

    match outcome {
        Ok(Ok(document)) => {
            info!(bytes = document.len(), "invoice pdf generated");
            emit::pdf_response(&filename, document)
        }
        Ok(Err(err)) => {
            error!(category = err.category().as_str(), error = %err, "invoice render failed");
            emit::failure_response(&err)
        }
        Err(join_err) => {
            error!(error = %join_err, "render task aborted");
            emit::rejection(
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalError",
                Some(join_err.to_string()),
            )
        }
    }
}
