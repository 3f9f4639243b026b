use anyhow::Result;
use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use context_core::{build_prompt, AnalysisRecord, ContextIndex};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Default, Deserialize)]
pub struct ContextParams {
    #[serde(default)]
    pub question_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ContextParams {
    fn has_target(&self) -> bool {
        self.question_id.as_deref().map_or(false, |s| !s.is_empty()) || self.url.as_deref().map_or(false, |s| !s.is_empty())
    }
}

#[derive(Deserialize)]
pub struct PromptParams {
    pub question: String,
    #[serde(flatten)]
    pub target: ContextParams,
}

#[derive(Serialize)]
pub struct PromptResponse {
    pub prompt: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<ContextIndex>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn build_app(json_paths: Vec<PathBuf>) -> Result<Router> {
    // Load the analyses once at startup
    let index = ContextIndex::load(&json_paths)?;
    tracing::info!(entries = index.len(), "image context index ready");
    Ok(router(index))
}

pub fn router(index: ContextIndex) -> Router {
    let app_state = AppState { index: Arc::new(index) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/image-context", post(image_context_handler))
        .route("/api/prompt", post(prompt_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn image_context_handler(
    State(state): State<AppState>,
    Json(params): Json<ContextParams>,
) -> Result<Json<Option<AnalysisRecord>>, ApiError> {
    if !params.has_target() {
        return Err(bad_request("either 'question_id' or 'url' must be given"));
    }
    let context = state.index.get_context(params.question_id.as_deref(), params.url.as_deref());
    if context.is_none() {
        tracing::debug!(question_id = ?params.question_id, url = ?params.url, "no image context");
    }
    Ok(Json(context.cloned()))
}

pub async fn prompt_handler(State(state): State<AppState>, Json(params): Json<PromptParams>) -> Json<PromptResponse> {
    let target = &params.target;
    let context = state.index.get_context(target.question_id.as_deref(), target.url.as_deref());
    Json(PromptResponse { prompt: build_prompt(&params.question, context) })
}

fn bad_request(msg: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: msg.to_string() }))
}
