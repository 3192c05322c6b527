//! HTTP surface: `POST /convert`, `POST /tokenize`, `GET /health`.
//!
//! The options are the only shared state. Each request resolves its own back
//! end and translates on the blocking pool.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::backend::backend;
use crate::config::TranslateOptions;
use crate::lexer::token_records;

const DEFAULT_TARGET: &str = "javascript";

#[derive(Debug, Clone)]
pub struct AppState {
    options: Arc<TranslateOptions>,
}

impl AppState {
    pub fn new(options: TranslateOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConvertRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenizeRequest {
    #[serde(default)]
    pub code: String,
}

pub type JsonResponse = (StatusCode, Json<Value>);

pub fn router(options: TranslateOptions) -> Router {
    Router::new()
        .route("/convert", post(convert))
        .route("/tokenize", post(tokenize))
        .route("/health", get(health))
        .with_state(AppState::new(options))
}

pub async fn serve(addr: SocketAddr, options: TranslateOptions) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Binding {addr}"))?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router(options))
        .await
        .context("Serving HTTP")?;
    Ok(())
}

pub async fn convert(
    State(state): State<AppState>,
    Json(request): Json<ConvertRequest>,
) -> JsonResponse {
    let target = request
        .target
        .unwrap_or_else(|| DEFAULT_TARGET.to_string());
    tracing::debug!(output = %target, bytes = request.code.len(), "convert request");

    let options = Arc::clone(&state.options);
    let code = request.code;
    match tokio::task::spawn_blocking(move || convert_blocking(&options, &target, &code)).await {
        Ok((status, body)) => (status, Json(body)),
        Err(err) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Translation task failed: {err}"),
        ),
    }
}

fn convert_blocking(options: &TranslateOptions, target: &str, code: &str) -> (StatusCode, Value) {
    let Some(backend) = backend(target, options) else {
        return (
            StatusCode::BAD_REQUEST,
            json!({ "error": format!("Unknown target '{target}'") }),
        );
    };
    match backend.translate_source(code) {
        Ok(translation) => {
            if !translation.degradations.is_empty() {
                tracing::info!(
                    backend = backend.name(),
                    degradations = translation.degradations.len(),
                    "translated with placeholders"
                );
            }
            let mut body = Map::new();
            body.insert(backend.name().to_string(), Value::String(translation.code));
            body.insert(
                "degradations".to_string(),
                json!(translation.degradations),
            );
            (StatusCode::OK, Value::Object(body))
        }
        Err(err) => (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() })),
    }
}

pub async fn tokenize(
    State(_state): State<AppState>,
    Json(request): Json<TokenizeRequest>,
) -> JsonResponse {
    tracing::debug!(bytes = request.code.len(), "tokenize request");
    match token_records(&request.code) {
        Ok(tokens) => (StatusCode::OK, Json(json!({ "tokens": tokens }))),
        Err(err) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
    }
}

pub async fn health() -> &'static str {
    "ok"
}

fn error_response(status: StatusCode, message: String) -> JsonResponse {
    (status, Json(json!({ "error": message })))
}
