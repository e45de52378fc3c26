//! MCP-style HTTP tool server.
//!
//! Exposes the retrieval engine as JSON tools suitable for integration
//! with chat models and other MCP-compatible clients.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/tools/list` | List registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call a tool by name |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "missing_query", "message": "..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `missing_query` (400), `not_found`
//! (404), `tool_error` (500). Web-search failures never appear here —
//! the retriever absorbs them and returns the local results it has.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support
//! browser-based clients and cross-origin tool calls.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::error::EngineError;
use crate::retrieve::{HybridRetriever, RagRequest};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    retriever: Arc<HybridRetriever>,
}

/// Start the HTTP tool server. Runs until the process is terminated.
pub async fn run_server(config: Arc<Config>, retriever: Arc<HybridRetriever>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState { config, retriever };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    info!("tool server listening on http://{bind_addr}");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(code: &str, message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: code.to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn tool_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "tool_error".to_string(),
        message: message.into(),
    }
}

/// Map engine failures to HTTP errors. `MissingQuery` is a client
/// mistake; everything else that escapes the retriever is internal.
fn classify_error(tool_name: &str, err: anyhow::Error) -> AppError {
    match err.downcast_ref::<EngineError>() {
        Some(EngineError::MissingQuery) => {
            bad_request("missing_query", format!("{tool_name}: {err}"))
        }
        _ => tool_error(format!("{tool_name}: {err}")),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /tools/list ============

/// Serializable tool info for the `/tools/list` endpoint.
#[derive(Serialize)]
struct ToolInfo {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let retrieval = &state.config.retrieval;
    let web = &state.config.web_search;

    let tools = vec![
        ToolInfo {
            name: "rag_search".to_string(),
            description: "Semantic search over the restaurant knowledge base, \
                          with optional web augmentation"
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query (aliases: question, q)" },
                    "top_k": { "type": "integer", "description": "Max local results", "default": retrieval.default_top_k },
                    "include_web_search": { "type": "boolean", "description": "Also query the web", "default": false },
                    "web_results_count": { "type": "integer", "description": "Max web results", "default": web.default_count }
                },
                "required": ["query"]
            }),
        },
        ToolInfo {
            name: "echo".to_string(),
            description: "Return the input message unchanged (transport smoke test)".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string", "description": "Text to echo (alias: payload)" }
                },
                "required": ["message"]
            }),
        },
    ];

    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

/// Resolve the echo tool's text argument; `message` and `payload` are
/// accepted as aliases, first present wins.
fn echo_message(params: &serde_json::Value) -> Option<&str> {
    ["message", "payload"]
        .iter()
        .filter_map(|key| params.get(key).and_then(|v| v.as_str()))
        .next()
}

async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    match name.as_str() {
        "rag_search" => {
            let request = RagRequest::from_params(
                &params,
                &state.config.retrieval,
                &state.config.web_search,
            )
            .map_err(|e| classify_error(&name, e.into()))?;

            let response = state
                .retriever
                .retrieve(&request)
                .await
                .map_err(|e| classify_error(&name, e))?;

            Ok(Json(serde_json::to_value(&response).map_err(|e| {
                tool_error(format!("{name}: {e}"))
            })?))
        }
        "echo" => {
            let value = echo_message(&params).ok_or_else(|| {
                bad_request("bad_request", "echo: specify 'message' or 'payload'")
            })?;
            Ok(Json(serde_json::json!({ "message": value })))
        }
        _ => Err(not_found(format!("no tool registered with name: {name}"))),
    }
}
