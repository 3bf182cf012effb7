//! ラベル解析リクエストを受け付けるJSON Webサーバー
//!
//! 受け取った画像を上流の推論APIへ1回だけ中継し、結果のJSONを返す。
//! 失敗はすべてここで構造化されたエラーレスポンスに変換する。

mod protocol;
pub mod routes;

pub use protocol::{AnalyzeResponse, ErrorBody, HealthResponse};

use crate::analyzer::{AnalysisClient, ClaudeApiClient};
use crate::config::Config;
use crate::error::{RelayError, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use coffee_ai_common::{build_analysis_prompt, PROMPT_VERSION};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// リクエストボディの上限（10MB）
const BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn AnalysisClient>,
    pub prompt: Arc<str>,
}

impl AppState {
    pub fn new(client: Arc<dyn AnalysisClient>) -> Self {
        Self {
            client,
            prompt: build_analysis_prompt().into(),
        }
    }
}

pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/analyze-coffee", post(routes::analyze_coffee))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// サーバーを起動
pub async fn run_server(config: Config) -> Result<()> {
    let client = ClaudeApiClient::new(&config)?;
    let state = AppState::new(Arc::new(client));
    let app = create_router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "Coffee Brewing Optimizer Backend running");
    tracing::info!("Health check: http://localhost:{}/health", config.port);
    tracing::info!(configured = config.has_api_key(), "Claude API key");
    tracing::info!(model = %config.model, prompt_version = PROMPT_VERSION, "analysis prompt");

    axum::serve(listener, app).await?;
    Ok(())
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingField => StatusCode::BAD_REQUEST,
            RelayError::InvalidBody { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
            }
            RelayError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_body(&self) -> ErrorBody {
        match self {
            RelayError::MissingField | RelayError::MissingApiKey => ErrorBody::new(self.to_string()),
            RelayError::InvalidBody { status, message } => {
                let error = if *status == StatusCode::PAYLOAD_TOO_LARGE.as_u16() {
                    "Request body too large"
                } else {
                    "Invalid request body"
                };
                ErrorBody {
                    message: Some(message.clone()),
                    ..ErrorBody::new(error)
                }
            }
            RelayError::Upstream { body, .. } => ErrorBody {
                details: Some(body.clone()),
                ..ErrorBody::new(self.to_string())
            },
            RelayError::Parse { raw, .. } => ErrorBody {
                raw_response: Some(raw.clone()),
                ..ErrorBody::new(self.to_string())
            },
            other => ErrorBody {
                message: Some(other.to_string()),
                ..ErrorBody::new("Internal server error")
            },
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        }
        (status, Json(self.error_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body_json(err: &RelayError) -> serde_json::Value {
        serde_json::to_value(err.error_body()).unwrap()
    }

    #[test]
    fn test_missing_field_response() {
        let err = RelayError::MissingField;
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&err), json!({"error": "Missing imageData or mimeType"}));
    }

    #[test]
    fn test_oversized_body_response() {
        let err = RelayError::InvalidBody {
            status: 413,
            message: "length limit exceeded".into(),
        };
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            body_json(&err),
            json!({"error": "Request body too large", "message": "length limit exceeded"})
        );
    }

    #[test]
    fn test_missing_api_key_response() {
        let err = RelayError::MissingApiKey;
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&err), json!({"error": "Claude API key not configured"}));
    }

    #[test]
    fn test_upstream_status_forwarded() {
        let err = RelayError::Upstream {
            status: 529,
            body: "overloaded".into(),
        };
        assert_eq!(err.status_code().as_u16(), 529);
        assert_eq!(
            body_json(&err),
            json!({"error": "Claude API request failed: 529", "details": "overloaded"})
        );
    }

    #[test]
    fn test_invalid_upstream_status_becomes_bad_gateway() {
        let err = RelayError::Upstream {
            status: 42,
            body: String::new(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_parse_failure_includes_raw_response() {
        let err = RelayError::Parse {
            raw: "I cannot analyze this".into(),
            reason: "expected value".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(&err),
            json!({"error": "Failed to parse AI response", "rawResponse": "I cannot analyze this"})
        );
    }

    #[test]
    fn test_transport_is_internal_error() {
        let err = RelayError::Transport("connection refused".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(&err);
        assert_eq!(body["error"], "Internal server error");
        assert!(body["message"].as_str().unwrap().contains("connection refused"));
    }
}
