use super::protocol::{AnalyzeResponse, HealthResponse};
use super::AppState;
use crate::analyzer::{self, AnalysisRequest};
use crate::error::RelayError;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

type Result<T> = std::result::Result<T, RelayError>;

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Coffee Brewing Optimizer Backend is running!",
    })
}

/// `POST /api/analyze-coffee`
pub async fn analyze_coffee(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>> {
    let Json(request) = payload.map_err(body_rejection)?;

    let data = analyzer::analyze_image(state.client.as_ref(), &request, &state.prompt).await?;

    tracing::info!("finished serving analysis request");

    Ok(Json(AnalyzeResponse::new(data)))
}

/// JSON抽出の失敗をエラーに変換
///
/// Content-Typeなしは空ボディと同じく必須項目の欠落扱い。
/// それ以外（サイズ超過413など）は拒否理由のステータスを保つ
fn body_rejection(rejection: JsonRejection) -> RelayError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => RelayError::MissingField,
        other => RelayError::InvalidBody {
            status: other.status().as_u16(),
            message: other.body_text(),
        },
    }
}
