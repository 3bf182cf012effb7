//! ラベル解析の実行
//!
//! 1リクエストにつき上流呼び出しは1回だけ:
//! 入力検証 → 画像形式判定 → 上流呼び出し → レスポンス正規化

mod claude_api;
mod types;

pub use claude_api::ClaudeApiClient;
pub use types::{AnalysisRequest, ImagePayload};

use crate::error::{RelayError, Result};
use async_trait::async_trait;
use coffee_ai_common::{detect_image_format, normalize_response, strip_data_url, CoffeeAnalysis};
use serde_json::Value;

/// 上流の推論API
///
/// テストではネットワークなしの実装に差し替える
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// 画像とプロンプトを送り、モデルの回答テキストをそのまま返す
    async fn send_image_for_analysis(&self, image: &ImagePayload<'_>, prompt: &str) -> Result<String>;
}

/// ラベル画像を解析してJSONを返す
///
/// # Errors
/// * `MissingField` - imageData / mimeType が欠落または空（上流は呼ばない）
/// * `MissingApiKey` / `Upstream` / `Transport` - 上流呼び出しの失敗
/// * `Parse` - 回答がJSONでない（生テキスト付き）
pub async fn analyze_image(
    client: &dyn AnalysisClient,
    request: &AnalysisRequest,
    prompt: &str,
) -> Result<Value> {
    let (image_data, mime_type) = match (non_empty(&request.image_data), non_empty(&request.mime_type)) {
        (Some(data), Some(mime)) => (data, mime),
        _ => return Err(RelayError::MissingField),
    };

    // 判定するバイト列と上流に送るバイト列を一致させる
    let data = strip_data_url(image_data.trim()).trim();
    let format = detect_image_format(data, mime_type);

    if format.mime_type() != mime_type {
        tracing::info!(declared = mime_type, detected = %format, "MIMEタイプを判定結果で上書き");
    }

    let image = ImagePayload { data, format };
    let raw = client.send_image_for_analysis(&image, prompt).await?;

    normalize_response(&raw).map_err(|failure| {
        tracing::error!(raw = %failure.raw, reason = %failure.reason, "AIレスポンスのパースに失敗");
        RelayError::from(failure)
    })
}

/// 解析結果を型付きビューに変換（CLIのサマリー表示用）
pub fn summarize(data: &Value) -> Result<CoffeeAnalysis> {
    Ok(CoffeeAnalysis::from_value(data)?)
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}
