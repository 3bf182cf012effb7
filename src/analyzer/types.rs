use coffee_ai_common::ImageFormat;
use serde::{Deserialize, Serialize};

/// `POST /api/analyze-coffee`のリクエストボディ
///
/// 欠落と空文字はどちらも「未指定」として扱うため`Option`で受ける
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisRequest {
    pub image_data: Option<String>,   // Base64（Data URL可）
    pub mime_type: Option<String>,    // クライアント申告のMIMEタイプ
}

impl AnalysisRequest {
    pub fn new(image_data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            image_data: Some(image_data.into()),
            mime_type: Some(mime_type.into()),
        }
    }
}

/// 上流に送る画像
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePayload<'a> {
    pub data: &'a str,
    pub format: ImageFormat,
}
