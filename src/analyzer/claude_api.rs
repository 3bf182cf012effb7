//! Claude Messages API連携モジュール
//!
//! 画像1枚 + プロンプトを1回だけ送信する。リトライはしない。

use super::{AnalysisClient, ImagePayload};
use crate::config::Config;
use crate::error::{RelayError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude APIリクエスト
#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'static str,
    data: &'a str,
}

/// Claude APIレスポンス
#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

pub struct ClaudeApiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    api_url: String,
}

impl ClaudeApiClient {
    /// 設定からクライアントを作成
    ///
    /// APIキー未設定でも作成できる（呼び出し時に`MissingApiKey`）
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            api_key: config.get_api_key().ok().map(str::to_string),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            api_url: config.api_url.clone(),
        })
    }

    fn build_request<'a>(&'a self, image: &ImagePayload<'a>, prompt: &'a str) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type: image.format.mime_type(),
                            data: image.data,
                        },
                    },
                    ContentBlock::Text { text: prompt },
                ],
            }],
        }
    }
}

#[async_trait]
impl AnalysisClient for ClaudeApiClient {
    async fn send_image_for_analysis(&self, image: &ImagePayload<'_>, prompt: &str) -> Result<String> {
        // ネットワークに出る前に判定
        let api_key = self.api_key.as_deref().ok_or(RelayError::MissingApiKey)?;

        let body = self.build_request(image, prompt);

        let response = self
            .http
            .post(&self.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(status = status.as_u16(), error = %e, "Claude APIエラーボディの読み取りに失敗");
                    String::new()
                }
            };
            tracing::warn!(status = status.as_u16(), body = %text, "Claude APIエラー");
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: MessagesResponse = response.json().await?;

        extract_text(payload)
    }
}

/// 最初のコンテンツブロックのテキストを取り出す
fn extract_text(payload: MessagesResponse) -> Result<String> {
    payload
        .content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .ok_or_else(|| RelayError::Transport("Claude APIのレスポンスにテキストがありません".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use coffee_ai_common::ImageFormat;
    use serde_json::json;

    fn client(api_key: Option<&str>) -> ClaudeApiClient {
        let config = Config {
            api_key: api_key.map(str::to_string),
            ..Default::default()
        };
        ClaudeApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let client = client(Some("sk-test"));
        let image = ImagePayload {
            data: "iVBORw0KGgo",
            format: ImageFormat::Png,
        };

        let body = serde_json::to_value(client.build_request(&image, "describe")).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "claude-sonnet-4-20250514",
                "max_tokens": 1000,
                "messages": [{
                    "role": "user",
                    "content": [
                        {
                            "type": "image",
                            "source": {"type": "base64", "media_type": "image/png", "data": "iVBORw0KGgo"}
                        },
                        {"type": "text", "text": "describe"}
                    ]
                }]
            })
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_network() {
        // api_urlは到達不能だが、キー判定が先なので接続しない
        let config = Config {
            api_key: None,
            api_url: "http://127.0.0.1:9/v1/messages".into(),
            ..Default::default()
        };
        let client = ClaudeApiClient::new(&config).unwrap();
        let image = ImagePayload {
            data: "",
            format: ImageFormat::Jpeg,
        };

        let result = client.send_image_for_analysis(&image, "prompt").await;
        assert!(matches!(result, Err(RelayError::MissingApiKey)));
    }

    #[test]
    fn test_extract_text_first_block() {
        let payload: MessagesResponse = serde_json::from_value(json!({
            "id": "msg_01",
            "content": [{"type": "text", "text": "{\"country\":\"Peru\"}"}]
        }))
        .unwrap();
        assert_eq!(extract_text(payload).unwrap(), "{\"country\":\"Peru\"}");
    }

    #[test]
    fn test_extract_text_empty_content() {
        let payload: MessagesResponse = serde_json::from_value(json!({"content": []})).unwrap();
        assert!(matches!(extract_text(payload), Err(RelayError::Transport(_))));
    }
}
