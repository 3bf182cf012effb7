use thiserror::Error;

/// リレー全体のエラー
///
/// HTTPレスポンスへの変換は`server`モジュールで行う。
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Missing imageData or mimeType")]
    MissingField,

    #[error("リクエストボディが不正: {message}")]
    InvalidBody { status: u16, message: String },

    #[error("Claude API key not configured")]
    MissingApiKey,

    #[error("Claude API request failed: {status}")]
    Upstream { status: u16, body: String },

    #[error("API呼び出しエラー: {0}")]
    Transport(String),

    #[error("Failed to parse AI response")]
    Parse { raw: String, reason: String },

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] coffee_ai_common::Error),
}

impl From<coffee_ai_common::ParseFailure> for RelayError {
    fn from(failure: coffee_ai_common::ParseFailure) -> Self {
        RelayError::Parse {
            raw: failure.raw,
            reason: failure.reason,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
