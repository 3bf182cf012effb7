use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// 元のフロントエンドの配信元
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:8000",
    "http://localhost:8001",
    "http://localhost:8002",
    "http://localhost:8003",
    "http://localhost:8004",
    "http://localhost:8005",
    "https://avidan.github.io",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub api_url: String,
    pub timeout_seconds: u64,
    pub port: u16,
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "claude-sonnet-4-20250514".into(),
            max_tokens: 1000,
            api_url: DEFAULT_API_URL.into(),
            timeout_seconds: 120,
            port: 3001,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// 設定ファイルを読み込む（存在しなければデフォルト）
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| RelayError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("coffee-ai").join("config.json"))
    }

    /// コマンドライン・環境変数の値で上書き
    pub fn with_overrides(mut self, port: Option<u16>, api_key: Option<String>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(key) = api_key {
            self.api_key = Some(key);
        }
        self
    }

    /// APIキーを取得（空文字は未設定扱い）
    pub fn get_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(RelayError::MissingApiKey)
    }

    pub fn has_api_key(&self) -> bool {
        self.get_api_key().is_ok()
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }
}
