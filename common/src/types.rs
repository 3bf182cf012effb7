//! 解析結果の型定義
//!
//! - ImageFormat: 判定された画像形式
//! - CoffeeAnalysis: モデル出力の寛容な型付きビュー（CLIのサマリー表示用）
//!
//! HTTPレスポンスはモデル出力を`serde_json::Value`のまま転送する。
//! ここの型はスキーマ検証ではなく、読み取り用の便宜的な射影。

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// 上流APIが受け付ける画像形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImageFormat {
    #[serde(rename = "image/png")]
    Png,
    #[default]
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/gif")]
    Gif,
    #[serde(rename = "image/webp")]
    Webp,
}

impl ImageFormat {
    /// MIMEタイプ文字列
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// コーヒー豆ラベルの解析結果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoffeeAnalysis {
    pub country: String,
    pub region: String,
    pub roaster: String,
    pub coffee_name: String,
    pub roast_level: String,
    pub processing: String,
    pub variety: String,
    pub flavor_notes: Vec<String>,
    pub elevation: String,
    pub confidence: String,
    pub brewing_profile: Option<BrewingProfile>,
}

/// 抽出パラメータ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrewingProfile {
    pub temperature: String,    // 湯温
    pub ratio: String,          // 粉:湯
    pub grind_size: String,     // 挽き目
    pub total_time: String,     // 抽出時間
    pub steps: Vec<BrewStep>,
}

/// 注湯ステップ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrewStep {
    pub step: u32,
    pub action: String,
    pub water: String,
    pub time: String,
}

impl CoffeeAnalysis {
    /// `serde_json::Value`から寛容に変換
    ///
    /// 欠けたフィールドはデフォルト値。型が合わないフィールドはエラー
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::Parse("JSONオブジェクトではありません".into()));
        }
        Ok(serde_json::from_value(value.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_format_mime_type() {
        assert_eq!(ImageFormat::Png.mime_type(), "image/png");
        assert_eq!(ImageFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageFormat::Gif.mime_type(), "image/gif");
        assert_eq!(ImageFormat::Webp.mime_type(), "image/webp");
        assert_eq!(ImageFormat::default(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_image_format_serializes_as_mime() {
        let json = serde_json::to_string(&ImageFormat::Webp).unwrap();
        assert_eq!(json, "\"image/webp\"");
    }

    #[test]
    fn test_coffee_analysis_from_full_value() {
        let value = json!({
            "country": "Ethiopia",
            "region": "Yirgacheffe",
            "roastLevel": "light",
            "flavorNotes": ["jasmine", "bergamot"],
            "brewingProfile": {
                "temperature": "94-96°C",
                "ratio": "1:16",
                "steps": [
                    {"step": 1, "action": "bloom", "water": "40g", "time": "0:00-0:45"}
                ]
            }
        });

        let analysis = CoffeeAnalysis::from_value(&value).unwrap();
        assert_eq!(analysis.country, "Ethiopia");
        assert_eq!(analysis.roast_level, "light");
        assert_eq!(analysis.flavor_notes, vec!["jasmine", "bergamot"]);
        let profile = analysis.brewing_profile.unwrap();
        assert_eq!(profile.ratio, "1:16");
        assert_eq!(profile.steps.len(), 1);
        assert_eq!(profile.steps[0].action, "bloom");
        assert_eq!(profile.grind_size, ""); // デフォルト値
    }

    #[test]
    fn test_coffee_analysis_minimal() {
        let analysis = CoffeeAnalysis::from_value(&json!({"country": "Kenya"})).unwrap();
        assert_eq!(analysis.country, "Kenya");
        assert!(analysis.flavor_notes.is_empty());
        assert!(analysis.brewing_profile.is_none());
    }

    #[test]
    fn test_coffee_analysis_type_mismatch() {
        // flavorNotesが文字列 → 型付きビューは作れない
        let value = json!({"flavorNotes": "chocolate"});
        let result = CoffeeAnalysis::from_value(&value);
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_coffee_analysis_not_object() {
        let result = CoffeeAnalysis::from_value(&json!(["Ethiopia"]));
        assert!(matches!(result, Err(Error::Parse(_))));
    }
}
