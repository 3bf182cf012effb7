//! プロンプト生成モジュール
//!
//! HTTPサーバーとCLIで共有される解析プロンプト:
//! - ROAST_TEMPERATURE_BANDS: 焙煎度ごとの湯温帯
//! - ORIGIN_ADJUSTMENTS: 産地・精製方法ごとの補正
//! - build_analysis_prompt: ラベル解析 + 抽出プロファイル用プロンプト

/// プロンプトのバージョン（出力スキーマを変えたら上げる）
pub const PROMPT_VERSION: &str = "2025-06-brewing-profile-v3";

/// 焙煎度 → 推奨湯温（℃）
pub const ROAST_TEMPERATURE_BANDS: &[(&str, u8, u8)] = &[
    ("light", 94, 96),
    ("medium", 92, 94),
    ("medium-dark", 90, 92),
    ("dark", 88, 90),
];

/// 産地・精製方法による補正
pub const ORIGIN_ADJUSTMENTS: &[(&str, &str)] = &[
    ("Ethiopia / Kenya (washed)", "use the upper end of the temperature band and a 1:16 ratio to highlight acidity"),
    ("natural or honey process", "lower the temperature by 1°C and extend the bloom to 45 seconds"),
    ("high elevation (1800m+)", "grind slightly finer; dense beans extract slower"),
    ("Brazil / Sumatra / low elevation", "use a 1:15 ratio and a slightly coarser grind for body"),
    ("decaf", "lower the temperature by 2°C; decaf beans extract faster"),
];

/// 解析プロンプト生成
///
/// 出力はJSONオブジェクトのみを要求する。`brewingProfile`は
/// 上記の静的ヒューリスティクスから導出させる。
pub fn build_analysis_prompt() -> String {
    let temperature_bands = ROAST_TEMPERATURE_BANDS
        .iter()
        .map(|(roast, low, high)| format!("- {}: {}-{}°C", roast, low, high))
        .collect::<Vec<_>>()
        .join("\n");

    let adjustments = ORIGIN_ADJUSTMENTS
        .iter()
        .map(|(origin, rule)| format!("- {}: {}", origin, rule))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze this coffee bag image and extract the following information in JSON format:
{{
  "country": "country of origin",
  "region": "specific region/farm if visible",
  "roaster": "roaster name",
  "coffeeName": "specific coffee name/blend",
  "roastLevel": "light/medium/medium-dark/dark",
  "processing": "washed/natural/honey/etc",
  "variety": "bean variety if visible",
  "flavorNotes": ["flavor", "notes", "array"],
  "elevation": "elevation if visible",
  "confidence": "high/medium/low based on image clarity",
  "brewingProfile": {{
    "temperature": "recommended water temperature, e.g. 94°C",
    "ratio": "coffee to water ratio, e.g. 1:16",
    "grindSize": "fine/medium-fine/medium/medium-coarse/coarse",
    "totalTime": "total brew time, e.g. 3:00",
    "steps": [
      {{ "step": 1, "action": "bloom", "water": "grams of water", "time": "0:00-0:45" }}
    ]
  }}
}}

Derive brewingProfile for a pour-over from the roast level and origin:

Water temperature by roast level:
{temperature_bands}

Adjustments by origin and processing:
{adjustments}

If the roast level is not visible, assume medium. Use 3 to 5 pour steps.
Only return the JSON, no other text."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_all_fields() {
        let prompt = build_analysis_prompt();
        for field in [
            "\"country\"",
            "\"roaster\"",
            "\"roastLevel\"",
            "\"flavorNotes\"",
            "\"brewingProfile\"",
            "\"steps\"",
        ] {
            assert!(prompt.contains(field), "missing {}", field);
        }
    }

    #[test]
    fn test_prompt_renders_heuristics() {
        let prompt = build_analysis_prompt();
        assert!(prompt.contains("- light: 94-96°C"));
        assert!(prompt.contains("- dark: 88-90°C"));
        assert!(prompt.contains("natural or honey process"));
        assert!(prompt.trim_end().ends_with("Only return the JSON, no other text."));
    }

    #[test]
    fn test_temperature_bands_descend_with_roast() {
        for pair in ROAST_TEMPERATURE_BANDS.windows(2) {
            assert!(pair[0].1 > pair[1].1);
            assert!(pair[0].2 > pair[1].2);
        }
    }
}
