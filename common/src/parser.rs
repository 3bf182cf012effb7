//! APIレスポンスパーサー
//!
//! モデルの回答テキストからコードフェンスを取り除き、JSONとしてパースする。
//! 「JSONのみ返せ」と指示しても```json ... ```で囲んでくることがあるため。

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

lazy_static! {
    /// 先頭のフェンス（言語タグは改行が続く場合のみ）
    static ref LEADING_FENCE_RE: Regex =
        Regex::new(r"^```(?:[A-Za-z0-9_+-]+[ \t]*\r?\n|[ \t]*\r?\n?)").unwrap();
    /// 末尾のフェンス
    static ref TRAILING_FENCE_RE: Regex = Regex::new(r"\r?\n?[ \t]*```$").unwrap();
}

/// パース失敗
///
/// 診断用に上流の生テキストを保持する
#[derive(Error, Debug, Clone, PartialEq)]
#[error("AIレスポンスのパースに失敗: {reason}")]
pub struct ParseFailure {
    /// 上流から返された元のテキスト
    pub raw: String,
    /// serde_jsonのエラーメッセージ
    pub reason: String,
}

/// 前後のコードフェンスと空白を取り除く
///
/// フェンスがなければ前後の空白を除いたテキストをそのまま返す。
///
/// # Examples
/// ```
/// use coffee_ai_common::strip_code_fence;
///
/// assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
/// ```
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    let start = LEADING_FENCE_RE
        .find(trimmed)
        .map(|m| m.end())
        .unwrap_or(0);
    let body = &trimmed[start..];

    let end = TRAILING_FENCE_RE
        .find(body)
        .map(|m| m.start())
        .unwrap_or(body.len());

    body[..end].trim()
}

/// 上流の回答テキストをJSONに正規化
///
/// # Arguments
/// * `raw` - 上流APIの`content[0].text`
///
/// # Returns
/// * `Ok(Value)` - パース成功
/// * `Err(ParseFailure)` - フェンス除去後もJSONでない場合（生テキスト付き）
pub fn normalize_response(raw: &str) -> Result<Value, ParseFailure> {
    let cleaned = strip_code_fence(raw);

    serde_json::from_str(cleaned).map_err(|e| ParseFailure {
        raw: raw.to_string(),
        reason: e.to_string(),
    })
}
