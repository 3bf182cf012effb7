//! 画像形式判定
//!
//! Base64文字列の先頭バイトから実際の画像形式を判定する。
//! クライアントが申告したMIMEタイプは誤っていることがあるため、
//! シグネチャが一致すればそちらを優先する。

use crate::types::ImageFormat;
use base64::{
    alphabet,
    engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig},
    Engine as _,
};

/// 判定に使う先頭文字数（15バイト分、既知のシグネチャを全て含む）
const HEADER_CHARS: usize = 20;

const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];
const GIF_SIGNATURES: &[&[u8]] = &[b"GIF87a", b"GIF89a"];
const RIFF_SIGNATURE: &[u8] = b"RIFF";
const WEBP_MARKER: &[u8] = b"WEBP";

/// 途中で切った先頭部分を読むためのエンジン（パディング有無・末尾ビットを問わない）
const HEADER_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Base64画像の形式を判定
///
/// 判定順序（最初に一致したもの）:
/// 1. 先頭バイトのシグネチャ（PNG → JPEG → GIF → WebP）
/// 2. `hint`の部分一致（png / jpeg・jpg / gif / webp）
/// 3. `image/jpeg`
///
/// 空文字や不正なBase64でもパニックしない。
///
/// # Examples
/// ```
/// use coffee_ai_common::{detect_image_format, ImageFormat};
///
/// // PNGシグネチャはヒントより優先
/// assert_eq!(detect_image_format("iVBORw0KGgoAAAANSUhEUg", "image/jpeg"), ImageFormat::Png);
/// assert_eq!(detect_image_format("", "image/gif"), ImageFormat::Gif);
/// assert_eq!(detect_image_format("", ""), ImageFormat::Jpeg);
/// ```
pub fn detect_image_format(data: &str, hint: &str) -> ImageFormat {
    decode_header(data)
        .and_then(|header| format_from_signature(&header))
        .or_else(|| format_from_hint(hint))
        .unwrap_or_default()
}

/// Data URLであればヘッダを外してBase64部分を返す
///
/// `"data:image/png;base64,iVBOR..."` → `"iVBOR..."`。
/// Data URLでなければそのまま返す。
pub fn strip_data_url(data: &str) -> &str {
    if !data.starts_with("data:") {
        return data;
    }
    match data.split_once(',') {
        Some((_, payload)) => payload,
        None => data,
    }
}

fn decode_header(data: &str) -> Option<Vec<u8>> {
    let bytes = data.trim_start().as_bytes();
    let mut prefix = &bytes[..bytes.len().min(HEADER_CHARS)];

    // 4文字単位で1文字だけ余る場合はデコードできないので捨てる
    if prefix.len() % 4 == 1 {
        prefix = &prefix[..prefix.len() - 1];
    }
    if prefix.is_empty() {
        return None;
    }

    HEADER_ENGINE.decode(prefix).ok()
}

fn format_from_signature(header: &[u8]) -> Option<ImageFormat> {
    if header.starts_with(PNG_SIGNATURE) {
        Some(ImageFormat::Png)
    } else if header.starts_with(JPEG_SIGNATURE) {
        Some(ImageFormat::Jpeg)
    } else if GIF_SIGNATURES.iter().any(|sig| header.starts_with(sig)) {
        Some(ImageFormat::Gif)
    } else if header.starts_with(RIFF_SIGNATURE) && header.get(8..12) == Some(WEBP_MARKER) {
        Some(ImageFormat::Webp)
    } else {
        None
    }
}

fn format_from_hint(hint: &str) -> Option<ImageFormat> {
    let hint = hint.to_ascii_lowercase();

    if hint.contains("png") {
        Some(ImageFormat::Png)
    } else if hint.contains("jpeg") || hint.contains("jpg") {
        Some(ImageFormat::Jpeg)
    } else if hint.contains("gif") {
        Some(ImageFormat::Gif)
    } else if hint.contains("webp") {
        Some(ImageFormat::Webp)
    } else {
        None
    }
}
