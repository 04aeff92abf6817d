//! 画像検証モジュール
//!
//! 分類リクエスト送信前に画像ファイルを検査し、
//! エラー / 警告 / 改善提案の3段階で診断を返す。
//! エラーのみが送信をブロックする。

use image::GenericImageView;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB
const MIN_FILE_SIZE: u64 = 10 * 1024; // 10KB
const MIN_DIMENSION: u32 = 200;
const RECOMMENDED_DIMENSION: u32 = 500;
const MIN_ASPECT_RATIO: f64 = 0.5;
const MAX_ASPECT_RATIO: f64 = 2.0;

/// 輝度サンプリング用の縮小サイズ
const BRIGHTNESS_SAMPLE_SIZE: u32 = 100;
const DARK_THRESHOLD: f64 = 0.2;
const BRIGHT_THRESHOLD: f64 = 0.8;
/// 輝度計測に失敗した場合の中立値（提案を出さない）
const NEUTRAL_BRIGHTNESS: f64 = 0.5;

/// 対応フォーマット（拡張子 → メディアタイプ）
const SUPPORTED_FORMATS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
];

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    fn new() -> Self {
        Self {
            is_valid: true,
            ..Default::default()
        }
    }

    fn push_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
        self.is_valid = false;
    }
}

/// 拡張子からメディアタイプを判定
pub fn media_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    SUPPORTED_FORMATS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// 画像ファイルを検証
///
/// 全チェックを独立に実行し診断を蓄積する。明示的なエラー条件のみが
/// `is_valid` を false にする。デコード失敗時は寸法・輝度チェックを
/// スキップして即確定する。
pub fn validate_image(path: &Path) -> ValidationResult {
    let mut result = ValidationResult::new();

    // 1. フォーマットチェック
    if media_type_for(path).is_none() {
        result.push_error("Unsupported file format. Please use JPG, PNG, or WebP.");
    }

    // 2. サイズチェック
    match std::fs::metadata(path) {
        Ok(meta) => {
            let size = meta.len();
            if size > MAX_FILE_SIZE {
                result.push_error("File is too large. Maximum size is 10MB.");
            }
            if size < MIN_FILE_SIZE {
                result
                    .warnings
                    .push("File is very small. Image quality may be low.".to_string());
            }
        }
        Err(_) => {
            result.push_error("Unable to read image file.");
            return finalize(result);
        }
    }

    // 3. 寸法チェック（デコード失敗で以降を打ち切り）
    let img = match image::open(path) {
        Ok(img) => img,
        Err(_) => {
            result.push_error("Unable to read image file.");
            return finalize(result);
        }
    };

    let (width, height) = img.dimensions();
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        result.push_error(format!(
            "Image is too small. Minimum size is {}x{}px.",
            MIN_DIMENSION, MIN_DIMENSION
        ));
    }
    if width < RECOMMENDED_DIMENSION || height < RECOMMENDED_DIMENSION {
        result.warnings.push(format!(
            "Image resolution is low. For best results, use images at least {}x{}px.",
            RECOMMENDED_DIMENSION, RECOMMENDED_DIMENSION
        ));
    }

    // 4. アスペクト比チェック
    let aspect_ratio = width as f64 / height as f64;
    if !(MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&aspect_ratio) {
        result
            .suggestions
            .push("Try to use a more square image for better results.".to_string());
    }

    // 5. 輝度チェック（デコード済み画像を再利用）
    let brightness = sample_brightness(&img);
    if brightness < DARK_THRESHOLD {
        result
            .suggestions
            .push("Image appears dark. Try better lighting.".to_string());
    } else if brightness > BRIGHT_THRESHOLD {
        result
            .suggestions
            .push("Image appears overexposed. Reduce lighting or adjust exposure.".to_string());
    }

    finalize(result)
}

/// 有効かつ提案なしの場合のみ肯定メッセージを1件追加
fn finalize(mut result: ValidationResult) -> ValidationResult {
    if result.is_valid && result.suggestions.is_empty() {
        result
            .suggestions
            .push("✓ Image quality looks good!".to_string());
    }
    result
}

/// 平均輝度を計測（0.0〜1.0）
///
/// 100x100に縮小してから知覚輝度（0.299/0.587/0.114）の平均を取る。
/// サンプルが取れない場合は検証全体を落とさず中立値（0.5、提案なし）を返す。
fn sample_brightness(img: &image::DynamicImage) -> f64 {
    let thumb = img
        .thumbnail_exact(BRIGHTNESS_SAMPLE_SIZE, BRIGHTNESS_SAMPLE_SIZE)
        .to_rgb8();

    let count = thumb.pixels().len();
    if count == 0 {
        return NEUTRAL_BRIGHTNESS;
    }

    let total: f64 = thumb
        .pixels()
        .map(|p| luminance(p.0[0], p.0[1], p.0[2]))
        .sum();

    total / count as f64
}

/// 1ピクセルの知覚輝度（0.0〜1.0）
fn luminance(r: u8, g: u8, b: u8) -> f64 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) / 255.0
}

/// フォルダ内の複数画像を並列検証
pub fn validate_batch(paths: &[PathBuf]) -> Vec<(PathBuf, ValidationResult)> {
    paths
        .par_iter()
        .map(|p| (p.clone(), validate_image(p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_for() {
        assert_eq!(media_type_for(Path::new("a.jpg")), Some("image/jpeg"));
        assert_eq!(media_type_for(Path::new("a.JPEG")), Some("image/jpeg"));
        assert_eq!(media_type_for(Path::new("a.png")), Some("image/png"));
        assert_eq!(media_type_for(Path::new("a.webp")), Some("image/webp"));
        assert_eq!(media_type_for(Path::new("a.gif")), None);
        assert_eq!(media_type_for(Path::new("a.txt")), None);
        assert_eq!(media_type_for(Path::new("noext")), None);
    }

    #[test]
    fn test_luminance_extremes() {
        assert_eq!(luminance(0, 0, 0), 0.0);
        assert!((luminance(255, 255, 255) - 1.0).abs() < 1e-9);
        // 中間グレー
        let mid = luminance(128, 128, 128);
        assert!(mid > 0.4 && mid < 0.6);
    }

    #[test]
    fn test_luminance_weights() {
        // 緑が最も重く、青が最も軽い
        assert!(luminance(0, 255, 0) > luminance(255, 0, 0));
        assert!(luminance(255, 0, 0) > luminance(0, 0, 255));
    }

    #[test]
    fn test_sample_brightness_uniform() {
        let black = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            300,
            300,
            image::Rgb([0, 0, 0]),
        ));
        assert!(sample_brightness(&black) < 0.01);

        let white = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            300,
            300,
            image::Rgb([255, 255, 255]),
        ));
        assert!(sample_brightness(&white) > 0.99);
    }

    #[test]
    fn test_sample_brightness_mid_gray_is_neutral_range() {
        let gray = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            300,
            300,
            image::Rgb([128, 128, 128]),
        ));
        let b = sample_brightness(&gray);
        assert!(b > DARK_THRESHOLD && b < BRIGHT_THRESHOLD);
    }
}
