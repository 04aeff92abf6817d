//! 予測サービス連携モジュール
//!
//! 画像1枚をmultipartでアップロードし、top-3予測を受け取る。
//! `success:false`・HTTPエラー・通信失敗はすべて一様にエラー扱い
//! （リトライなし）。

mod types;

pub use types::{to_confidence, HealthStatus, Prediction, PredictionResponse, RawPrediction};

use crate::error::{Result, SpiceAiError};
use crate::validator;
use std::path::Path;
use std::time::Duration;

/// タイムアウト付きHTTPクライアントを構築
pub fn build_client(timeout_seconds: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()?;
    Ok(client)
}

/// 画像を分類してtop-3予測を返す
pub async fn classify(
    client: &reqwest::Client,
    base_url: &str,
    path: &Path,
) -> Result<Vec<Prediction>> {
    if !path.exists() {
        return Err(SpiceAiError::FileNotFound(path.display().to_string()));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());
    let mime = validator::media_type_for(path).unwrap_or("application/octet-stream");
    let bytes = std::fs::read(path)?;

    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime)
        .map_err(|e| SpiceAiError::ApiCall(format!("multipart構築エラー: {}", e)))?;
    let form = reqwest::multipart::Form::new().part("image", part);

    let response = client
        .post(format!("{}/predict", base_url.trim_end_matches('/')))
        .multipart(form)
        .send()
        .await?
        .error_for_status()?;

    let body: PredictionResponse = response
        .json()
        .await
        .map_err(|e| SpiceAiError::ApiParse(e.to_string()))?;

    if !body.success {
        return Err(SpiceAiError::ApiCall(
            body.error.unwrap_or_else(|| "Unknown error occurred".to_string()),
        ));
    }

    let predictions = body
        .top_3_predictions
        .unwrap_or_default()
        .into_iter()
        .map(Prediction::from)
        .collect();

    Ok(predictions)
}

/// サービスの稼働状態を確認
pub async fn check_health(client: &reqwest::Client, base_url: &str) -> Result<HealthStatus> {
    let response = client
        .get(format!("{}/health", base_url.trim_end_matches('/')))
        .send()
        .await?
        .error_for_status()?;

    let status: HealthStatus = response
        .json()
        .await
        .map_err(|e| SpiceAiError::ApiParse(e.to_string()))?;

    Ok(status)
}
