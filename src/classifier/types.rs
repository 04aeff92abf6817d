use serde::{Deserialize, Serialize};

/// 予測サービス `/predict` のレスポンス
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionResponse {
    pub success: bool,

    #[serde(default)]
    pub predicted_class: Option<String>,

    /// 確信度（0〜100）
    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub top_3_predictions: Option<Vec<RawPrediction>>,

    #[serde(default)]
    pub error: Option<String>,
}

/// サービス側の生の予測（確率は0〜100のパーセント値）
#[derive(Debug, Clone, Deserialize)]
pub struct RawPrediction {
    #[serde(rename = "class")]
    pub class_name: String,
    pub probability: f64,
}

/// 正規化済みの予測（確信度0.0〜1.0）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub spice: String,
    pub confidence: f64,
}

impl From<RawPrediction> for Prediction {
    fn from(raw: RawPrediction) -> Self {
        Self {
            spice: raw.class_name,
            confidence: to_confidence(raw.probability),
        }
    }
}

/// パーセント値を0.0〜1.0の確信度へ変換（範囲外はクランプ）
pub fn to_confidence(probability: f64) -> f64 {
    (probability / 100.0).clamp(0.0, 1.0)
}

/// 予測サービス `/health` のレスポンス
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,

    #[serde(default)]
    pub model_loaded: Option<bool>,
}
