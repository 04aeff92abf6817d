//! 分類履歴モジュール
//!
//! 直近の分類結果を新しい順・上限10件でローカル保存する。
//! UI向けの便宜キャッシュであり正本ではないため、ストレージ障害は
//! 空リスト / 何もしない、に黙ってフォールバックする。

mod storage;

pub use storage::{FileStore, MemoryStore, StoragePort};

use crate::classifier::Prediction;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

pub const HISTORY_KEY: &str = "moroccan-spices-history";
const MAX_HISTORY_ITEMS: usize = 10;

/// 保存される履歴エントリ（作成後は不変）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub image_url: String,
    pub timestamp: i64,
    pub top_prediction: Prediction,
    pub all_predictions: Vec<Prediction>,
}

/// id・timestamp付与前の入力
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub image_url: String,
    pub top_prediction: Prediction,
    pub all_predictions: Vec<Prediction>,
}

/// 上限付き履歴ストア
///
/// 前提: 書き込みは同時に1人（対話的CLI）。list→書き戻しの
/// read-modify-writeはトランザクション保護しない。
pub struct HistoryStore<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> HistoryStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// 履歴を新しい順で返す
    ///
    /// 未保存・破損データは空リスト扱い（次のrecordで上書き自己修復）。
    pub fn list(&self) -> Vec<HistoryEntry> {
        let Some(raw) = self.storage.get(HISTORY_KEY) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    /// 分類結果を1件記録
    ///
    /// 先頭に挿入し、上限超過分（最古）は毎回無条件に切り捨てる。
    /// 書き込み失敗は握りつぶす。
    pub fn record(&mut self, item: NewHistoryEntry) -> HistoryEntry {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let entry = HistoryEntry {
            id: generate_id(now_ms, &item.image_url),
            image_url: item.image_url,
            timestamp: now_ms,
            top_prediction: item.top_prediction,
            all_predictions: item.all_predictions,
        };

        let mut history = self.list();
        history.insert(0, entry.clone());
        history.truncate(MAX_HISTORY_ITEMS);

        if let Ok(json) = serde_json::to_string(&history) {
            if let Err(e) = self.storage.set(HISTORY_KEY, &json) {
                eprintln!("履歴の保存に失敗: {}", e);
            }
        }

        entry
    }

    /// idが一致するエントリを削除（存在しなければ何もしない）
    pub fn delete_one(&mut self, id: &str) {
        let mut history = self.list();
        let before = history.len();
        history.retain(|e| e.id != id);
        if history.len() == before {
            return;
        }

        if let Ok(json) = serde_json::to_string(&history) {
            if let Err(e) = self.storage.set(HISTORY_KEY, &json) {
                eprintln!("履歴の更新に失敗: {}", e);
            }
        }
    }

    /// 履歴を全消去
    pub fn clear_all(&mut self) {
        if let Err(e) = self.storage.remove(HISTORY_KEY) {
            eprintln!("履歴の削除に失敗: {}", e);
        }
    }
}

/// エントリID生成: `history-{ミリ秒}-{9桁サフィックス}`
///
/// サフィックスはナノ秒時刻と画像ペイロードのSHA-256先頭から取る。
fn generate_id(now_ms: i64, payload: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);

    let mut hasher = Sha256::new();
    hasher.update(now_ms.to_le_bytes());
    hasher.update(nanos.to_le_bytes());
    hasher.update(payload.as_bytes());
    let digest = hex::encode(hasher.finalize());

    format!("history-{}-{}", now_ms, &digest[..9])
}

/// 経過時間を人間向けの粗い単位に変換
pub fn format_relative_age(timestamp_ms: i64) -> String {
    relative_age(timestamp_ms, chrono::Utc::now().timestamp_millis())
}

/// 決定的な変換本体（テスト用に現在時刻を引数で取る）
pub fn relative_age(timestamp_ms: i64, now_ms: i64) -> String {
    let seconds = (now_ms - timestamp_ms).max(0) / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{} day{} ago", days, plural(days))
    } else if hours > 0 {
        format!("{} hour{} ago", hours, plural(hours))
    } else if minutes > 0 {
        format!("{} minute{} ago", minutes, plural(minutes))
    } else {
        "Just now".to_string()
    }
}

fn plural(n: i64) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

/// 画像ファイルを自己完結なdata URLに変換
///
/// 元ファイルが消えても履歴エントリ単体で表示できるようにする。
pub fn image_data_url(path: &Path) -> crate::error::Result<String> {
    let mime = crate::validator::media_type_for(path).unwrap_or("application/octet-stream");
    let bytes = std::fs::read(path)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", mime, encoded))
}
