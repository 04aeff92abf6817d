//! 分類履歴テスト
//!
//! 上限付き履歴ストアの挿入・削除・破損時フォールバックを検証

use spice_ai_rust::classifier::Prediction;
use spice_ai_rust::history::{
    FileStore, HistoryStore, MemoryStore, NewHistoryEntry, StoragePort, HISTORY_KEY,
};
use tempfile::tempdir;

fn new_entry(spice: &str, confidence: f64) -> NewHistoryEntry {
    NewHistoryEntry {
        image_url: format!("data:image/jpeg;base64,{}==", spice),
        top_prediction: Prediction {
            spice: spice.to_string(),
            confidence,
        },
        all_predictions: vec![
            Prediction {
                spice: spice.to_string(),
                confidence,
            },
            Prediction {
                spice: "paprika".to_string(),
                confidence: 0.05,
            },
        ],
    }
}

/// 空の履歴
#[test]
fn test_empty_history() {
    let store = HistoryStore::new(MemoryStore::new());
    assert!(store.list().is_empty());
}

/// 記録と読み出し（新しい順）
#[test]
fn test_record_and_list() {
    let mut store = HistoryStore::new(MemoryStore::new());

    store.record(new_entry("cumin", 0.9));
    store.record(new_entry("saffron", 0.8));

    let entries = store.list();
    assert_eq!(entries.len(), 2);
    // 先頭が最新
    assert_eq!(entries[0].top_prediction.spice, "saffron");
    assert_eq!(entries[1].top_prediction.spice, "cumin");
}

/// 11回記録すると最古の1件が追い出される
#[test]
fn test_capacity_eviction() {
    let mut store = HistoryStore::new(MemoryStore::new());

    for i in 1..=11 {
        store.record(new_entry(&format!("spice-{}", i), 0.5));
    }

    let entries = store.list();
    assert_eq!(entries.len(), 10);
    // 最新が先頭、最初の1件は消えている
    assert_eq!(entries[0].top_prediction.spice, "spice-11");
    assert_eq!(entries[9].top_prediction.spice, "spice-2");
    assert!(!entries
        .iter()
        .any(|e| e.top_prediction.spice == "spice-1"));
}

/// 上限は毎回の書き込みで無条件に適用される
#[test]
fn test_cap_enforced_on_oversized_state() {
    let mut storage = MemoryStore::new();

    // 上限を超えた状態を直接仕込む
    let mut seeded = Vec::new();
    for i in 0..15 {
        seeded.push(serde_json::json!({
            "id": format!("history-0-seed{:02}", i),
            "imageUrl": "data:image/png;base64,AA==",
            "timestamp": 1_000 + i,
            "topPrediction": {"spice": "seeded", "confidence": 0.1},
            "allPredictions": [],
        }));
    }
    storage
        .set(HISTORY_KEY, &serde_json::to_string(&seeded).unwrap())
        .unwrap();

    let mut store = HistoryStore::new(storage);
    store.record(new_entry("fresh", 0.9));

    let entries = store.list();
    assert_eq!(entries.len(), 10);
    assert_eq!(entries[0].top_prediction.spice, "fresh");
}

/// ID指定の削除は該当1件のみ、順序は保持
#[test]
fn test_delete_one() {
    let mut store = HistoryStore::new(MemoryStore::new());

    store.record(new_entry("cumin", 0.9));
    let middle = store.record(new_entry("ginger", 0.7));
    store.record(new_entry("saffron", 0.8));

    store.delete_one(&middle.id);

    let entries = store.list();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].top_prediction.spice, "saffron");
    assert_eq!(entries[1].top_prediction.spice, "cumin");
}

/// 存在しないIDの削除は何もしない
#[test]
fn test_delete_missing_id() {
    let mut store = HistoryStore::new(MemoryStore::new());
    store.record(new_entry("cumin", 0.9));

    store.delete_one("history-0-nonexistent");

    assert_eq!(store.list().len(), 1);
}

/// 全消去
#[test]
fn test_clear_all() {
    let mut store = HistoryStore::new(MemoryStore::new());
    store.record(new_entry("cumin", 0.9));
    store.record(new_entry("saffron", 0.8));

    store.clear_all();

    assert!(store.list().is_empty());
}

/// 破損データは空扱い、次のrecordで自己修復
#[test]
fn test_corrupt_state_self_heals() {
    let mut storage = MemoryStore::new();
    storage.set(HISTORY_KEY, "{ invalid json }").unwrap();

    let mut store = HistoryStore::new(storage);
    assert!(store.list().is_empty());

    store.record(new_entry("cumin", 0.9));
    let entries = store.list();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].top_prediction.spice, "cumin");
}

/// ファイルストア経由のラウンドトリップ
#[test]
fn test_file_store_roundtrip() {
    let dir = tempdir().unwrap();

    {
        let mut store = HistoryStore::new(FileStore::new(dir.path()));
        store.record(new_entry("turmeric", 0.87));
    }

    // 別インスタンスで読み直す（キャッシュなし、毎回読み込み）
    let store = HistoryStore::new(FileStore::new(dir.path()));
    let entries = store.list();
    assert_eq!(entries.len(), 1);

    let entry = &entries[0];
    assert_eq!(entry.top_prediction.spice, "turmeric");
    assert!((entry.top_prediction.confidence - 0.87).abs() < 1e-9);
    assert_eq!(entry.all_predictions.len(), 2);
    assert!(entry.image_url.starts_with("data:image/jpeg;base64,"));
    // システム採番のフィールドが整形されている
    assert!(entry.id.starts_with("history-"));
    assert!(entry.timestamp > 0);
}

/// 永続化レイアウトはcamelCaseのJSON配列
#[test]
fn test_persisted_layout() {
    let dir = tempdir().unwrap();
    let mut store = HistoryStore::new(FileStore::new(dir.path()));
    store.record(new_entry("cinnamon", 0.75));

    let raw = std::fs::read_to_string(dir.path().join(format!("{}.json", HISTORY_KEY))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

    let array = value.as_array().expect("配列であること");
    assert_eq!(array.len(), 1);
    let obj = &array[0];
    assert!(obj.get("imageUrl").is_some());
    assert!(obj.get("topPrediction").is_some());
    assert!(obj.get("allPredictions").is_some());
    assert_eq!(obj["topPrediction"]["spice"], "cinnamon");
}

/// IDは再利用されない
#[test]
fn test_ids_are_unique() {
    let mut store = HistoryStore::new(MemoryStore::new());

    let mut ids = std::collections::HashSet::new();
    for i in 0..10 {
        let entry = store.record(new_entry(&format!("spice-{}", i), 0.5));
        assert!(ids.insert(entry.id));
    }
}
