use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use spice_ai_rust::{classifier, cli, config, error, history, scanner, validator};

use cli::{Cli, Commands};
use config::Config;
use error::{Result, SpiceAiError};
use history::{FileStore, HistoryStore, NewHistoryEntry};
use validator::ValidationResult;

/// 一括処理でファイル単位の結果をJSON保存するための形
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassificationRecord {
    file_name: String,
    date: Option<String>,
    predictions: Vec<classifier::Prediction>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Classify { path, api_url, output, no_history, force, recursive } => {
            println!("🌶 spice-ai - スパイス画像分類\n");

            let base_url = api_url.unwrap_or_else(|| config.api_url());
            let client = classifier::build_client(config.timeout_seconds)?;
            let mut store = HistoryStore::new(FileStore::new(config.data_dir()?));

            if path.is_dir() {
                classify_folder(
                    &client, &base_url, &path, recursive, force, no_history,
                    output.as_deref(), &mut store, cli.verbose,
                )
                .await?;
            } else {
                classify_single(
                    &client, &base_url, &path, force, no_history,
                    output.as_deref(), &mut store, cli.verbose,
                )
                .await?;
            }
        }

        Commands::Validate { path, recursive } => {
            println!("🔍 spice-ai - 画像検証\n");

            if path.is_dir() {
                let images = scanner::scan_folder(&path, recursive)?;
                if images.is_empty() {
                    return Err(SpiceAiError::NoImagesFound(path.display().to_string()));
                }
                println!("{}枚の画像を検証中...\n", images.len());

                let paths: Vec<_> = images.iter().map(|i| i.path.clone()).collect();
                let mut valid_count = 0;
                for (p, result) in validator::validate_batch(&paths) {
                    let icon = validation_icon(&result);
                    let name = p
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    println!("{} {}", icon, name);
                    print_diagnostics(&result, "  ");
                    if result.is_valid {
                        valid_count += 1;
                    }
                }
                println!("\n✔ 検証完了: {}/{} 枚が送信可能", valid_count, images.len());
            } else {
                let result = validator::validate_image(&path);
                println!("{} {}", validation_icon(&result), path.display());
                print_diagnostics(&result, "  ");
                if !result.is_valid {
                    return Err(SpiceAiError::InvalidImage(result.errors.join(" ")));
                }
            }
        }

        Commands::History { json, delete, clear, yes } => {
            let mut store = HistoryStore::new(FileStore::new(config.data_dir()?));

            if let Some(id) = delete {
                store.delete_one(&id);
                println!("✔ 履歴エントリを削除しました: {}", id);
                return Ok(());
            }

            if clear {
                let confirmed = yes
                    || dialoguer::Confirm::new()
                        .with_prompt("履歴を全て削除しますか?")
                        .default(false)
                        .interact()
                        .unwrap_or(false);
                if confirmed {
                    store.clear_all();
                    println!("✔ 履歴を全て削除しました");
                } else {
                    println!("キャンセルしました");
                }
                return Ok(());
            }

            let entries = store.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("履歴はありません");
                return Ok(());
            }

            println!("📋 分類履歴 ({}件)\n", entries.len());
            for (i, entry) in entries.iter().enumerate() {
                println!(
                    "{:2}. {} ({:.1}%) - {}",
                    i + 1,
                    entry.top_prediction.spice,
                    entry.top_prediction.confidence * 100.0,
                    history::format_relative_age(entry.timestamp),
                );
                if cli.verbose {
                    println!("    id: {}", entry.id);
                    for p in &entry.all_predictions {
                        println!("      {} {:.1}%", p.spice, p.confidence * 100.0);
                    }
                }
            }
        }

        Commands::Config { set_api_url, show } => {
            let mut config = config;

            if let Some(url) = set_api_url {
                config.set_api_url(url)?;
                println!("✔ 予測サービスURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  予測サービスURL: {}", config.api_url());
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  保存先: {}", config.data_dir()?.display());
            }
        }

        Commands::Health => {
            println!("🩺 spice-ai - 稼働確認\n");
            let client = classifier::build_client(config.timeout_seconds)?;
            let status = classifier::check_health(&client, &config.api_url()).await?;
            println!("✔ ステータス: {}", status.status);
            if let Some(loaded) = status.model_loaded {
                println!("  モデル: {}", if loaded { "ロード済み" } else { "未ロード" });
            }
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn classify_single(
    client: &reqwest::Client,
    base_url: &str,
    path: &std::path::Path,
    force: bool,
    no_history: bool,
    output: Option<&std::path::Path>,
    store: &mut HistoryStore<FileStore>,
    verbose: bool,
) -> Result<()> {
    // 1. 検証
    println!("[1/2] 画像を検証中...");
    let result = validator::validate_image(path);
    print_diagnostics(&result, "  ");

    if !result.is_valid {
        if !force {
            return Err(SpiceAiError::InvalidImage(result.errors.join(" ")));
        }
        println!("  ⚠ 検証エラーを無視して送信します (--force)");
    }

    // 2. 分類
    println!("[2/2] 分類中...");
    let predictions = classifier::classify(client, base_url, path).await?;
    println!("✔ 分類完了\n");

    print_predictions(&predictions);

    // 履歴に記録
    if !no_history {
        record_history(store, path, &predictions, verbose);
    }

    if let Some(out) = output {
        let json = serde_json::to_string_pretty(&predictions)?;
        std::fs::write(out, json)?;
        println!("\n✔ 結果を保存: {}", out.display());
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn classify_folder(
    client: &reqwest::Client,
    base_url: &str,
    folder: &std::path::Path,
    recursive: bool,
    force: bool,
    no_history: bool,
    output: Option<&std::path::Path>,
    store: &mut HistoryStore<FileStore>,
    verbose: bool,
) -> Result<()> {
    // 1. スキャン
    println!("[1/3] 画像をスキャン中...");
    let images = scanner::scan_folder(folder, recursive)?;
    println!("✔ {}枚の画像を検出\n", images.len());

    if images.is_empty() {
        return Err(SpiceAiError::NoImagesFound(folder.display().to_string()));
    }

    // 2. 検証（並列）
    println!("[2/3] 画像を検証中...");
    let paths: Vec<_> = images.iter().map(|i| i.path.clone()).collect();
    let verdicts = validator::validate_batch(&paths);

    let mut send_list = Vec::new();
    let mut skipped = 0;
    for (info, (_, result)) in images.iter().zip(verdicts.iter()) {
        if result.is_valid || force {
            send_list.push(info);
        } else {
            skipped += 1;
            println!("  ❌ {} をスキップ: {}", info.file_name, result.errors.join(" "));
        }
    }
    println!("✔ 検証完了（送信 {}枚 / スキップ {}枚）\n", send_list.len(), skipped);

    // 3. 分類
    println!("[3/3] 分類中...");
    let bar = ProgressBar::new(send_list.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("  {bar:30} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut records = Vec::new();
    for info in send_list {
        bar.set_message(info.file_name.clone());
        match classifier::classify(client, base_url, &info.path).await {
            Ok(predictions) => {
                if !no_history {
                    record_history(store, &info.path, &predictions, verbose);
                }
                records.push(ClassificationRecord {
                    file_name: info.file_name.clone(),
                    date: info.date.clone(),
                    predictions,
                });
            }
            Err(e) => {
                bar.println(format!("  ❌ {}: {}", info.file_name, e));
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();
    println!("✔ 分類完了（{}枚）\n", records.len());

    for record in &records {
        let top = record.predictions.first();
        match top {
            Some(p) => println!(
                "  {} → {} ({:.1}%)",
                record.file_name,
                p.spice,
                p.confidence * 100.0
            ),
            None => println!("  {} → 予測なし", record.file_name),
        }
    }

    if let Some(out) = output {
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(out, json)?;
        println!("\n✔ 結果を保存: {}", out.display());
    }

    println!("\n✅ 完了");
    Ok(())
}

/// 分類結果を履歴ストアへ記録（失敗しても分類フローは止めない）
fn record_history(
    store: &mut HistoryStore<FileStore>,
    path: &std::path::Path,
    predictions: &[classifier::Prediction],
    verbose: bool,
) {
    let Some(top) = predictions.first() else {
        return;
    };

    match history::image_data_url(path) {
        Ok(image_url) => {
            let entry = store.record(NewHistoryEntry {
                image_url,
                top_prediction: top.clone(),
                all_predictions: predictions.to_vec(),
            });
            if verbose {
                println!("  履歴に記録: {}", entry.id);
            }
        }
        Err(e) => {
            if verbose {
                println!("  履歴記録をスキップ: {}", e);
            }
        }
    }
}

fn print_predictions(predictions: &[classifier::Prediction]) {
    if predictions.is_empty() {
        println!("予測結果がありません");
        return;
    }

    println!("🏆 予測結果 (top-{})", predictions.len());
    for (i, p) in predictions.iter().enumerate() {
        println!("  {}. {} - {:.1}%", i + 1, p.spice, p.confidence * 100.0);
    }
}

/// 検証結果の要約アイコン
fn validation_icon(result: &ValidationResult) -> &'static str {
    if !result.is_valid {
        "❌"
    } else if !result.warnings.is_empty() {
        "⚠"
    } else {
        "✓"
    }
}

fn print_diagnostics(result: &ValidationResult, indent: &str) {
    for e in &result.errors {
        println!("{}❌ {}", indent, e);
    }
    for w in &result.warnings {
        println!("{}⚠ {}", indent, w);
    }
    for s in &result.suggestions {
        println!("{}💡 {}", indent, s);
    }
}
