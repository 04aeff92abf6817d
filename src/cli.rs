use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spice-ai")]
#[command(about = "モロッコスパイス画像分類クライアント・履歴管理ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像を検証して予測サービスで分類（フォルダ指定で一括処理）
    Classify {
        /// 画像ファイルまたはフォルダのパス
        #[arg(required = true)]
        path: PathBuf,

        /// 予測サービスのURL（設定より優先）
        #[arg(long)]
        api_url: Option<String>,

        /// 結果をJSONファイルに保存
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 履歴に記録しない
        #[arg(long)]
        no_history: bool,

        /// 検証エラーを無視して送信
        #[arg(long)]
        force: bool,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// 画像の品質を検証（送信なし）
    Validate {
        /// 画像ファイルまたはフォルダのパス
        #[arg(required = true)]
        path: PathBuf,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// 分類履歴を表示・管理
    History {
        /// JSON形式で出力
        #[arg(long)]
        json: bool,

        /// 指定IDのエントリを削除
        #[arg(long)]
        delete: Option<String>,

        /// 履歴を全消去
        #[arg(long)]
        clear: bool,

        /// 確認プロンプトを省略
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// 設定を表示/編集
    Config {
        /// 予測サービスURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// 予測サービスの稼働確認
    Health,
}
