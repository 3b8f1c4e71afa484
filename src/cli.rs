use crate::region::Rect;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "card-rank")]
#[command(about = "アイプラ カード評価表示ツール（スクショ照合・ランク表示）", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 参照画像の特徴キャッシュを作成
    BuildCache {
        /// カタログ（CardRank.xlsx、省略時は設定値）
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// 既存キャッシュを無視して作り直す
        #[arg(long)]
        rebuild: bool,
    },

    /// スクショのカードを識別してランクを表示
    Recognize {
        /// スクショ画像
        #[arg(required = true)]
        screenshot: PathBuf,

        /// カタログ（CardRank.xlsx、省略時は設定値）
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// グリッドの行数 (1-5)
        #[arg(long)]
        rows: Option<u32>,

        /// グリッドの列数 (1-5)
        #[arg(long)]
        cols: Option<u32>,

        /// 照合範囲 "x,y,width,height"（省略時は画像全体）
        #[arg(long)]
        region: Option<Rect>,

        /// セルごとの結果をJSONで保存
        #[arg(long)]
        json: Option<PathBuf>,

        /// ランク表示を省略
        #[arg(long)]
        no_overlay: bool,

        /// 先頭カードの詳細を省略
        #[arg(long)]
        no_details: bool,
    },

    /// CardData.xlsx をカードごとに統合して CardRank.xlsx を作成
    Merge {
        /// 入力 CardData.xlsx
        #[arg(required = true)]
        input: PathBuf,

        /// 出力ファイル/ディレクトリ（省略時は入力と同じフォルダ）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 特徴キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// カタログ（省略時は設定値）
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },

    /// 設定を表示/編集
    Config {
        /// 既定のカタログを設定
        #[arg(long)]
        set_catalog: Option<PathBuf>,

        /// 既定のグリッド "行x列"（例: 2x3）
        #[arg(long)]
        set_grid: Option<GridSize>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

/// "2x3" 形式のグリッド指定
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSize {
    pub rows: u32,
    pub cols: u32,
}

impl std::str::FromStr for GridSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let mut parts = lower.split(['x', '*']).map(|p| p.trim().parse::<u32>());
        match (parts.next(), parts.next(), parts.next()) {
            (Some(Ok(rows)), Some(Ok(cols)), None) => Ok(GridSize { rows, cols }),
            _ => Err(format!("Invalid grid: {}. Use ROWSxCOLS (e.g. 2x3)", s)),
        }
    }
}

impl std::fmt::Display for GridSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}
