use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardRankError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("カタログ読み込みエラー: {0}")]
    CatalogLoad(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("特徴点が少なすぎます（{found}点、最低{required}点）")]
    InsufficientFeatures { found: usize, required: usize },

    #[error("特徴キャッシュ読み込みエラー: {0}")]
    CacheRead(String),

    #[error("特徴キャッシュ保存エラー: {0}")]
    CacheWrite(String),

    #[error("特徴キャッシュが古くなっています: {0}")]
    StaleCache(String),

    #[error("グリッド指定が不正です: {rows}行 x {cols}列")]
    InvalidGrid { rows: u32, cols: u32 },

    #[error("選択範囲が小さすぎます（{width}x{height}）。50x50以上を選択してください")]
    RegionTooSmall { width: u32, height: u32 },

    #[error("選択範囲が画面外です: {0}")]
    RegionOutOfBounds(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CardRankError>;
