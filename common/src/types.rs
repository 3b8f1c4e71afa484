//! カードデータの型定義
//!
//! - CardDataRow: 排行表の1セル（カテゴリ×強度×カード）。CardData.xlsx の1行
//! - CatalogEntry: カード1枚分に統合した行。CardRank.xlsx の1行で、照合の参照カタログ

use serde::{Deserialize, Serialize};

/// 軌道色の既定値（色指定のないセル）
pub const RAIL_UNRESTRICTED: &str = "无限制";

/// CardData.xlsx の列順
pub const CARD_DATA_COLUMNS: [&str; 8] = [
    "category",
    "strength",
    "tableheader",
    "railcolor",
    "card_name",
    "idol_type",
    "idol_rarity",
    "card_path",
];

/// CardRank.xlsx の列順
pub const CARD_RANK_COLUMNS: [&str; 8] = [
    "tableheader",
    "card_name",
    "idol_type",
    "idol_rarity",
    "card_path",
    "main_ranks",
    "other_ranks",
    "railcolor",
];

/// 排行表から抽出した1行
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardDataRow {
    pub category: String,         // 排行カテゴリ（通常排行など）
    pub strength: String,         // 強度ランク
    #[serde(rename = "tableheader")]
    pub table_header: String,
    #[serde(rename = "railcolor")]
    pub rail_color: String,       // 軌道色
    pub card_name: String,
    pub idol_type: String,        // 得分/辅助/支援
    pub idol_rarity: String,      // 歌唱/舞蹈/表演
    pub card_path: String,
}

/// 参照カタログの1エントリ
///
/// カード名で一意。読み込み後は変更しない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    #[serde(rename = "card_name")]
    pub card_id: String,

    /// 参照画像のパス
    #[serde(rename = "card_path")]
    pub image_path: String,

    pub category: String,
    pub strength: String,

    #[serde(rename = "tableheader")]
    pub table_header: String,

    #[serde(rename = "railcolor")]
    pub rail_color: String,

    pub idol_type: String,
    pub idol_rarity: String,

    /// "通常排行:S,对决排行:A" 形式
    pub main_ranks: String,

    /// "其他排行:B,..." 形式
    pub other_ranks: String,
}

impl CatalogEntry {
    /// カード名の "-" より前の部分
    pub fn base_name(&self) -> &str {
        self.card_id.split('-').next().unwrap_or(&self.card_id)
    }

    /// CardRank.xlsx の列名で値を取得
    pub fn column(&self, name: &str) -> &str {
        match name {
            "card_name" => &self.card_id,
            "card_path" => &self.image_path,
            "category" => &self.category,
            "strength" => &self.strength,
            "tableheader" => &self.table_header,
            "railcolor" => &self.rail_color,
            "idol_type" => &self.idol_type,
            "idol_rarity" => &self.idol_rarity,
            "main_ranks" => &self.main_ranks,
            "other_ranks" => &self.other_ranks,
            _ => "",
        }
    }
}

impl CardDataRow {
    /// CardData.xlsx の列名で値を取得
    pub fn column(&self, name: &str) -> &str {
        match name {
            "category" => &self.category,
            "strength" => &self.strength,
            "tableheader" => &self.table_header,
            "railcolor" => &self.rail_color,
            "card_name" => &self.card_name,
            "idol_type" => &self.idol_type,
            "idol_rarity" => &self.idol_rarity,
            "card_path" => &self.card_path,
            _ => "",
        }
    }
}
