//! オーバーレイ表示用の文字列整形
//!
//! 照合結果のカードから、セル上に重ねる短いランク表記と
//! 詳細欄のテキストを作る。描画そのものは扱わない。

use crate::ranks::parse_rank_pairs;
use crate::types::CatalogEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 主榜・副榜が無いときの表記
const EMPTY_LABEL: &str = "-";

/// 詳細欄で値が無いときの表記
const MISSING_VALUE: &str = "无";

/// セル上に表示するラベル
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayLabel {
    pub main: String,
    pub other: String,
    /// "#RRGGBB"。属性が不明なら None
    pub color: Option<String>,
}

impl OverlayLabel {
    pub fn for_entry(entry: &CatalogEntry) -> Self {
        Self {
            main: main_rank_label(&entry.main_ranks),
            other: other_rank_label(&entry.other_ranks),
            color: overlay_color(&entry.idol_rarity).map(str::to_string),
        }
    }
}

/// 詳細欄の内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub title: String,
    pub main_ranks: String,
    pub other_ranks: String,
    pub rail_color: String,
    pub color: Option<String>,
}

impl CardDetails {
    pub fn for_entry(entry: &CatalogEntry) -> Self {
        let or_missing = |s: &str| {
            if s.trim().is_empty() {
                MISSING_VALUE.to_string()
            } else {
                s.to_string()
            }
        };

        Self {
            title: format!(
                "{}-{}{}",
                entry.base_name(),
                entry.idol_type,
                type_symbol(&entry.idol_type)
            ),
            main_ranks: or_missing(&entry.main_ranks),
            other_ranks: or_missing(&entry.other_ranks),
            rail_color: or_missing(&entry.rail_color),
            color: details_color(&entry.idol_rarity).map(str::to_string),
        }
    }
}

impl fmt::Display for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "主榜: {}", self.main_ranks)?;
        writeln!(f, "副榜: {}", self.other_ranks)?;
        write!(f, "轨道颜色: {}", self.rail_color)
    }
}

/// 主榜の短縮表記
///
/// - 2件: "S-A"
/// - 对决排行のみ: "-A"
/// - それ以外の1件: "S"
/// - なし: "-"
pub fn main_rank_label(main_ranks: &str) -> String {
    let pairs = match parse_rank_pairs(main_ranks) {
        Ok(p) => p,
        Err(_) => return EMPTY_LABEL.to_string(),
    };

    match pairs.as_slice() {
        [] => EMPTY_LABEL.to_string(),
        [(category, value)] if category == "对决排行" => format!("-{}", value),
        [(_, value)] => value.clone(),
        many => many
            .iter()
            .map(|(_, v)| v.as_str())
            .collect::<Vec<_>>()
            .join("-"),
    }
}

/// 副榜の短縮表記（"SP-ES" など）
pub fn other_rank_label(other_ranks: &str) -> String {
    let pairs = match parse_rank_pairs(other_ranks) {
        Ok(p) if !p.is_empty() => p,
        _ => return EMPTY_LABEL.to_string(),
    };

    pairs
        .iter()
        .map(|(_, v)| short_rank(v))
        .collect::<Vec<_>>()
        .join("-")
}

/// 副榜ランクの略称
pub fn short_rank(rank: &str) -> &str {
    match rank {
        "辅助sp" => "SP",
        "特殊" => "ES",
        "CT↓" => "CT",
        other => other,
    }
}

/// オーバーレイの属性色
pub fn overlay_color(rarity: &str) -> Option<&'static str> {
    match rarity {
        "歌唱" => Some("#FD4C9D"),
        "舞蹈" => Some("#3ABAFD"),
        "表演" => Some("#FDB10D"),
        _ => None,
    }
}

/// 詳細欄の属性色（表演のみオーバーレイと異なる）
pub fn details_color(rarity: &str) -> Option<&'static str> {
    match rarity {
        "表演" => Some("#E77848"),
        other => overlay_color(other),
    }
}

/// タイプ記号
pub fn type_symbol(idol_type: &str) -> &'static str {
    match idol_type {
        "得分" => "✧",
        "辅助" => "△",
        "支援" => "♡",
        _ => "",
    }
}
