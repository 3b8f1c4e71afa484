//! 排行統合モジュール
//!
//! 排行表ごとに分かれた CardData の行をカード単位にまとめ、
//! 主榜（通常排行・对决排行）と副榜の要約文字列を作る。

use crate::error::{Error, Result};
use crate::types::{CardDataRow, CatalogEntry, RAIL_UNRESTRICTED};
use regex::Regex;
use std::collections::HashMap;

/// 主榜として扱うカテゴリ（表示順）
pub const MAIN_RANKS: [&str; 2] = ["通常排行", "对决排行"];

/// 1枚分の集計途中データ
struct RankAccumulator {
    base: CardDataRow,
    main: [Option<String>; 2],
    other: Vec<(String, String)>,
    rail_color: String,
}

/// CardData の行をカード単位に統合
///
/// - 出力順はカードの初出順
/// - 基本情報（tableheader, idol_type, idol_rarity, card_path）は初出行から取る
/// - 軌道色は最後に見た行の値で上書きする
/// - 同じカテゴリが複数回出た場合は後の値が優先
pub fn merge_card_ranks(rows: &[CardDataRow]) -> Vec<CatalogEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut cards: HashMap<String, RankAccumulator> = HashMap::new();

    for row in rows {
        let acc = cards.entry(row.card_name.clone()).or_insert_with(|| {
            order.push(row.card_name.clone());
            RankAccumulator {
                base: row.clone(),
                main: [None, None],
                other: Vec::new(),
                rail_color: RAIL_UNRESTRICTED.to_string(),
            }
        });

        acc.rail_color = row.rail_color.clone();

        match MAIN_RANKS.iter().position(|m| *m == row.category) {
            Some(idx) => acc.main[idx] = Some(row.strength.clone()),
            None => {
                if let Some(slot) = acc.other.iter_mut().find(|(k, _)| *k == row.category) {
                    slot.1 = row.strength.clone();
                } else {
                    acc.other.push((row.category.clone(), row.strength.clone()));
                }
            }
        }
    }

    order
        .into_iter()
        .filter_map(|name| cards.remove(&name).map(|acc| (name, acc)))
        .map(|(name, acc)| {
            let main_ranks = MAIN_RANKS
                .iter()
                .zip(acc.main.iter())
                .filter_map(|(rank, value)| match value {
                    Some(v) if !v.is_empty() => Some(format!("{}:{}", rank, v)),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(",");

            let other_ranks = acc
                .other
                .iter()
                .map(|(k, v)| format!("{}:{}", k, v))
                .collect::<Vec<_>>()
                .join(",");

            CatalogEntry {
                card_id: name,
                image_path: acc.base.card_path,
                category: String::new(),
                strength: String::new(),
                table_header: acc.base.table_header,
                rail_color: acc.rail_color,
                idol_type: acc.base.idol_type,
                idol_rarity: acc.base.idol_rarity,
                main_ranks,
                other_ranks,
            }
        })
        .collect()
}

/// "通常排行:S,对决排行:A" を (カテゴリ, ランク) の列に分解
///
/// 空文字列は空の列を返す。":" を含まない項目はエラー。
pub fn parse_rank_pairs(text: &str) -> Result<Vec<(String, String)>> {
    lazy_static::lazy_static! {
        static ref PAIR: Regex = Regex::new(r"^\s*([^:]+?)\s*:\s*(.*?)\s*$").unwrap();
    }

    let text = text.trim();
    if text.is_empty() || text == "nan" {
        return Ok(Vec::new());
    }

    text.split(',')
        .map(|item| {
            PAIR.captures(item)
                .map(|caps| (caps[1].to_string(), caps[2].to_string()))
                .ok_or_else(|| Error::Parse(format!("ランク項目に ':' がありません: {}", item)))
        })
        .collect()
}
