pub mod excel;

use crate::catalog;
use crate::error::Result;
use crate::session::CellReport;
use card_rank_common::merge_card_ranks;
use std::path::{Path, PathBuf};

/// 出力先がフォルダなら `<dir>/<default_name>`、ファイルならそのまま
fn output_path_or_default(output: &Path, default_name: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(default_name)
    } else {
        output.to_path_buf()
    }
}

/// merge の出力先（省略時は入力と同じフォルダの CardRank.xlsx）
pub fn merge_output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    match output {
        Some(path) => output_path_or_default(path, "CardRank.xlsx"),
        None => input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("CardRank.xlsx"),
    }
}

/// CardData.xlsx をカードごとに統合して CardRank.xlsx に保存
///
/// 戻り値は出力したカード数
pub fn merge_card_data(input: &Path, output_path: &Path) -> Result<usize> {
    let rows = catalog::load_card_data(input)?;
    let entries = merge_card_ranks(&rows);
    excel::write_card_rank(&entries, output_path)?;
    Ok(entries.len())
}

/// セルごとの結果を JSON で保存
pub fn write_report_json(cells: &[CellReport], output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(cells)?;
    std::fs::write(output_path, json)?;
    Ok(())
}
