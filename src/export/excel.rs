//! Excel生成
//!
//! CardData.xlsx / CardRank.xlsx を rust_xlsxwriter で書き出す。
//! 列名はカタログ読み込み側（calamine）と同じものを使う。

use crate::error::{CardRankError, Result};
use card_rank_common::{CardDataRow, CatalogEntry, CARD_DATA_COLUMNS, CARD_RANK_COLUMNS};
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, XlsxError};
use std::path::Path;

/// 列名で値を取り出せる行（異なる行型を同じ書き出し処理で扱う）
pub trait SheetRow {
    fn column(&self, name: &str) -> &str;
}

impl SheetRow for CardDataRow {
    fn column(&self, name: &str) -> &str {
        CardDataRow::column(self, name)
    }
}

impl SheetRow for CatalogEntry {
    fn column(&self, name: &str) -> &str {
        CatalogEntry::column(self, name)
    }
}

/// 排行表ごとの行を CardData.xlsx として保存
pub fn write_card_data(rows: &[CardDataRow], output_path: &Path) -> Result<()> {
    write_sheet(rows, &CARD_DATA_COLUMNS, "CardData", output_path)
}

/// カードごとに統合した行を CardRank.xlsx として保存
pub fn write_card_rank(entries: &[CatalogEntry], output_path: &Path) -> Result<()> {
    write_sheet(entries, &CARD_RANK_COLUMNS, "CardRank", output_path)
}

fn write_sheet<T: SheetRow>(
    rows: &[T],
    columns: &[&str],
    sheet_name: &str,
    output_path: &Path,
) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).map_err(xlsx_error)?;

    for (col, name) in columns.iter().enumerate() {
        let col = col as u16;
        worksheet
            .write_string_with_format(0, col, *name, &header_format)
            .map_err(xlsx_error)?;
        worksheet.set_column_width(col, 16).map_err(xlsx_error)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let row_num = (i + 1) as u32;
        for (col, name) in columns.iter().enumerate() {
            let value = row.column(name);
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(row_num, col as u16, value)
                .map_err(xlsx_error)?;
        }
    }

    worksheet.set_freeze_panes(1, 0).map_err(xlsx_error)?;

    workbook.save(output_path).map_err(xlsx_error)?;
    tracing::debug!(rows = rows.len(), "Excel出力: {}", output_path.display());
    Ok(())
}

fn xlsx_error(e: XlsxError) -> CardRankError {
    CardRankError::ExcelGeneration(e.to_string())
}
