//! 参照カタログ（CardRank.xlsx / CardData.xlsx）の読み込み

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::error::{CardRankError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use card_rank_common::{CardDataRow, CatalogEntry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// カタログに必須の列
const REQUIRED_COLUMNS: [&str; 2] = ["card_name", "card_path"];

/// カード名で一意な参照カタログ
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
    base_dir: PathBuf,
}

impl Catalog {
    /// エントリ列から構築（重複カードは後の方を捨てて通知）
    pub fn from_entries(
        entries: Vec<CatalogEntry>,
        base_dir: &Path,
        sink: &mut dyn DiagnosticSink,
    ) -> Self {
        let mut catalog = Self {
            entries: Vec::with_capacity(entries.len()),
            index: HashMap::new(),
            base_dir: base_dir.to_path_buf(),
        };

        for (row, entry) in entries.into_iter().enumerate() {
            if entry.card_id.trim().is_empty() {
                sink.report(Diagnostic::new(
                    DiagnosticKind::BlankCardName,
                    format!("カード名が空の行をスキップ: {}行目 ({})", row + 1, entry.image_path),
                ));
                continue;
            }
            if catalog.index.contains_key(&entry.card_id) {
                sink.report(Diagnostic::new(
                    DiagnosticKind::DuplicateCard,
                    format!("重複したカードをスキップ: {}", entry.card_id),
                ));
                continue;
            }
            catalog.index.insert(entry.card_id.clone(), catalog.entries.len());
            catalog.entries.push(entry);
        }

        catalog
    }

    /// CardRank.xlsx を読み込み
    pub fn load(path: &Path, sink: &mut dyn DiagnosticSink) -> Result<Self> {
        let table = read_table(path)?;
        for column in REQUIRED_COLUMNS {
            if !table.has_column(column) {
                return Err(CardRankError::CatalogLoad(format!(
                    "必須列 '{}' がありません: {}",
                    column,
                    path.display()
                )));
            }
        }

        let entries = table
            .records()
            .map(|r| CatalogEntry {
                card_id: r.get("card_name"),
                image_path: r.get("card_path"),
                category: r.get("category"),
                strength: r.get("strength"),
                table_header: r.get("tableheader"),
                rail_color: r.get("railcolor"),
                idol_type: r.get("idol_type"),
                idol_rarity: r.get("idol_rarity"),
                main_ranks: r.get("main_ranks"),
                other_ranks: r.get("other_ranks"),
            })
            .collect();

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::from_entries(entries, base_dir, sink))
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, card_id: &str) -> Option<&CatalogEntry> {
        self.index.get(card_id).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 参照画像の実パス（相対パスはカタログのフォルダ基準）
    pub fn resolve_image_path(&self, entry: &CatalogEntry) -> PathBuf {
        let path = Path::new(&entry.image_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// CardData.xlsx（排行表ごとの行）を読み込み
pub fn load_card_data(path: &Path) -> Result<Vec<CardDataRow>> {
    let table = read_table(path)?;
    if !table.has_column("card_name") || !table.has_column("category") {
        return Err(CardRankError::CatalogLoad(format!(
            "CardData の列が不足しています: {}",
            path.display()
        )));
    }

    Ok(table
        .records()
        .map(|r| CardDataRow {
            category: r.get("category"),
            strength: r.get("strength"),
            table_header: r.get("tableheader"),
            rail_color: r.get("railcolor"),
            card_name: r.get("card_name"),
            idol_type: r.get("idol_type"),
            idol_rarity: r.get("idol_rarity"),
            card_path: r.get("card_path"),
        })
        .filter(|row| !row.card_name.trim().is_empty())
        .collect())
}

/// ヘッダー行付きの表
struct Table {
    columns: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

struct Record<'a> {
    columns: &'a HashMap<String, usize>,
    cells: &'a [String],
}

impl Table {
    fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|cells| Record {
            columns: &self.columns,
            cells,
        })
    }
}

impl Record<'_> {
    /// 列が無い・空欄なら空文字列
    fn get(&self, column: &str) -> String {
        self.columns
            .get(column)
            .and_then(|&i| self.cells.get(i))
            .cloned()
            .unwrap_or_default()
    }
}

/// 先頭シートをヘッダー付きの表として読む
fn read_table(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(CardRankError::CatalogLoad(format!(
            "ファイルが見つかりません: {}",
            path.display()
        )));
    }

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| CardRankError::CatalogLoad(format!("{}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CardRankError::CatalogLoad(format!("シートがありません: {}", path.display())))?
        .map_err(|e| CardRankError::CatalogLoad(format!("{}: {}", path.display(), e)))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| CardRankError::CatalogLoad(format!("ヘッダー行がありません: {}", path.display())))?;

    let columns: HashMap<String, usize> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| (cell_to_string(cell).trim().to_string(), i))
        .filter(|(name, _)| !name.is_empty())
        .collect();

    let rows: Vec<Vec<String>> = rows
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(Table { columns, rows })
}

/// セル値を文字列化（空欄・NaN は空文字列、整数値の小数は整数表記）
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => {
            if s == "nan" {
                String::new()
            } else {
                s.trim().to_string()
            }
        }
        Data::Float(f) if f.is_nan() => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;

    fn entry(id: &str, path: &str) -> CatalogEntry {
        CatalogEntry {
            card_id: id.to_string(),
            image_path: path.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_cards_are_skipped() {
        let mut diags = Diagnostics::new();
        let catalog = Catalog::from_entries(
            vec![entry("a", "a.png"), entry("b", "b.png"), entry("a", "other.png")],
            Path::new("."),
            &mut diags,
        );

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("a").map(|e| e.image_path.as_str()), Some("a.png"));
        assert_eq!(diags.count(DiagnosticKind::DuplicateCard), 1);
    }

    #[test]
    fn test_blank_card_names_are_reported() {
        let mut diags = Diagnostics::new();
        let catalog = Catalog::from_entries(
            vec![entry("", "x.png"), entry("a", "a.png"), entry("  ", "y.png")],
            Path::new("."),
            &mut diags,
        );

        assert_eq!(catalog.len(), 1);
        assert_eq!(diags.count(DiagnosticKind::BlankCardName), 2);
        assert!(diags.items()[0].message.contains("x.png"));
    }

    #[test]
    fn test_resolve_relative_path() {
        let catalog = Catalog::from_entries(
            vec![entry("a", "card/a.png"), entry("b", "/abs/b.png")],
            Path::new("/data/export"),
            &mut (),
        );

        let a = catalog.get("a").unwrap();
        let b = catalog.get("b").unwrap();
        assert_eq!(catalog.resolve_image_path(a), PathBuf::from("/data/export/card/a.png"));
        assert_eq!(catalog.resolve_image_path(b), PathBuf::from("/abs/b.png"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalog::load(Path::new("/nonexistent/CardRank.xlsx"), &mut ());
        assert!(matches!(result, Err(CardRankError::CatalogLoad(_))));
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::Float(3.0)), "3");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::String(" S ".into())), "S");
        assert_eq!(cell_to_string(&Data::String("nan".into())), "");
    }
}
