//! 認識セッション
//!
//! カタログの選択・グリッドの行列数・表示フラグをまとめた設定を受け取り、
//! 範囲選択 → グリッド分割 → セルごとの照合 → 表示用ラベル作成 までを行う。

use crate::diagnostics::DiagnosticSink;
use crate::error::{CardRankError, Result};
use crate::features::FeatureParams;
use crate::grid;
use crate::recognizer::Recognizer;
use crate::region::{self, Rect, RegionSelector, MIN_SELECTION};
use card_rank_common::{CardDetails, CatalogEntry, OverlayLabel};
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 1回のセッションの設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub catalog_path: PathBuf,
    pub grid_rows: u32,
    pub grid_cols: u32,
    pub show_overlays: bool,
    pub show_details: bool,
    pub features: FeatureParams,
}

impl SessionConfig {
    pub fn new(catalog_path: PathBuf) -> Self {
        Self {
            catalog_path,
            grid_rows: 1,
            grid_cols: 1,
            show_overlays: true,
            show_details: true,
            features: FeatureParams::default(),
        }
    }

    pub fn with_grid(mut self, rows: u32, cols: u32) -> Self {
        self.grid_rows = rows;
        self.grid_cols = cols;
        self
    }

    pub fn validate(&self) -> Result<()> {
        grid::validate_grid(self.grid_rows, self.grid_cols)
    }
}

/// セル1つ分の結果
#[derive(Debug, Clone, Serialize)]
pub struct CellReport {
    pub index: u32,
    pub row: u32,
    pub col: u32,
    /// 画面上の位置
    pub rect: Rect,
    pub card: Option<CatalogEntry>,
    pub score: Option<f32>,
    /// show_overlays が無効なら None
    pub overlay: Option<OverlayLabel>,
    /// 照合できなかった理由
    pub error: Option<String>,
}

impl CellReport {
    pub fn is_match(&self) -> bool {
        self.card.is_some()
    }
}

/// 1回の認識結果
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionReport {
    pub region: Rect,
    pub rows: u32,
    pub cols: u32,
    pub cells: Vec<CellReport>,
    /// 先頭セルの詳細（show_details が有効かつ一致した場合）
    pub details: Option<CardDetails>,
}

impl RecognitionReport {
    pub fn matched_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_match()).count()
    }
}

pub struct Session {
    config: SessionConfig,
    recognizer: Recognizer,
}

impl Session {
    /// カタログと特徴キャッシュを用意してセッションを開始
    pub fn open(config: SessionConfig, sink: &mut dyn DiagnosticSink) -> Result<Self> {
        config.validate()?;
        let recognizer = Recognizer::open(&config.catalog_path, config.features, false, sink);
        Ok(Self { config, recognizer })
    }

    pub fn with_recognizer(config: SessionConfig, recognizer: Recognizer) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, recognizer })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn recognizer(&self) -> &Recognizer {
        &self.recognizer
    }

    /// 画面画像から範囲を選んで認識
    pub fn recognize(
        &self,
        screen: &RgbImage,
        selector: &mut dyn RegionSelector,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<RecognitionReport> {
        let rect = selector.select_region(screen)?;
        let captured = region::crop(screen, rect);
        self.recognize_region(&captured, rect, sink)
    }

    /// 切り出し済みの範囲画像を認識
    ///
    /// セル単位の失敗は CellReport.error と診断に残し、全体は止めない。
    pub fn recognize_region(
        &self,
        captured: &RgbImage,
        rect: Rect,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<RecognitionReport> {
        let (width, height) = captured.dimensions();
        if width < MIN_SELECTION || height < MIN_SELECTION {
            return Err(CardRankError::RegionTooSmall { width, height });
        }

        let (rows, cols) = (self.config.grid_rows, self.config.grid_cols);
        let cells = grid::split(captured, rows, cols)?;
        let total = cells.len();

        let mut reports = Vec::with_capacity(total);
        for (idx, cell) in cells.into_iter().enumerate() {
            let index = idx as u32;
            let cell_rect = grid::cell_rect(rect, rows, cols, index)?;
            tracing::debug!("識別中: {}/{}", idx + 1, total);

            let mut report = CellReport {
                index,
                row: index / cols,
                col: index % cols,
                rect: cell_rect,
                card: None,
                score: None,
                overlay: None,
                error: None,
            };

            match self.recognizer.match_image(&DynamicImage::ImageRgb8(cell)) {
                Ok(result) => {
                    report.score = result.score();
                    if self.config.show_overlays {
                        report.overlay = result.matched_entry.as_ref().map(OverlayLabel::for_entry);
                    }
                    report.card = result.matched_entry;
                }
                Err(e) => {
                    sink.report_error(&e);
                    report.error = Some(e.to_string());
                }
            }

            reports.push(report);
        }

        let details = if self.config.show_details {
            reports
                .first()
                .and_then(|c| c.card.as_ref())
                .map(CardDetails::for_entry)
        } else {
            None
        };

        Ok(RecognitionReport {
            region: rect,
            rows,
            cols,
            cells: reports,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::diagnostics::{DiagnosticKind, Diagnostics};
    use crate::recognizer::DescriptorMap;
    use std::path::Path;

    fn empty_session(rows: u32, cols: u32) -> Session {
        let config = SessionConfig::new(PathBuf::from("CardRank.xlsx")).with_grid(rows, cols);
        let recognizer = Recognizer::from_parts(
            Catalog::from_entries(Vec::new(), Path::new("."), &mut ()),
            DescriptorMap::new(),
            FeatureParams::default(),
        );
        Session::with_recognizer(config, recognizer).unwrap()
    }

    #[test]
    fn test_invalid_grid_rejected() {
        let config = SessionConfig::new(PathBuf::from("x.xlsx")).with_grid(0, 3);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_flat_cells_report_insufficient_features() {
        let session = empty_session(2, 2);
        let screen = RgbImage::from_pixel(200, 200, image::Rgb([40, 40, 40]));
        let mut diags = Diagnostics::new();

        let report = session
            .recognize_region(&screen, Rect::new(10, 10, 200, 200), &mut diags)
            .unwrap();

        assert_eq!(report.cells.len(), 4);
        assert_eq!(report.matched_count(), 0);
        assert!(report.cells.iter().all(|c| c.error.is_some()));
        assert_eq!(diags.count(DiagnosticKind::InsufficientFeatures), 4);
        assert_eq!(report.cells[3].rect, Rect::new(110, 110, 100, 100));
        assert!(report.details.is_none());
    }

    #[test]
    fn test_small_region_rejected() {
        let session = empty_session(1, 1);
        let screen = RgbImage::new(40, 120);
        let result = session.recognize_region(&screen, Rect::new(0, 0, 40, 120), &mut ());
        assert!(matches!(result, Err(CardRankError::RegionTooSmall { .. })));
    }
}
