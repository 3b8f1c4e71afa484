//! スクショのグリッド分割
//!
//! セル幅・高さは整数除算で一度だけ求めて全セルに使う。
//! 割り切れない右端・下端の余りピクセルは捨てる。

use crate::error::{CardRankError, Result};
use crate::region::Rect;
use image::{imageops, RgbImage};

/// 行数・列数の上限
pub const MAX_GRID: u32 = 5;

/// 行数・列数が 1..=MAX_GRID に収まるか
pub fn validate_grid(rows: u32, cols: u32) -> Result<()> {
    if (1..=MAX_GRID).contains(&rows) && (1..=MAX_GRID).contains(&cols) {
        Ok(())
    } else {
        Err(CardRankError::InvalidGrid { rows, cols })
    }
}

/// rows×cols に分割（左上から行優先）
pub fn split(image: &RgbImage, rows: u32, cols: u32) -> Result<Vec<RgbImage>> {
    if rows == 0 || cols == 0 {
        return Err(CardRankError::InvalidGrid { rows, cols });
    }

    let region = Rect::full(image);
    (0..rows * cols)
        .map(|idx| {
            let cell = cell_rect(region, rows, cols, idx)?;
            Ok(imageops::crop_imm(image, cell.x, cell.y, cell.width, cell.height).to_image())
        })
        .collect()
}

/// idx 番目のセルが region 内で占める矩形
///
/// rows, cols が 0 なら InvalidGrid。
pub fn cell_rect(region: Rect, rows: u32, cols: u32, idx: u32) -> Result<Rect> {
    if rows == 0 || cols == 0 {
        return Err(CardRankError::InvalidGrid { rows, cols });
    }

    let cell_w = region.width / cols;
    let cell_h = region.height / rows;
    let (row, col) = (idx / cols, idx % cols);
    Ok(Rect::new(region.x + col * cell_w, region.y + row * cell_h, cell_w, cell_h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 7]))
    }

    #[test]
    fn test_split_count_and_order() {
        let img = gradient(90, 60);
        let cells = split(&img, 2, 3).unwrap();
        assert_eq!(cells.len(), 6);

        // 行優先: (0,0) (0,1) (0,2) (1,0) ...
        assert_eq!(cells[0].get_pixel(0, 0).0, [0, 0, 7]);
        assert_eq!(cells[1].get_pixel(0, 0).0, [30, 0, 7]);
        assert_eq!(cells[2].get_pixel(0, 0).0, [60, 0, 7]);
        assert_eq!(cells[3].get_pixel(0, 0).0, [0, 30, 7]);
        assert_eq!(cells[5].get_pixel(0, 0).0, [60, 30, 7]);
    }

    #[test]
    fn test_split_single_cell_is_whole_image() {
        let img = gradient(73, 41);
        let cells = split(&img, 1, 1).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0], img);
    }

    #[test]
    fn test_split_truncates_remainder() {
        let img = gradient(101, 52);
        let cells = split(&img, 5, 2).unwrap();
        assert_eq!(cells.len(), 10);
        for cell in &cells {
            assert_eq!(cell.dimensions(), (50, 10));
        }
        // 最終セルも余りを含まない
        assert_eq!(cells[9].get_pixel(49, 9).0, [99, 49, 7]);
    }

    #[test]
    fn test_split_zero_grid() {
        let img = gradient(10, 10);
        assert!(matches!(split(&img, 0, 2), Err(CardRankError::InvalidGrid { rows: 0, cols: 2 })));
    }

    #[test]
    fn test_cell_rect_offsets_region() {
        let region = Rect::new(100, 200, 300, 120);
        assert_eq!(cell_rect(region, 2, 3, 4).unwrap(), Rect::new(200, 260, 100, 60));
    }

    #[test]
    fn test_cell_rect_zero_grid() {
        let region = Rect::new(0, 0, 300, 120);
        assert!(matches!(
            cell_rect(region, 0, 3, 0),
            Err(CardRankError::InvalidGrid { rows: 0, cols: 3 })
        ));
        assert!(matches!(
            cell_rect(region, 2, 0, 1),
            Err(CardRankError::InvalidGrid { rows: 2, cols: 0 })
        ));
    }

    #[test]
    fn test_validate_grid() {
        assert!(validate_grid(1, 1).is_ok());
        assert!(validate_grid(5, 5).is_ok());
        assert!(validate_grid(0, 1).is_err());
        assert!(validate_grid(1, 6).is_err());
    }
}
