//! 特徴点抽出
//!
//! FAST-9 コーナー + 回転補正 BRIEF による ORB 方式の2値記述子。
//! `opencv` feature 有効時は OpenCV の ORB を使う。
//! 参照画像とスクショのセルで同じ抽出器を使う。

pub mod brief;
#[cfg(feature = "opencv")]
pub mod cv_orb;

use crate::error::{CardRankError, Result};
use image::{DynamicImage, GrayImage};
use imageproc::corners::corners_fast9;
use imageproc::filter::gaussian_blur_f32;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DESCRIPTOR_BYTES: usize = 32;

/// 256ビットの2値記述子
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// 1枚の画像から得た記述子の列
pub type DescriptorSet = Vec<Descriptor>;

/// キャッシュに記録する抽出器名
#[cfg(not(feature = "opencv"))]
pub const EXTRACTOR: &str = "fast9-brief";
#[cfg(feature = "opencv")]
pub const EXTRACTOR: &str = "opencv-orb";

/// 照合に使う最小記述子数（これ未満の画像は信頼できない）
pub const MIN_DESCRIPTORS: usize = 3;

/// キーポイントを取らない画像端の幅
const BORDER: u32 = brief::PATCH_RADIUS as u32 + 1;

/// 記述子サンプリング前の平滑化
const SMOOTHING_SIGMA: f32 = 2.0;

/// 抽出パラメータ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureParams {
    /// FAST の輝度差しきい値
    pub fast_threshold: u8,
    /// スコア上位から採用するキーポイント数
    pub max_features: usize,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            max_features: 500,
        }
    }
}

/// グレースケール画像から記述子を抽出
pub fn extract(gray: &GrayImage, params: &FeatureParams) -> DescriptorSet {
    #[cfg(feature = "opencv")]
    {
        cv_orb::extract(gray, params)
    }
    #[cfg(not(feature = "opencv"))]
    {
        extract_fast_brief(gray, params)
    }
}

/// FAST-9 + BRIEF で記述子を抽出
pub fn extract_fast_brief(gray: &GrayImage, params: &FeatureParams) -> DescriptorSet {
    let (width, height) = gray.dimensions();
    if width <= 2 * BORDER || height <= 2 * BORDER {
        return Vec::new();
    }

    let mut corners: Vec<_> = corners_fast9(gray, params.fast_threshold)
        .into_iter()
        .filter(|c| {
            c.x >= BORDER && c.y >= BORDER && c.x < width - BORDER && c.y < height - BORDER
        })
        .collect();

    // スコア降順、同点は走査順
    corners.sort_by(|a, b| b.score.total_cmp(&a.score));
    corners.truncate(params.max_features);

    if corners.is_empty() {
        return Vec::new();
    }

    let smoothed = gaussian_blur_f32(gray, SMOOTHING_SIGMA);

    corners
        .iter()
        .map(|c| {
            let angle = brief::orientation(gray, c.x, c.y);
            brief::describe(&smoothed, c.x, c.y, angle)
        })
        .collect()
}

/// カラー画像から記述子を抽出（輝度に変換してから）
pub fn extract_from_image(image: &DynamicImage, params: &FeatureParams) -> DescriptorSet {
    extract(&image.to_luma8(), params)
}

/// 画像ファイルから記述子を抽出
pub fn load_descriptors(path: &Path, params: &FeatureParams) -> Result<DescriptorSet> {
    if !path.exists() {
        return Err(CardRankError::ImageLoad(format!(
            "画像が存在しません: {}",
            path.display()
        )));
    }

    let image = image::open(path).map_err(|e| {
        CardRankError::ImageLoad(format!("{}: {}", path.display(), e))
    })?;

    Ok(extract_from_image(&image, params))
}

/// ハミング距離
pub fn hamming(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blocks_image() -> GrayImage {
        let mut img = GrayImage::from_pixel(160, 160, Luma([20]));
        for (x0, y0, w, h, v) in [
            (30u32, 30u32, 40u32, 30u32, 230u8),
            (90, 40, 35, 50, 180),
            (40, 100, 60, 25, 250),
            (110, 105, 20, 30, 120),
        ] {
            for y in y0..y0 + h {
                for x in x0..x0 + w {
                    img.put_pixel(x, y, Luma([v]));
                }
            }
        }
        img
    }

    #[test]
    fn test_hamming() {
        let a = [0u8; DESCRIPTOR_BYTES];
        let mut b = [0u8; DESCRIPTOR_BYTES];
        assert_eq!(hamming(&a, &b), 0);

        b[0] = 0b1011;
        b[31] = 0xFF;
        assert_eq!(hamming(&a, &b), 11);
        assert_eq!(hamming(&b, &b), 0);
    }

    #[test]
    fn test_extract_finds_corners() {
        let descs = extract_fast_brief(&blocks_image(), &FeatureParams::default());
        assert!(descs.len() >= MIN_DESCRIPTORS, "found {}", descs.len());
    }

    #[test]
    fn test_extract_is_deterministic() {
        let img = blocks_image();
        let params = FeatureParams::default();
        assert_eq!(extract_fast_brief(&img, &params), extract_fast_brief(&img, &params));
    }

    #[test]
    fn test_extract_respects_max_features() {
        let params = FeatureParams {
            max_features: 4,
            ..Default::default()
        };
        assert!(extract_fast_brief(&blocks_image(), &params).len() <= 4);
    }

    #[test]
    fn test_flat_image_has_no_features() {
        let img = GrayImage::from_pixel(100, 100, Luma([90]));
        assert!(extract_fast_brief(&img, &FeatureParams::default()).is_empty());
    }

    #[test]
    fn test_tiny_image_has_no_features() {
        let img = GrayImage::from_pixel(20, 20, Luma([0]));
        assert!(extract_fast_brief(&img, &FeatureParams::default()).is_empty());
    }

    #[test]
    fn test_load_missing_image() {
        let result = load_descriptors(Path::new("/nonexistent/card.png"), &FeatureParams::default());
        assert!(matches!(result, Err(CardRankError::ImageLoad(_))));
    }
}
