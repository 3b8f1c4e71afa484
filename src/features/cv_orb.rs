//! OpenCV ORB による特徴点抽出（`opencv` feature）
//!
//! 画像は PNG に書き出して imdecode でグレースケールとして読み直す。

use super::{Descriptor, DescriptorSet, FeatureParams, DESCRIPTOR_BYTES};
use image::{GrayImage, ImageFormat};
use opencv::core::{KeyPoint, Mat, Vector};
use opencv::features2d::{ORB_ScoreType, ORB};
use opencv::imgcodecs::{imdecode, IMREAD_GRAYSCALE};
use opencv::prelude::*;
use std::io::Cursor;

/// ピラミッド縮小率
const SCALE_FACTOR: f32 = 1.2;
/// ピラミッド段数
const LEVELS: i32 = 8;
/// 端から除外する幅 / パッチサイズ
const PATCH_SIZE: i32 = 31;

/// ORB で記述子を抽出。OpenCV の失敗はログに残して空を返す
pub fn extract(gray: &GrayImage, params: &FeatureParams) -> DescriptorSet {
    match detect_and_compute(gray, params) {
        Ok(descriptors) => descriptors,
        Err(e) => {
            tracing::warn!("ORB 抽出失敗: {}", e);
            Vec::new()
        }
    }
}

fn detect_and_compute(gray: &GrayImage, params: &FeatureParams) -> opencv::Result<DescriptorSet> {
    let mut png = Vec::new();
    gray.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| opencv::Error::new(opencv::core::StsError, format!("PNG 変換失敗: {}", e)))?;

    let img = imdecode(&Mat::from_slice(&png)?, IMREAD_GRAYSCALE)?;
    if img.empty() {
        return Ok(Vec::new());
    }

    let max_features = i32::try_from(params.max_features).unwrap_or(i32::MAX);
    let mut orb = ORB::create(
        max_features,
        SCALE_FACTOR,
        LEVELS,
        PATCH_SIZE,
        0,
        2,
        ORB_ScoreType::HARRIS_SCORE,
        PATCH_SIZE,
        i32::from(params.fast_threshold),
    )?;

    let mut keypoints = Vector::<KeyPoint>::new();
    let mut descriptors = Mat::default();
    orb.detect_and_compute(&img, &Mat::default(), &mut keypoints, &mut descriptors, false)?;

    if descriptors.empty() {
        return Ok(Vec::new());
    }

    Ok(descriptors
        .data_bytes()?
        .chunks_exact(DESCRIPTOR_BYTES)
        .filter_map(|row| Descriptor::try_from(row).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_orb_finds_keypoints() {
        let mut img = GrayImage::from_pixel(200, 200, Luma([20]));
        for y in 50..120 {
            for x in 60..140 {
                img.put_pixel(x, y, Luma([230]));
            }
        }
        let descs = extract(&img, &FeatureParams::default());
        assert!(!descs.is_empty());
        assert!(descs.len() <= FeatureParams::default().max_features);
    }

    #[test]
    fn test_orb_flat_image_is_empty() {
        let img = GrayImage::from_pixel(100, 100, Luma([90]));
        assert!(extract(&img, &FeatureParams::default()).is_empty());
    }
}
