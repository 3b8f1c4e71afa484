//! OpenCV BFMatcher による相互最近傍マッチング（`opencv` feature）

use super::DescriptorMatch;
use crate::features::Descriptor;
use opencv::core::{DMatch, Mat, Vector, NORM_HAMMING};
use opencv::features2d::BFMatcher;
use opencv::prelude::*;

/// crossCheck 付き BFMatcher で照合。OpenCV の失敗はログに残して空を返す
pub fn cross_check_match(query: &[Descriptor], train: &[Descriptor]) -> Vec<DescriptorMatch> {
    match train_match(query, train) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("BFMatcher 照合失敗: {}", e);
            Vec::new()
        }
    }
}

fn train_match(query: &[Descriptor], train: &[Descriptor]) -> opencv::Result<Vec<DescriptorMatch>> {
    let query = Mat::from_slice_2d(query)?;
    let train = Mat::from_slice_2d(train)?;

    let matcher = BFMatcher::create(NORM_HAMMING, true)?;
    let mut matches = Vector::<DMatch>::new();
    matcher.train_match(&query, &train, &mut matches, &Mat::default())?;

    Ok(matches
        .iter()
        .filter_map(|m| {
            Some(DescriptorMatch {
                query_idx: usize::try_from(m.query_idx).ok()?,
                train_idx: usize::try_from(m.train_idx).ok()?,
                distance: m.distance.round() as u32,
            })
        })
        .collect())
}
