//! 記述子照合
//!
//! 総当たりのハミング距離マッチングを相互最近傍チェック付きで行い、
//! 平均距離が最小の候補を選ぶ。
//! `opencv` feature 有効時は OpenCV の BFMatcher（crossCheck）を使う。

#[cfg(feature = "opencv")]
mod cv_bf;
mod types;

pub use types::{DescriptorMatch, MatchResult};

use crate::features::{hamming, Descriptor, MIN_DESCRIPTORS};

/// 各記述子の最近傍（同距離は小さい添字）
fn nearest(from: &[Descriptor], to: &[Descriptor]) -> Vec<Option<(usize, u32)>> {
    from.iter()
        .map(|a| {
            to.iter()
                .enumerate()
                .map(|(j, b)| (j, hamming(a, b)))
                .fold(None, |best: Option<(usize, u32)>, (j, d)| match best {
                    Some((_, bd)) if bd <= d => best,
                    _ => Some((j, d)),
                })
        })
        .collect()
}

/// 相互最近傍マッチング
///
/// query[i] の最近傍が train[j] で、かつ train[j] の最近傍が query[i] のときだけ採用する。
pub fn cross_check_match(query: &[Descriptor], train: &[Descriptor]) -> Vec<DescriptorMatch> {
    if query.is_empty() || train.is_empty() {
        return Vec::new();
    }

    #[cfg(feature = "opencv")]
    {
        cv_bf::cross_check_match(query, train)
    }
    #[cfg(not(feature = "opencv"))]
    {
        brute_force_cross_check(query, train)
    }
}

/// 総当たりの相互最近傍マッチング（query 順）
pub fn brute_force_cross_check(query: &[Descriptor], train: &[Descriptor]) -> Vec<DescriptorMatch> {
    if query.is_empty() || train.is_empty() {
        return Vec::new();
    }

    let forward = nearest(query, train);
    let backward = nearest(train, query);

    forward
        .iter()
        .enumerate()
        .filter_map(|(i, nn)| {
            let (j, distance) = (*nn)?;
            match backward[j] {
                Some((back, _)) if back == i => Some(DescriptorMatch {
                    query_idx: i,
                    train_idx: j,
                    distance,
                }),
                _ => None,
            }
        })
        .collect()
}

/// 対応点の平均距離。対応が無ければ None
pub fn mean_distance(matches: &[DescriptorMatch]) -> Option<f32> {
    if matches.is_empty() {
        return None;
    }
    let total: u64 = matches.iter().map(|m| m.distance as u64).sum();
    Some(total as f32 / matches.len() as f32)
}

/// 候補の中から平均距離が最小のものを選ぶ
///
/// - 記述子が MIN_DESCRIPTORS 未満の候補は対象外
/// - 対応が1つも取れない候補はスキップ
/// - 同スコアは先に出た候補を優先
pub fn best_candidate<'a, K, I>(query: &[Descriptor], candidates: I) -> Option<(K, f32)>
where
    I: IntoIterator<Item = (K, &'a [Descriptor])>,
{
    let mut best: Option<(K, f32)> = None;

    for (key, train) in candidates {
        if train.len() < MIN_DESCRIPTORS {
            continue;
        }

        let matches = cross_check_match(query, train);
        let Some(score) = mean_distance(&matches) else {
            continue;
        };

        let better = match &best {
            Some((_, best_score)) => score < *best_score,
            None => true,
        };
        if better {
            best = Some((key, score));
        }
    }

    best
}
