//! カード認識
//!
//! 参照カタログと特徴キャッシュを一度だけ用意し、以後は読み取り専用で
//! スクショのセルを照合する。

pub mod cache;

pub use cache::DescriptorCacheFile;

use crate::catalog::Catalog;
use crate::diagnostics::DiagnosticSink;
use crate::error::{CardRankError, Result};
use crate::features::{self, DescriptorSet, FeatureParams, MIN_DESCRIPTORS};
use crate::matcher::{self, MatchResult};
use image::DynamicImage;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::Path;

/// カード名 → 記述子
pub type DescriptorMap = HashMap<String, DescriptorSet>;

/// 特徴キャッシュの取得元
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    /// 既存キャッシュを使用
    Loaded,
    /// 画像から計算
    Built,
    /// カタログが読めなかった
    Empty,
}

pub struct Recognizer {
    catalog: Catalog,
    features: DescriptorMap,
    params: FeatureParams,
    source: CacheSource,
}

impl Recognizer {
    /// カタログを読み込み、特徴キャッシュを読み込みまたは作成
    ///
    /// カタログが読めない場合もエラーにはせず、空のカタログで返す。
    pub fn open(
        catalog_path: &Path,
        params: FeatureParams,
        force_rebuild: bool,
        sink: &mut dyn DiagnosticSink,
    ) -> Self {
        let catalog = match Catalog::load(catalog_path, sink) {
            Ok(c) => c,
            Err(e) => {
                sink.report_error(&e);
                return Self::from_parts(Catalog::default(), DescriptorMap::new(), params)
                    .with_source(CacheSource::Empty);
            }
        };

        let (features, source) =
            load_or_build_descriptors(&catalog, catalog_path, &params, force_rebuild, sink);

        tracing::info!(
            cards = catalog.len(),
            features = features.len(),
            ?source,
            "カタログ読み込み完了: {}",
            catalog_path.display()
        );

        Self::from_parts(catalog, features, params).with_source(source)
    }

    pub fn from_parts(catalog: Catalog, features: DescriptorMap, params: FeatureParams) -> Self {
        Self {
            catalog,
            features,
            params,
            source: CacheSource::Built,
        }
    }

    fn with_source(mut self, source: CacheSource) -> Self {
        self.source = source;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn features(&self) -> &DescriptorMap {
        &self.features
    }

    pub fn params(&self) -> &FeatureParams {
        &self.params
    }

    pub fn source(&self) -> CacheSource {
        self.source
    }

    /// 照合対象になるカード数（記述子が MIN_DESCRIPTORS 以上）
    pub fn matchable_count(&self) -> usize {
        self.features
            .values()
            .filter(|d| d.len() >= MIN_DESCRIPTORS)
            .count()
    }

    /// 1枚の画像をカタログと照合
    ///
    /// 記述子が MIN_DESCRIPTORS 未満なら InsufficientFeatures。
    /// どのカードとも対応点が取れなければ `MatchResult::no_match()`。
    pub fn match_image(&self, image: &DynamicImage) -> Result<MatchResult> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CardRankError::ImageLoad("照合画像が空です".into()));
        }

        let query = features::extract_from_image(image, &self.params);
        if query.len() < MIN_DESCRIPTORS {
            return Err(CardRankError::InsufficientFeatures {
                found: query.len(),
                required: MIN_DESCRIPTORS,
            });
        }

        let candidates = self.catalog.entries().iter().filter_map(|entry| {
            self.features
                .get(&entry.card_id)
                .map(|d| (entry, d.as_slice()))
        });

        let result = match matcher::best_candidate(&query, candidates) {
            Some((entry, score)) => {
                tracing::debug!(card = %entry.card_id, score, "照合結果");
                MatchResult {
                    matched_entry: Some(entry.clone()),
                    confidence_score: score,
                }
            }
            None => MatchResult::no_match(),
        };

        Ok(result)
    }
}

/// 特徴キャッシュを読み込み、使えなければ参照画像から作る
///
/// - キャッシュが新しければそのまま使う。キャッシュに無いカードだけ計算し直す
/// - 古い・壊れている場合は通知して作り直す
/// - 読めない画像は通知してスキップ
/// - 1枚以上計算できたら保存（失敗は通知のみ）
pub fn load_or_build_descriptors(
    catalog: &Catalog,
    catalog_path: &Path,
    params: &FeatureParams,
    force_rebuild: bool,
    sink: &mut dyn DiagnosticSink,
) -> (DescriptorMap, CacheSource) {
    let fingerprint = match cache::catalog_fingerprint(catalog_path) {
        Ok(fp) => Some(fp),
        Err(e) => {
            sink.report_error(&CardRankError::CacheRead(format!(
                "カタログのハッシュ計算に失敗: {}",
                e
            )));
            None
        }
    };

    if !force_rebuild {
        if let Some(fp) = &fingerprint {
            match DescriptorCacheFile::load(catalog_path) {
                Ok(Some(cached)) => match cached.check_fresh(fp, params) {
                    Ok(()) => {
                        tracing::debug!(entries = cached.len(), "特徴キャッシュを使用");
                        let mut features = cached.into_entries();
                        let added = fill_missing_descriptors(catalog, params, &mut features, sink);
                        if added > 0 {
                            save_cache(catalog_path, fp, params, &features, sink);
                        }
                        return (features, CacheSource::Loaded);
                    }
                    Err(e) => sink.report_error(&e),
                },
                Ok(None) => {}
                Err(e) => sink.report_error(&e),
            }
        }
    }

    let features = build_descriptors(catalog, params, sink);

    if let Some(fp) = &fingerprint {
        if !features.is_empty() {
            save_cache(catalog_path, fp, params, &features, sink);
        }
    }

    (features, CacheSource::Built)
}

/// キャッシュに無いカードの記述子を計算して追加
///
/// 後から置かれた参照画像はここで拾う。読めない画像は毎回通知する。
/// 戻り値は追加できたカード数。
fn fill_missing_descriptors(
    catalog: &Catalog,
    params: &FeatureParams,
    features: &mut DescriptorMap,
    sink: &mut dyn DiagnosticSink,
) -> usize {
    let mut added = 0;
    for entry in catalog.entries() {
        if features.contains_key(&entry.card_id) {
            continue;
        }
        let path = catalog.resolve_image_path(entry);
        match features::load_descriptors(&path, params) {
            Ok(descriptors) => {
                tracing::debug!(card = %entry.card_id, "キャッシュに無いカードを追加");
                features.insert(entry.card_id.clone(), descriptors);
                added += 1;
            }
            Err(e) => sink.report_error(&e),
        }
    }
    added
}

fn save_cache(
    catalog_path: &Path,
    fingerprint: &str,
    params: &FeatureParams,
    features: &DescriptorMap,
    sink: &mut dyn DiagnosticSink,
) {
    let mut file = DescriptorCacheFile::new(fingerprint.to_string(), *params);
    for (card_id, descriptors) in features {
        file.insert(card_id.clone(), descriptors.clone());
    }
    if let Err(e) = file.save(catalog_path) {
        sink.report_error(&e);
    }
}

/// カタログの全カードについて記述子を計算
pub fn build_descriptors(
    catalog: &Catalog,
    params: &FeatureParams,
    sink: &mut dyn DiagnosticSink,
) -> DescriptorMap {
    let progress = ProgressBar::new(catalog.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("  {bar:40.cyan/blue} {pos}/{len} {msg}") {
        progress.set_style(style);
    }

    let mut features = DescriptorMap::new();
    for entry in catalog.entries() {
        progress.set_message(entry.card_id.clone());
        let path = catalog.resolve_image_path(entry);
        match features::load_descriptors(&path, params) {
            Ok(descriptors) => {
                features.insert(entry.card_id.clone(), descriptors);
            }
            Err(e) => sink.report_error(&e),
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    features
}
