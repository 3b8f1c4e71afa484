//! 特徴キャッシュモジュール
//!
//! 参照画像ごとの記述子をカタログと同じフォルダに bincode で保存し、
//! 次回起動時の再計算をスキップする。
//! カタログファイルの SHA-256 を一緒に記録し、カタログが変わっていれば古いキャッシュとして扱う。

use crate::error::{CardRankError, Result};
use crate::features::{DescriptorSet, FeatureParams, EXTRACTOR};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const CACHE_SUFFIX: &str = "_features.bin";

/// キャッシュファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorCacheFile {
    /// バージョン（互換性チェック用）
    version: u32,
    /// 作成時のカタログのハッシュ
    catalog_fingerprint: String,
    /// 作成時の抽出器名
    extractor: String,
    /// 作成時の抽出パラメータ
    params: FeatureParams,
    /// 作成日時（RFC 3339）
    built_at: String,
    /// カード名 → 記述子
    entries: HashMap<String, DescriptorSet>,
}

impl DescriptorCacheFile {
    const CURRENT_VERSION: u32 = 2;

    pub fn new(catalog_fingerprint: String, params: FeatureParams) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            catalog_fingerprint,
            extractor: EXTRACTOR.to_string(),
            params,
            built_at: chrono::Local::now().to_rfc3339(),
            entries: HashMap::new(),
        }
    }

    /// カタログと同じフォルダの `<stem>_features.bin`
    pub fn cache_path(catalog_path: &Path) -> PathBuf {
        let stem = catalog_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "catalog".to_string());
        catalog_path.with_file_name(format!("{}{}", stem, CACHE_SUFFIX))
    }

    /// キャッシュファイルを読み込み
    ///
    /// ファイルが無ければ Ok(None)。壊れている・バージョン違いは CacheRead。
    pub fn load(catalog_path: &Path) -> Result<Option<Self>> {
        let cache_path = Self::cache_path(catalog_path);
        if !cache_path.exists() {
            return Ok(None);
        }

        let file = File::open(&cache_path)
            .map_err(|e| CardRankError::CacheRead(format!("{}: {}", cache_path.display(), e)))?;
        let reader = BufReader::new(file);
        let cache: Self = bincode::deserialize_from(reader)
            .map_err(|e| CardRankError::CacheRead(format!("{}: {}", cache_path.display(), e)))?;

        if cache.version != Self::CURRENT_VERSION {
            return Err(CardRankError::CacheRead(format!(
                "キャッシュバージョン不一致 ({} != {})",
                cache.version,
                Self::CURRENT_VERSION
            )));
        }

        Ok(Some(cache))
    }

    /// キャッシュファイルを保存
    pub fn save(&self, catalog_path: &Path) -> Result<()> {
        let cache_path = Self::cache_path(catalog_path);
        let file = File::create(&cache_path)
            .map_err(|e| CardRankError::CacheWrite(format!("{}: {}", cache_path.display(), e)))?;
        let writer = BufWriter::new(file);
        bincode::serialize_into(writer, self)
            .map_err(|e| CardRankError::CacheWrite(format!("{}: {}", cache_path.display(), e)))?;
        Ok(())
    }

    /// キャッシュファイルを削除。存在しなければ Ok(false)
    pub fn clear(catalog_path: &Path) -> Result<bool> {
        let cache_path = Self::cache_path(catalog_path);
        if !cache_path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&cache_path)?;
        Ok(true)
    }

    /// カタログ・抽出器・パラメータが作成時と同じか確認
    pub fn check_fresh(&self, catalog_fingerprint: &str, params: &FeatureParams) -> Result<()> {
        if self.catalog_fingerprint != catalog_fingerprint {
            return Err(CardRankError::StaleCache(
                "カタログが作成時から変更されています。再生成します".into(),
            ));
        }
        if self.extractor != EXTRACTOR {
            return Err(CardRankError::StaleCache(format!(
                "抽出器が異なります ({} != {})。再生成します",
                self.extractor, EXTRACTOR
            )));
        }
        if self.params != *params {
            return Err(CardRankError::StaleCache(
                "抽出パラメータが作成時と異なります。再生成します".into(),
            ));
        }
        Ok(())
    }

    pub fn get(&self, card_id: &str) -> Option<&DescriptorSet> {
        self.entries.get(card_id)
    }

    pub fn insert(&mut self, card_id: String, descriptors: DescriptorSet) {
        self.entries.insert(card_id, descriptors);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn extractor(&self) -> &str {
        &self.extractor
    }

    pub fn built_at(&self) -> &str {
        &self.built_at
    }

    pub fn into_entries(self) -> HashMap<String, DescriptorSet> {
        self.entries
    }
}

/// カタログファイルのハッシュ（SHA-256, hex）
pub fn catalog_fingerprint(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_path_is_sibling() {
        let path = DescriptorCacheFile::cache_path(Path::new("/data/out/CardRank.xlsx"));
        assert_eq!(path, PathBuf::from("/data/out/CardRank_features.bin"));
    }

    #[test]
    fn test_check_fresh() {
        let params = FeatureParams::default();
        let cache = DescriptorCacheFile::new("abc".into(), params);

        assert!(cache.check_fresh("abc", &params).is_ok());
        assert!(matches!(
            cache.check_fresh("def", &params),
            Err(CardRankError::StaleCache(_))
        ));

        let other = FeatureParams {
            fast_threshold: 40,
            ..params
        };
        assert!(matches!(
            cache.check_fresh("abc", &other),
            Err(CardRankError::StaleCache(_))
        ));
    }

    #[test]
    fn test_other_extractor_is_stale() {
        let params = FeatureParams::default();
        let mut cache = DescriptorCacheFile::new("abc".into(), params);
        assert_eq!(cache.extractor(), EXTRACTOR);

        cache.extractor = "other-orb".into();
        assert!(matches!(
            cache.check_fresh("abc", &params),
            Err(CardRankError::StaleCache(_))
        ));
    }
}
