use crate::error::{CardRankError, Result};
use crate::features::FeatureParams;
use crate::grid;
use crate::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 永続化する既定値（~/.config/card-rank/config.json）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 最後に使ったカタログ（CardRank.xlsx）
    pub catalog_path: Option<PathBuf>,
    pub grid_rows: u32,
    pub grid_cols: u32,
    /// セル上のランク表示
    pub show_overlays: bool,
    /// 先頭セルの詳細表示
    pub show_details: bool,
    pub fast_threshold: u8,
    pub max_features: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CardRankError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("card-rank").join("config.json"))
    }

    fn default_config() -> Self {
        let params = FeatureParams::default();
        Self {
            catalog_path: None,
            grid_rows: 1,
            grid_cols: 1,
            show_overlays: true,
            show_details: true,
            fast_threshold: params.fast_threshold,
            max_features: params.max_features,
        }
    }

    pub fn feature_params(&self) -> FeatureParams {
        FeatureParams {
            fast_threshold: self.fast_threshold,
            max_features: self.max_features,
        }
    }

    pub fn set_catalog_path(&mut self, path: PathBuf) -> Result<()> {
        self.catalog_path = Some(path);
        self.save()
    }

    pub fn set_grid(&mut self, rows: u32, cols: u32) -> Result<()> {
        grid::validate_grid(rows, cols)?;
        self.grid_rows = rows;
        self.grid_cols = cols;
        self.save()
    }

    /// 既定値に CLI 指定を重ねてセッション設定を作る
    pub fn session(
        &self,
        catalog: Option<PathBuf>,
        rows: Option<u32>,
        cols: Option<u32>,
    ) -> Result<SessionConfig> {
        let catalog_path = catalog
            .or_else(|| self.catalog_path.clone())
            .ok_or_else(|| {
                CardRankError::Config(
                    "カタログが未指定です。`card-rank config --set-catalog CardRank.xlsx` で設定してください".into(),
                )
            })?;

        let session = SessionConfig {
            catalog_path,
            grid_rows: rows.unwrap_or(self.grid_rows),
            grid_cols: cols.unwrap_or(self.grid_cols),
            show_overlays: self.show_overlays,
            show_details: self.show_details,
            features: self.feature_params(),
        };
        session.validate()?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            catalog_path: Some(PathBuf::from("/data/CardRank.xlsx")),
            grid_rows: 2,
            grid_cols: 4,
            show_overlays: false,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(loaded, Config::default());
        assert_eq!(loaded.grid_rows, 1);
        assert!(loaded.show_details);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"grid_cols": 3}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.grid_cols, 3);
        assert_eq!(loaded.grid_rows, 1);
        assert_eq!(loaded.fast_threshold, FeatureParams::default().fast_threshold);
    }

    #[test]
    fn test_session_requires_catalog() {
        let config = Config::default();
        assert!(matches!(config.session(None, None, None), Err(CardRankError::Config(_))));
    }

    #[test]
    fn test_session_overrides() {
        let config = Config {
            catalog_path: Some(PathBuf::from("a.xlsx")),
            grid_rows: 2,
            grid_cols: 2,
            ..Default::default()
        };

        let session = config.session(Some(PathBuf::from("b.xlsx")), None, Some(5)).unwrap();
        assert_eq!(session.catalog_path, PathBuf::from("b.xlsx"));
        assert_eq!((session.grid_rows, session.grid_cols), (2, 5));

        assert!(matches!(
            config.session(None, Some(6), None),
            Err(CardRankError::InvalidGrid { rows: 6, cols: 2 })
        ));
    }
}
