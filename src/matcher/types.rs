use card_rank_common::CatalogEntry;

/// 記述子1組の対応
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorMatch {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: u32,
}

/// 照合結果
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    /// 一致したカード。どのカードとも対応が取れなければ None
    pub matched_entry: Option<CatalogEntry>,
    /// 対応点の平均ハミング距離（小さいほど良い）。不一致時は無限大
    pub confidence_score: f32,
}

impl MatchResult {
    pub fn no_match() -> Self {
        Self {
            matched_entry: None,
            confidence_score: f32::INFINITY,
        }
    }

    pub fn is_match(&self) -> bool {
        self.matched_entry.is_some()
    }

    /// 一致時のスコア
    pub fn score(&self) -> Option<f32> {
        self.matched_entry.as_ref().map(|_| self.confidence_score)
    }
}
