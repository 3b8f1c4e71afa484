//! 診断メッセージ
//!
//! 処理全体を止めない失敗（画像が読めないカードのスキップ、キャッシュ保存失敗など）を
//! 呼び出し側へ通知する。各操作は `Result` を返し、スキップした項目だけをここへ流す。

use crate::error::CardRankError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    CatalogLoad,
    DuplicateCard,
    /// card_name が空の行
    BlankCardName,
    ImageLoad,
    InsufficientFeatures,
    CacheRead,
    CacheWrite,
    StaleCache,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&CardRankError> for Diagnostic {
    fn from(err: &CardRankError) -> Self {
        let kind = match err {
            CardRankError::CatalogLoad(_) => DiagnosticKind::CatalogLoad,
            CardRankError::ImageLoad(_) => DiagnosticKind::ImageLoad,
            CardRankError::InsufficientFeatures { .. } => DiagnosticKind::InsufficientFeatures,
            CardRankError::CacheRead(_) => DiagnosticKind::CacheRead,
            CardRankError::CacheWrite(_) => DiagnosticKind::CacheWrite,
            CardRankError::StaleCache(_) => DiagnosticKind::StaleCache,
            _ => DiagnosticKind::Other,
        };
        Self::new(kind, err.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// 診断の受け取り先
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);

    fn report_error(&mut self, err: &CardRankError) {
        self.report(Diagnostic::from(err));
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// 破棄
impl DiagnosticSink for () {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// 収集して後でまとめて表示する
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.items.iter().filter(|d| d.kind == kind).count()
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.items)
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(kind = ?diagnostic.kind, "{}", diagnostic.message);
        self.items.push(diagnostic);
    }
}

/// `tracing` の warn に流す
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(kind = ?diagnostic.kind, "{}", diagnostic.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_diagnostics() {
        let mut diags = Diagnostics::new();
        diags.report(Diagnostic::new(DiagnosticKind::ImageLoad, "a.png"));
        diags.report_error(&CardRankError::CacheWrite("disk full".into()));

        assert_eq!(diags.len(), 2);
        assert_eq!(diags.count(DiagnosticKind::ImageLoad), 1);
        assert_eq!(diags.count(DiagnosticKind::CacheWrite), 1);
        assert!(diags.items()[1].message.contains("disk full"));
    }

    #[test]
    fn test_sink_through_mut_ref() {
        fn push(mut sink: impl DiagnosticSink) {
            sink.report(Diagnostic::new(DiagnosticKind::Other, "x"));
        }

        let mut diags = Diagnostics::new();
        push(&mut diags);
        push(&mut diags);
        assert_eq!(diags.take().len(), 2);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_kind_from_error() {
        let err = CardRankError::InsufficientFeatures { found: 1, required: 3 };
        let diag = Diagnostic::from(&err);
        assert_eq!(diag.kind, DiagnosticKind::InsufficientFeatures);
        assert!(diag.message.contains("1点"));
    }
}
