//! card-rank-rust
//!
//! スクショ上のカードを参照カタログの画像と特徴点照合し、
//! 排行表のランクを表示するためのライブラリ。

pub mod catalog;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod features;
pub mod grid;
pub mod matcher;
pub mod recognizer;
pub mod region;
pub mod session;

pub use error::{CardRankError, Result};
