//! Card Rank Common Library
//!
//! CLIと照合エンジンで共有される型と整形処理

pub mod types;
pub mod error;
pub mod ranks;
pub mod overlay;

pub use types::{CardDataRow, CatalogEntry, CARD_DATA_COLUMNS, CARD_RANK_COLUMNS, RAIL_UNRESTRICTED};
pub use error::{Error, Result};
pub use ranks::{merge_card_ranks, parse_rank_pairs, MAIN_RANKS};
pub use overlay::{CardDetails, OverlayLabel};
