//! スクショ範囲の選択
//!
//! 画面画像から照合対象の矩形を決める。マウス操作などの入力手段は
//! `RegionSelector` の実装側に閉じ込め、照合処理からは矩形だけを見る。

use crate::error::{CardRankError, Result};
use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 選択範囲の最小辺（px）
pub const MIN_SELECTION: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// 画像全体
    pub fn full(image: &RgbImage) -> Self {
        Self::new(0, 0, image.width(), image.height())
    }

    /// ドラッグの始点・終点から正規化した矩形
    pub fn from_points(start: (u32, u32), end: (u32, u32)) -> Self {
        let x = start.0.min(end.0);
        let y = start.1.min(end.1);
        Self::new(x, y, start.0.abs_diff(end.0), start.1.abs_diff(end.1))
    }

    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// 最小サイズ・画面内チェック
    pub fn validate_within(self, screen_width: u32, screen_height: u32) -> Result<Self> {
        if self.width < MIN_SELECTION || self.height < MIN_SELECTION {
            return Err(CardRankError::RegionTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        if self.right() > screen_width as u64 || self.bottom() > screen_height as u64 {
            return Err(CardRankError::RegionOutOfBounds(format!(
                "{} (画面 {}x{})",
                self, screen_width, screen_height
            )));
        }
        Ok(self)
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

/// "x,y,w,h" 形式
impl FromStr for Rect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<_> = s.split(',').map(|p| p.trim().parse::<u32>()).collect();
        match parts.as_slice() {
            [Ok(x), Ok(y), Ok(w), Ok(h)] => Ok(Rect::new(*x, *y, *w, *h)),
            _ => Err(format!("Invalid region: {}. Use x,y,width,height", s)),
        }
    }
}

/// 画面画像から照合範囲を決める
pub trait RegionSelector {
    fn select_region(&mut self, screen: &RgbImage) -> Result<Rect>;
}

/// 固定範囲。None なら画面全体
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedRegion(pub Option<Rect>);

impl RegionSelector for FixedRegion {
    fn select_region(&mut self, screen: &RgbImage) -> Result<Rect> {
        self.0
            .unwrap_or_else(|| Rect::full(screen))
            .validate_within(screen.width(), screen.height())
    }
}

/// ドラッグ操作（始点・終点）による選択
#[derive(Debug, Clone, Copy)]
pub struct DragRegion {
    pub start: (u32, u32),
    pub end: (u32, u32),
}

impl RegionSelector for DragRegion {
    fn select_region(&mut self, screen: &RgbImage) -> Result<Rect> {
        Rect::from_points(self.start, self.end).validate_within(screen.width(), screen.height())
    }
}

/// 選択範囲を切り出す
pub fn crop(screen: &RgbImage, rect: Rect) -> RgbImage {
    imageops::crop_imm(screen, rect.x, rect.y, rect.width, rect.height).to_image()
}
