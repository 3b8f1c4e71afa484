//! 結合テスト用の合成カード画像とカタログ

#![allow(dead_code)]

use card_rank_common::CatalogEntry;
use card_rank_rust::export::excel;
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};

pub const CARD_WIDTH: u32 = 160;
pub const CARD_HEIGHT: u32 = 220;
const BLOCK: u32 = 10;

fn lcg(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state >> 33
}

/// seed ごとに異なる濃淡ブロック模様のカード画像
pub fn card_image(seed: u64) -> RgbImage {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    let mut img = RgbImage::new(CARD_WIDTH, CARD_HEIGHT);

    for by in 0..CARD_HEIGHT / BLOCK {
        for bx in 0..CARD_WIDTH / BLOCK {
            let v = (lcg(&mut state) & 0xFF) as u8;
            for y in by * BLOCK..(by + 1) * BLOCK {
                for x in bx * BLOCK..(bx + 1) * BLOCK {
                    img.put_pixel(x, y, Rgb([v, v, v]));
                }
            }
        }
    }

    img
}

/// 各画素に ±amplitude のノイズを加える
pub fn with_noise(image: &RgbImage, seed: u64, amplitude: i16) -> RgbImage {
    let mut state = seed | 1;
    let span = (2 * amplitude + 1) as u64;
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let delta = (lcg(&mut state) % span) as i16 - amplitude;
        for c in pixel.0.iter_mut() {
            *c = (*c as i16 + delta).clamp(0, 255) as u8;
        }
    }
    out
}

/// 単色画像（特徴点が取れない）
pub fn blank_image() -> RgbImage {
    RgbImage::from_pixel(CARD_WIDTH, CARD_HEIGHT, Rgb([128, 128, 128]))
}

/// `<dir>/cards/<name>` に画像を保存して相対パスを返す
pub fn save_card(dir: &Path, name: &str, image: &RgbImage) -> String {
    let cards = dir.join("cards");
    std::fs::create_dir_all(&cards).unwrap();
    image.save(cards.join(name)).unwrap();
    format!("cards/{}", name)
}

pub fn entry(card_id: &str, image_path: &str) -> CatalogEntry {
    CatalogEntry {
        card_id: card_id.to_string(),
        image_path: image_path.to_string(),
        idol_type: "得分".to_string(),
        idol_rarity: "歌唱".to_string(),
        main_ranks: "通常排行:S,对决排行:A".to_string(),
        other_ranks: "辅助sp:辅助sp".to_string(),
        rail_color: "红".to_string(),
        ..Default::default()
    }
}

/// `<dir>/CardRank.xlsx` を書き出してパスを返す
pub fn write_catalog(dir: &Path, entries: &[CatalogEntry]) -> PathBuf {
    let path = dir.join("CardRank.xlsx");
    excel::write_card_rank(entries, &path).unwrap();
    path
}

/// 星光(seed 1) と 月影(seed 2) の2枚カタログ
pub fn two_card_catalog(dir: &Path) -> PathBuf {
    let a = save_card(dir, "a.png", &card_image(1));
    let b = save_card(dir, "b.png", &card_image(2));
    write_catalog(dir, &[entry("星光-歌唱", &a), entry("月影-舞蹈", &b)])
}
