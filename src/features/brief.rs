//! 回転補正付き BRIEF 記述子
//!
//! キーポイント周辺の輝度重心から向きを求め、固定の比較点ペアをその向きに回して
//! 256ビットの2値記述子を作る（ORBと同じ方式）。

use super::{Descriptor, DESCRIPTOR_BYTES};
use image::GrayImage;

/// パッチ半径。比較点と輝度重心はこの円の内側から取る
pub const PATCH_RADIUS: i32 = 15;

const DESCRIPTOR_BITS: usize = DESCRIPTOR_BYTES * 8;

/// 比較点ペアの乱数シード（値を変えると既存キャッシュと非互換になる）
const PATTERN_SEED: u64 = 0x5EED_CA4D_0000_0001;

lazy_static::lazy_static! {
    /// 比較点ペア (x1, y1, x2, y2)
    static ref PATTERN: Vec<[f32; 4]> = build_pattern(PATTERN_SEED);

    /// 各行 dy に対する円内の最大 |dx|
    static ref ROW_EXTENT: Vec<i32> = (-PATCH_RADIUS..=PATCH_RADIUS)
        .map(|dy| {
            let r2 = PATCH_RADIUS * PATCH_RADIUS;
            (0..=PATCH_RADIUS).take_while(|dx| dx * dx + dy * dy <= r2).last().unwrap_or(0)
        })
        .collect();
}

/// 比較点生成用の 64bit LCG
struct Lcg(u64);

impl Lcg {
    fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    /// [-PATCH_RADIUS, PATCH_RADIUS] の整数
    fn next_offset(&mut self) -> i32 {
        let span = (2 * PATCH_RADIUS + 1) as u32;
        (self.next_u32() % span) as i32 - PATCH_RADIUS
    }

    /// 円内の点
    fn next_point(&mut self) -> (i32, i32) {
        loop {
            let (x, y) = (self.next_offset(), self.next_offset());
            if x * x + y * y <= PATCH_RADIUS * PATCH_RADIUS {
                return (x, y);
            }
        }
    }
}

fn build_pattern(seed: u64) -> Vec<[f32; 4]> {
    let mut rng = Lcg(seed);
    let mut pattern = Vec::with_capacity(DESCRIPTOR_BITS);
    while pattern.len() < DESCRIPTOR_BITS {
        let a = rng.next_point();
        let b = rng.next_point();
        if a == b {
            continue;
        }
        pattern.push([a.0 as f32, a.1 as f32, b.0 as f32, b.1 as f32]);
    }
    pattern
}

/// 輝度重心による向き（ラジアン）
///
/// 呼び出し側で (x, y) が画像端から PATCH_RADIUS 以上離れていることを保証する。
pub fn orientation(gray: &GrayImage, x: u32, y: u32) -> f32 {
    let (cx, cy) = (x as i32, y as i32);
    let mut m01 = 0i64;
    let mut m10 = 0i64;

    for (row, &extent) in ROW_EXTENT.iter().enumerate() {
        let dy = row as i32 - PATCH_RADIUS;
        for dx in -extent..=extent {
            let v = gray.get_pixel((cx + dx) as u32, (cy + dy) as u32).0[0] as i64;
            m10 += dx as i64 * v;
            m01 += dy as i64 * v;
        }
    }

    (m01 as f32).atan2(m10 as f32)
}

/// 平滑化済み画像から記述子を計算
///
/// 比較点 p1 の輝度が p2 より小さいときにビットを立てる。
pub fn describe(smoothed: &GrayImage, x: u32, y: u32, angle: f32) -> Descriptor {
    let (sin, cos) = angle.sin_cos();
    let (cx, cy) = (x as i32, y as i32);
    let sample = |px: f32, py: f32| {
        let rx = (px * cos - py * sin).round() as i32;
        let ry = (px * sin + py * cos).round() as i32;
        smoothed.get_pixel((cx + rx) as u32, (cy + ry) as u32).0[0]
    };

    let mut desc = [0u8; DESCRIPTOR_BYTES];
    for (i, p) in PATTERN.iter().enumerate() {
        if sample(p[0], p[1]) < sample(p[2], p[3]) {
            desc[i / 8] |= 1 << (i % 8);
        }
    }
    desc
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_pattern_is_deterministic() {
        assert_eq!(build_pattern(PATTERN_SEED), build_pattern(PATTERN_SEED));
        assert_eq!(PATTERN.len(), DESCRIPTOR_BITS);
    }

    #[test]
    fn test_pattern_stays_inside_patch() {
        let r = PATCH_RADIUS as f32;
        for p in PATTERN.iter() {
            assert!(p[0] * p[0] + p[1] * p[1] <= r * r);
            assert!(p[2] * p[2] + p[3] * p[3] <= r * r);
        }
    }

    #[test]
    fn test_orientation_points_towards_bright_side() {
        // 右半分だけ明るい → 向きはほぼ0
        let img = GrayImage::from_fn(64, 64, |x, _| if x >= 32 { Luma([255]) } else { Luma([0]) });
        let angle = orientation(&img, 32, 32);
        assert!(angle.abs() < 0.2, "angle = {}", angle);

        // 下半分だけ明るい → 向きはほぼ +π/2
        let img = GrayImage::from_fn(64, 64, |_, y| if y >= 32 { Luma([255]) } else { Luma([0]) });
        let angle = orientation(&img, 32, 32);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 0.2, "angle = {}", angle);
    }

    #[test]
    fn test_flat_patch_gives_zero_descriptor() {
        let img = GrayImage::from_pixel(64, 64, Luma([128]));
        assert_eq!(describe(&img, 32, 32, 0.0), [0u8; DESCRIPTOR_BYTES]);
    }
}
