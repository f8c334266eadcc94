//! 图层配色（#rrggbb 字符串）

use crate::rng::MapRng;

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [u8; 3] {
    let h = h.rem_euclid(360.0) / 360.0;
    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return [v, v, v];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f64| {
        let t = t.rem_euclid(1.0);
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    };
    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}

fn to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

fn parse_hex(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// `count` 个色相均匀分布的颜色
pub fn get_colors(count: usize, rng: &mut MapRng) -> Vec<String> {
    let offset = rng.random() * 360.0;
    (0..count)
        .map(|i| {
            let hue = offset + i as f64 * 360.0 / count.max(1) as f64;
            let saturation = rng.rand_float(0.45, 0.7);
            let lightness = rng.rand_float(0.55, 0.7);
            to_hex(hsl_to_rgb(hue, saturation, lightness))
        })
        .collect()
}

pub fn random_color(rng: &mut MapRng) -> String {
    let hue = rng.random() * 360.0;
    to_hex(hsl_to_rgb(hue, rng.rand_float(0.4, 0.8), 0.6))
}

/// 以 `base` 为主，混入比例为 `mix` 的随机色，再提亮 `bright`
pub fn mixed_color(base: &str, mix: f64, bright: f64, rng: &mut MapRng) -> String {
    let random = random_color(rng);
    let (Some(a), Some(b)) = (parse_hex(base), parse_hex(&random)) else {
        return random;
    };
    let blend = |x: u8, y: u8| {
        let v = x as f64 * (1.0 - mix) + y as f64 * mix;
        (v + (255.0 - v) * bright).round().clamp(0.0, 255.0) as u8
    };
    to_hex([blend(a[0], b[0]), blend(a[1], b[1]), blend(a[2], b[2])])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_hues() {
        assert_eq!(to_hex(hsl_to_rgb(0.0, 1.0, 0.5)), "#ff0000");
        assert_eq!(to_hex(hsl_to_rgb(120.0, 1.0, 0.5)), "#00ff00");
        assert_eq!(to_hex(hsl_to_rgb(240.0, 1.0, 0.5)), "#0000ff");
        assert_eq!(to_hex(hsl_to_rgb(0.0, 0.0, 1.0)), "#ffffff");
    }

    #[test]
    fn palette_size_and_format() {
        let mut rng = MapRng::new("colors");
        let colors = get_colors(7, &mut rng);
        assert_eq!(colors.len(), 7);
        for c in &colors {
            assert!(parse_hex(c).is_some(), "{c}");
        }
    }

    #[test]
    fn mixing_without_random_keeps_base() {
        let mut rng = MapRng::new("mix");
        assert_eq!(mixed_color("#336699", 0.0, 0.0, &mut rng), "#336699");
        let bright = mixed_color("#000000", 0.0, 1.0, &mut rng);
        assert_eq!(bright, "#ffffff");
    }
}
