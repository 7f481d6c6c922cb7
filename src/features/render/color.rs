//! 颜色解析：十六进制颜色、双色渐变与基于亮度的前景色选择。

use md5::{Digest, Md5};

/// 亮度阈值：高于该值用黑色文字，否则用白色。
const LUMINANCE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// 无法解析时使用的兜底灰色
    pub const FALLBACK: Rgb = Rgb::new(200, 200, 200);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// 解析 `#rgb` / `rgb` / `#rrggbb` / `rrggbb`，其它输入返回兜底灰色。
    pub fn parse_hex(input: &str) -> Self {
        let s = input.strip_prefix('#').unwrap_or(input);
        // from_str_radix 接受前导 `+`，这里只放行十六进制数字
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Self::FALLBACK;
        }
        let expanded;
        let s = if s.len() == 3 {
            expanded = s.chars().flat_map(|c| [c, c]).collect::<String>();
            expanded.as_str()
        } else {
            s
        };
        if s.len() != 6 {
            return Self::FALLBACK;
        }
        let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        match (channel(0), channel(2), channel(4)) {
            (Some(r), Some(g), Some(b)) => Self::new(r, g, b),
            _ => Self::FALLBACK,
        }
    }

    /// 小写六位十六进制（不含 `#`）
    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn luminance(self) -> f64 {
        relative_luminance(
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        )
    }
}

fn relative_luminance(r: f64, g: f64, b: f64) -> f64 {
    (0.2126 * r) + (0.7152 * g) + (0.0722 * b)
}

/// 背景色：纯色或从左到右的双色线性渐变
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpec {
    Solid(Rgb),
    Gradient(Rgb, Rgb),
}

impl ColorSpec {
    /// 稳定的文本表示（参与缓存指纹）
    pub fn code(&self) -> String {
        match self {
            Self::Solid(c) => c.to_hex(),
            Self::Gradient(a, b) => format!("{}-{}", a.to_hex(), b.to_hex()),
        }
    }
}

/// 逗号分隔的颜色输入的拆分结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GradientParts<'a> {
    /// 恰好两段：渐变
    Pair(&'a str, &'a str),
    /// 超过两段：只取第一段作为纯色
    First(&'a str),
    /// 不含逗号
    NotGradient,
}

fn split_gradient(spec: &str) -> GradientParts<'_> {
    if !spec.contains(',') {
        return GradientParts::NotGradient;
    }
    let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [a, b] => GradientParts::Pair(a, b),
        [first, _, _, ..] => GradientParts::First(first),
        _ => GradientParts::NotGradient,
    }
}

/// 解析背景色描述
pub fn resolve_background(spec: &str) -> ColorSpec {
    match split_gradient(spec) {
        GradientParts::Pair(a, b) => ColorSpec::Gradient(Rgb::parse_hex(a), Rgb::parse_hex(b)),
        GradientParts::First(first) => ColorSpec::Solid(Rgb::parse_hex(first)),
        GradientParts::NotGradient => ColorSpec::Solid(Rgb::parse_hex(spec)),
    }
}

/// 根据背景亮度选择对比色（黑/白）。渐变取两端逐通道平均后再计算亮度。
pub fn resolve_contrast(spec: &str) -> Rgb {
    let luminance = match resolve_background(spec) {
        ColorSpec::Solid(c) => c.luminance(),
        ColorSpec::Gradient(a, b) => {
            let avg = |x: u8, y: u8| (f64::from(x) + f64::from(y)) / 2.0 / 255.0;
            relative_luminance(avg(a.r, b.r), avg(a.g, b.g), avg(a.b, b.b))
        }
    };
    if luminance > LUMINANCE_THRESHOLD {
        Rgb::BLACK
    } else {
        Rgb::WHITE
    }
}

/// 由任意文本稳定地派生一个背景色（MD5 摘要前三字节）
pub fn color_from_seed(seed: &str) -> String {
    let hash = Md5::digest(seed.as_bytes());
    hex::encode(&hash[..3])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_hex_with_or_without_hash() {
        assert_eq!(Rgb::parse_hex("f0e"), Rgb::new(0xff, 0x00, 0xee));
        assert_eq!(Rgb::parse_hex("#f0e"), Rgb::new(0xff, 0x00, 0xee));
        assert_eq!(Rgb::parse_hex("3498db"), Rgb::new(0x34, 0x98, 0xdb));
        assert_eq!(Rgb::parse_hex("#3498DB"), Rgb::new(0x34, 0x98, 0xdb));
    }

    #[test]
    fn malformed_hex_falls_back_to_gray() {
        for bad in ["", "12", "1234", "zzzzzz", "#12345g", "ééé", "1234567"] {
            assert_eq!(Rgb::parse_hex(bad), Rgb::FALLBACK, "input: {bad:?}");
        }
    }

    #[test]
    fn signed_channels_are_not_hex() {
        for bad in ["+1+2+3", "-1-2-3", "+f0", "#+1+2+3"] {
            assert_eq!(Rgb::parse_hex(bad), Rgb::FALLBACK, "input: {bad:?}");
        }
    }

    #[test]
    fn gradient_requires_exactly_two_stops() {
        assert_eq!(
            resolve_background("ff0000,0000ff"),
            ColorSpec::Gradient(Rgb::new(255, 0, 0), Rgb::new(0, 0, 255))
        );
        assert_eq!(
            resolve_background(" ff0000 , 0000ff "),
            ColorSpec::Gradient(Rgb::new(255, 0, 0), Rgb::new(0, 0, 255))
        );
        assert_eq!(
            resolve_background("cccccc,00ff00,0000ff"),
            ColorSpec::Solid(Rgb::new(0xcc, 0xcc, 0xcc))
        );
        assert_eq!(
            resolve_background("cccccc"),
            ColorSpec::Solid(Rgb::new(0xcc, 0xcc, 0xcc))
        );
    }

    #[test]
    fn contrast_picks_black_on_light_and_white_on_dark() {
        assert_eq!(resolve_contrast("ffffff"), Rgb::BLACK);
        assert_eq!(resolve_contrast("000000"), Rgb::WHITE);
        assert_eq!(resolve_contrast("ffffff,cccccc"), Rgb::BLACK);
        assert_eq!(resolve_contrast("000000,333333"), Rgb::WHITE);
    }

    #[test]
    fn contrast_uses_channel_average_for_gradients() {
        // 纯红亮度 0.2126，纯绿 0.7152：平均后 (0.5,0.5,0) 亮度 0.4639 → 白字
        assert_eq!(resolve_contrast("ff0000"), Rgb::WHITE);
        assert_eq!(resolve_contrast("00ff00"), Rgb::BLACK);
        assert_eq!(resolve_contrast("ff0000,00ff00"), Rgb::WHITE);
    }

    #[test]
    fn contrast_threshold_is_strict() {
        // 0x80 灰的亮度为 128/255 ≈ 0.502 → 黑字；0x7f ≈ 0.498 → 白字
        assert_eq!(resolve_contrast("808080"), Rgb::BLACK);
        assert_eq!(resolve_contrast("7f7f7f"), Rgb::WHITE);
    }

    #[test]
    fn seed_color_is_deterministic_hex() {
        let a = color_from_seed("Jane Smith");
        assert_eq!(a, color_from_seed("Jane Smith"));
        assert_eq!(a.len(), 6);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, color_from_seed("John Doe"));
    }

    #[test]
    fn color_spec_code_is_stable() {
        assert_eq!(resolve_background("F0E").code(), "ff00ee");
        assert_eq!(resolve_background("000,fff").code(), "000000-ffffff");
    }
}
