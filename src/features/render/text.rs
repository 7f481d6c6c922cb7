//! 文本排版：首字母提取、换行、字号策略与多行垂直定位。
//!
//! 换行算法与具体的宽度测量解耦：矢量输出使用按字符数估算的 [`HeuristicMeasurer`]，
//! 栅格输出使用按字形前进宽度精确测量的 [`GlyphMeasurer`]。

use unicode_width::UnicodeWidthStr;

use super::fonts::{FontBook, ParsedFace, estimate_width};
use super::types::{FontWeight, TextLayout};

/// 单行排版：字号占较短边的比例
const SINGLE_LINE_RATIO: f64 = 0.5;
/// 单行排版、文本超过两个字符时的字号比例
const SINGLE_LINE_LONG_RATIO: f64 = 0.15;
/// 单行长文本的最小字号
const SINGLE_LINE_FLOOR: f64 = 12.0;
/// 行距倍数
const LINE_PITCH: f64 = 1.5;
/// 左右各留出宽度的 10%
const SIDE_PADDING_RATIO: f64 = 0.1;
/// 估算字符宽度与字号的比例
pub(crate) const AVG_CHAR_WIDTH_RATIO: f64 = 0.6;

/// 多行排版的字号上下限
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for FontBounds {
    fn default() -> Self {
        Self {
            min: 16.0,
            max: 48.0,
        }
    }
}

/// 取前两个以空白分隔的词的首字符并转为大写
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .map(upper_single)
        .collect()
}

/// 逐字符大写；大写形式不止一个字符时（ß、ﬀ）保留原字符
fn upper_single(ch: char) -> char {
    let mut upper = ch.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => ch,
    }
}

/// 给定图片宽度的可用排版宽度（扣除两侧留白）
pub fn usable_width(image_width: u32) -> f64 {
    let width = f64::from(image_width);
    width - 2.0 * (width * SIDE_PADDING_RATIO)
}

/// 文本宽度判定策略
pub trait Measurer {
    /// `line` 以 `font_size` 排版时是否不超过 `max_width`
    fn fits(&self, line: &str, max_width: f64, font_size: f64) -> bool;
}

/// 估算策略：每字符宽约 0.6 倍字号，每行至少容纳 `min_chars_per_line` 个字符。
#[derive(Debug, Clone, Copy)]
pub struct HeuristicMeasurer {
    pub min_chars_per_line: usize,
}

impl HeuristicMeasurer {
    pub fn max_chars(&self, max_width: f64, font_size: f64) -> usize {
        let per_char = font_size * AVG_CHAR_WIDTH_RATIO;
        let estimated = if per_char > 0.0 {
            (max_width / per_char).max(0.0) as usize
        } else {
            usize::MAX
        };
        estimated.max(self.min_chars_per_line)
    }
}

impl Default for HeuristicMeasurer {
    fn default() -> Self {
        Self {
            min_chars_per_line: 10,
        }
    }
}

impl Measurer for HeuristicMeasurer {
    fn fits(&self, line: &str, max_width: f64, font_size: f64) -> bool {
        // 全角字符按两列计
        line.width() <= self.max_chars(max_width, font_size)
    }
}

/// 精确策略：使用已加载字体的字形前进宽度
pub struct GlyphMeasurer<'a> {
    /// 构造时解析一次，换行过程中反复使用
    face: Option<ParsedFace<'a>>,
}

impl<'a> GlyphMeasurer<'a> {
    pub fn new(fonts: &'a FontBook, weight: FontWeight) -> Self {
        Self {
            face: fonts.parsed_face(weight),
        }
    }
}

impl Measurer for GlyphMeasurer<'_> {
    fn fits(&self, line: &str, max_width: f64, font_size: f64) -> bool {
        let width = match &self.face {
            Some(face) => face.advance(line, font_size),
            None => estimate_width(line, font_size),
        };
        width <= max_width
    }
}

/// 贪心换行：按空白切词，逐词尝试追加到当前行，放不下则另起一行。
///
/// 单个超宽的词独占一行，不做断词。结果至少包含一行。
pub fn wrap(text: &str, max_width: f64, font_size: f64, measurer: &dyn Measurer) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in words {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };

        if measurer.fits(&candidate, max_width, font_size) {
            current = candidate;
        } else if current.is_empty() {
            lines.push(word.to_string());
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        vec![text.to_string()]
    } else {
        lines
    }
}

/// 字号策略
pub fn font_size_for(
    text: &str,
    width: u32,
    height: u32,
    layout: TextLayout,
    bounds: FontBounds,
) -> f64 {
    let chars = text.chars().count();
    match layout {
        TextLayout::Single => {
            let min_dim = f64::from(width.min(height));
            if chars > 2 {
                (min_dim * SINGLE_LINE_LONG_RATIO).max(SINGLE_LINE_FLOOR)
            } else {
                min_dim * SINGLE_LINE_RATIO
            }
        }
        TextLayout::Wrapped => {
            let ratio = if chars > 200 {
                0.05
            } else if chars > 100 {
                0.06
            } else {
                0.08
            };
            let mut size = f64::from(height) * ratio;
            if size < bounds.min {
                size = bounds.min;
            }
            if size > bounds.max {
                size = bounds.max;
            }
            size
        }
    }
}

/// 各行基线的纵坐标：整块文本关于画布中线对称，行距为 1.5 倍字号。
pub fn line_baselines(line_count: usize, height: u32, font_size: f64) -> Vec<f64> {
    let pitch = font_size * LINE_PITCH;
    let n = line_count as f64;
    let block = font_size + (n - 1.0).max(0.0) * pitch;
    let first = f64::from(height) / 2.0 - block / 2.0 + font_size / 2.0;
    (0..line_count).map(|i| first + i as f64 * pitch).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 按字符数判定，便于构造确定的换行结果
    struct CharBudget(usize);

    impl Measurer for CharBudget {
        fn fits(&self, line: &str, _max_width: f64, _font_size: f64) -> bool {
            line.chars().count() <= self.0
        }
    }

    #[test]
    fn initials_take_first_two_words() {
        assert_eq!(initials("John Doe"), "JD");
        assert_eq!(initials("jane"), "J");
        assert_eq!(initials("  mary   ann smith "), "MA");
        assert_eq!(initials(""), "");
        assert_eq!(initials("   "), "");
        assert_eq!(initials("élodie durand"), "ÉD");
    }

    #[test]
    fn initials_never_expand_a_letter() {
        assert_eq!(initials("ßeta xi"), "ßX");
        assert_eq!(initials("ﬀoo bar"), "ﬀB");
        assert_eq!(initials("ŉa b"), "ŉB");
        for name in ["ßeta xi", "ﬀoo bar", "ŉa b", "alice baker charlie"] {
            assert!(initials(name).chars().count() <= 2, "{name}");
        }
    }

    #[test]
    fn initials_keep_leading_punctuation_and_digits() {
        assert_eq!(initials("  -alice  123 baker"), "-1");
    }

    #[test]
    fn wrap_empty_text_returns_single_line() {
        assert_eq!(wrap("", 100.0, 20.0, &CharBudget(5)), vec![String::new()]);
        assert_eq!(wrap("   ", 100.0, 20.0, &CharBudget(5)), vec!["   ".to_string()]);
    }

    #[test]
    fn wrap_without_spaces_keeps_one_line() {
        let lines = wrap("Supercalifragilistic", 10.0, 20.0, &CharBudget(3));
        assert_eq!(lines, vec!["Supercalifragilistic".to_string()]);
    }

    #[test]
    fn wrap_is_greedy_and_never_exceeds_budget_except_single_words() {
        let lines = wrap(
            "the quick brown fox jumps over the lazy dog",
            0.0,
            0.0,
            &CharBudget(10),
        );
        assert_eq!(
            lines,
            vec!["the quick", "brown fox", "jumps over", "the lazy", "dog"]
        );
        for line in &lines {
            assert!(line.chars().count() <= 10 || !line.contains(' '));
        }
    }

    #[test]
    fn wrap_puts_overlong_word_on_its_own_line() {
        let lines = wrap("a extraordinarily b", 0.0, 0.0, &CharBudget(4));
        assert_eq!(lines, vec!["a", "extraordinarily", "b"]);
    }

    #[test]
    fn heuristic_enforces_minimum_chars_per_line() {
        let m = HeuristicMeasurer::default();
        // 40 / (48*0.6) ≈ 1 字符，下限抬到 10
        assert_eq!(m.max_chars(40.0, 48.0), 10);
        // 240 / (20*0.6) = 20
        assert_eq!(m.max_chars(240.0, 20.0), 20);
        assert!(m.fits("0123456789", 40.0, 48.0));
        assert!(!m.fits("0123456789a", 40.0, 48.0));
    }

    #[test]
    fn heuristic_counts_wide_glyphs_twice() {
        let m = HeuristicMeasurer::default();
        assert!(m.fits("你好世界你", 1.0, 20.0));
        assert!(!m.fits("你好世界你好", 1.0, 20.0));
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn single_line_font_size_policy() {
        let b = FontBounds::default();
        assert!(approx(font_size_for("JD", 128, 128, TextLayout::Single, b), 64.0));
        assert!(approx(font_size_for("J", 200, 100, TextLayout::Single, b), 50.0));
        assert!(approx(
            font_size_for("300 x 200", 300, 200, TextLayout::Single, b),
            30.0
        ));
        // 较短边 40 → 6，抬到最小 12
        assert!(approx(font_size_for("40 x 40", 40, 40, TextLayout::Single, b), 12.0));
    }

    #[test]
    fn wrapped_font_size_policy_with_clamp() {
        let b = FontBounds::default();
        let short = "a".repeat(50);
        let medium = "a".repeat(150);
        let long = "a".repeat(250);
        let size = |text: &str, w, h| font_size_for(text, w, h, TextLayout::Wrapped, b);
        assert!(approx(size(&short, 400, 400), 32.0));
        assert!(approx(size(&medium, 400, 400), 24.0));
        assert!(approx(size(&long, 400, 400), 20.0));
        assert!(approx(size(&short, 400, 100), 16.0));
        assert!(approx(size(&short, 400, 1000), 48.0));
    }

    #[test]
    fn baselines_are_symmetric_about_center() {
        let fs = 20.0;
        for n in 1..=6 {
            let ys = line_baselines(n, 300, fs);
            assert_eq!(ys.len(), n);
            let first = ys[0];
            let last = ys[n - 1];
            assert!(((first + last) / 2.0 - 150.0).abs() < 1e-9, "n = {n}");
            for pair in ys.windows(2) {
                assert!((pair[1] - pair[0] - 30.0).abs() < 1e-9);
            }
        }
        assert_eq!(line_baselines(1, 128, 64.0), vec![64.0]);
    }

    #[test]
    fn usable_width_leaves_ten_percent_each_side() {
        assert!((usable_width(300) - 240.0).abs() < 1e-9);
    }
}
