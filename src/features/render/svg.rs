use super::color::{ColorSpec, Rgb};
use super::types::{RenderSpec, Shape};

/// 生成完整的 SVG 文档。
///
/// `lines` 为已排好的文本行，`font_size` 为最终字号，`font_family` 写入 text 元素。
/// 矢量输出与栅格输出共用这一份标记，保证两条路径几何一致。
pub fn build_scene(spec: &RenderSpec, lines: &[String], font_size: f64, font_family: &str) -> String {
    let (w, h) = (spec.width, spec.height);
    let mut svg = String::with_capacity(512 + lines.iter().map(String::len).sum::<usize>());

    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    ));

    let fill = match spec.background {
        ColorSpec::Solid(c) => format!("#{}", c.to_hex()),
        ColorSpec::Gradient(start, end) => {
            let id = gradient_id(start, end);
            svg.push_str(&format!(
                r#"<defs><linearGradient id="{id}" x1="0%" y1="0%" x2="100%" y2="0%"><stop offset="0%" style="stop-color:#{};stop-opacity:1" /><stop offset="100%" style="stop-color:#{};stop-opacity:1" /></linearGradient></defs>"#,
                start.to_hex(),
                end.to_hex()
            ));
            format!("url(#{id})")
        }
    };

    match spec.shape {
        Shape::Circle => {
            let r = spec.min_dimension() / 2;
            svg.push_str(&format!(
                r#"<circle cx="{}" cy="{}" r="{r}" fill="{fill}" />"#,
                w / 2,
                h / 2
            ));
        }
        Shape::Rect => {
            svg.push_str(&format!(
                r#"<rect width="{w}" height="{h}" fill="{fill}" />"#
            ));
        }
    }

    let baselines = super::text::line_baselines(lines.len(), h, font_size);
    for (line, y) in lines.iter().zip(baselines) {
        svg.push_str(&format!(
            r##"<text x="{}" y="{y:.0}" font-family="{}" font-size="{font_size:.0}" font-weight="{}" fill="#{}" text-anchor="middle" dominant-baseline="middle">{}</text>"##,
            w / 2,
            escape_xml(font_family),
            spec.weight.code(),
            spec.foreground.to_hex(),
            escape_xml(line)
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn gradient_id(start: Rgb, end: Rgb) -> String {
    format!("grad_{}_{}", start.to_hex(), end.to_hex())
}

/// 转义 XML 特殊字符
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::render::types::{FontWeight, ImageFormat, TextLayout};

    fn spec(shape: Shape, background: ColorSpec) -> RenderSpec {
        RenderSpec {
            width: 128,
            height: 128,
            background,
            foreground: Rgb::WHITE,
            text: "JD".into(),
            shape,
            weight: FontWeight::Normal,
            layout: TextLayout::Single,
            format: ImageFormat::Svg,
        }
    }

    #[test]
    fn rect_scene_contains_expected_elements() {
        let s = spec(Shape::Rect, ColorSpec::Solid(Rgb::new(0xf0, 0xe9, 0xe9)));
        let svg = build_scene(&s, &["JD".to_string()], 64.0, "sans-serif");
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="128" height="128" viewBox="0 0 128 128">"#));
        assert!(svg.contains(r##"<rect width="128" height="128" fill="#f0e9e9" />"##));
        assert!(svg.contains(r#"font-size="64""#));
        assert!(svg.contains(r#"x="64" y="64""#));
        assert!(svg.contains(r##"fill="#ffffff""##));
        assert!(svg.contains(">JD</text>"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn circle_uses_half_of_shorter_side() {
        let mut s = spec(Shape::Circle, ColorSpec::Solid(Rgb::BLACK));
        s.width = 200;
        s.height = 100;
        let svg = build_scene(&s, &["A".to_string()], 50.0, "sans-serif");
        assert!(svg.contains(r#"<circle cx="100" cy="50" r="50""#));
        assert!(!svg.contains("<rect"));
    }

    #[test]
    fn gradient_is_defined_and_referenced() {
        let s = spec(
            Shape::Rect,
            ColorSpec::Gradient(Rgb::new(255, 0, 0), Rgb::new(0, 0, 255)),
        );
        let svg = build_scene(&s, &["JD".to_string()], 64.0, "sans-serif");
        assert!(svg.contains(r#"<linearGradient id="grad_ff0000_0000ff" x1="0%" y1="0%" x2="100%" y2="0%">"#));
        assert!(svg.contains("stop-color:#ff0000"));
        assert!(svg.contains("stop-color:#0000ff"));
        assert!(svg.contains(r#"fill="url(#grad_ff0000_0000ff)""#));
    }

    #[test]
    fn text_is_escaped() {
        let s = spec(Shape::Rect, ColorSpec::Solid(Rgb::BLACK));
        let svg = build_scene(&s, &[r#"<b>"Tom" & 'Jerry'</b>"#.to_string()], 12.0, "sans-serif");
        assert!(svg.contains("&lt;b&gt;&quot;Tom&quot; &amp; &apos;Jerry&apos;&lt;/b&gt;"));
        assert!(!svg.contains("<b>"));
    }

    #[test]
    fn one_text_element_per_line() {
        let s = spec(Shape::Rect, ColorSpec::Solid(Rgb::BLACK));
        let lines = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        let svg = build_scene(&s, &lines, 20.0, "sans-serif");
        assert_eq!(svg.matches("<text ").count(), 3);
        // 行距 30，中线 64：34 / 64 / 94
        assert!(svg.contains(r#"y="34""#));
        assert!(svg.contains(r#"y="94""#));
    }
}
