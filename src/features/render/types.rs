use serde::{Deserialize, Serialize};

use super::color::{ColorSpec, Rgb};

/// 输出图片格式
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, utoipa::ToSchema, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// SVG（默认，直接输出矢量标记，不经过栅格化）
    #[default]
    Svg,
    /// PNG（无损）
    Png,
    /// JPEG（有损，质量 90）
    Jpeg,
    /// GIF（调色板索引色）
    Gif,
    /// WebP（有损，质量 90）
    Webp,
}

/// 路径后缀与格式的对应关系；顺序无关，后缀互不为前缀。
const EXTENSIONS: [(&str, ImageFormat); 6] = [
    (".png", ImageFormat::Png),
    (".jpg", ImageFormat::Jpeg),
    (".jpeg", ImageFormat::Jpeg),
    (".gif", ImageFormat::Gif),
    (".webp", ImageFormat::Webp),
    (".svg", ImageFormat::Svg),
];

impl ImageFormat {
    /// 从文件名后缀识别格式，返回格式与去掉后缀的名称；未识别时返回 None。
    pub fn from_extension(segment: &str) -> Option<(Self, &str)> {
        EXTENSIONS.iter().find_map(|(ext, fmt)| {
            let cut = segment.len().checked_sub(ext.len())?;
            let tail = segment.get(cut..)?;
            if tail.eq_ignore_ascii_case(ext) {
                Some((*fmt, &segment[..cut]))
            } else {
                None
            }
        })
    }

    /// 解析 `format` 参数：大小写不敏感；无法识别的值按 WebP 处理。
    pub fn parse(raw: &str) -> Self {
        match raw.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "svg" => Self::Svg,
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "gif" => Self::Gif,
            _ => Self::Webp,
        }
    }

    /// 稳定的格式代码（参与缓存指纹）
    pub fn code(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    pub fn is_vector(self) -> bool {
        matches!(self, Self::Svg)
    }
}

/// 背景形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Shape {
    /// 铺满画布的矩形
    #[default]
    Rect,
    /// 以较短边一半为半径的内切圆
    Circle,
}

impl Shape {
    pub fn code(self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Circle => "circle",
        }
    }
}

/// 字重
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    pub fn code(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Bold => "bold",
        }
    }
}

/// 文本排版方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextLayout {
    /// 单行居中（首字母、尺寸文字等短文本）
    #[default]
    Single,
    /// 自动换行并整体垂直居中（名言、笑话等长文本）
    Wrapped,
}

impl TextLayout {
    pub fn code(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Wrapped => "wrapped",
        }
    }
}

/// 一次渲染的完整描述：输出字节完全由这些字段决定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSpec {
    pub width: u32,
    pub height: u32,
    pub background: ColorSpec,
    pub foreground: Rgb,
    pub text: String,
    pub shape: Shape,
    pub weight: FontWeight,
    pub layout: TextLayout,
    pub format: ImageFormat,
}

impl RenderSpec {
    pub fn min_dimension(&self) -> u32 {
        self.width.min(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::ImageFormat;

    #[test]
    fn extension_is_detected_and_stripped() {
        assert_eq!(
            ImageFormat::from_extension("John Doe.png"),
            Some((ImageFormat::Png, "John Doe"))
        );
        assert_eq!(
            ImageFormat::from_extension("300x200.JPEG"),
            Some((ImageFormat::Jpeg, "300x200"))
        );
        assert_eq!(
            ImageFormat::from_extension("a.webp"),
            Some((ImageFormat::Webp, "a"))
        );
        assert_eq!(ImageFormat::from_extension("300x200"), None);
        assert_eq!(ImageFormat::from_extension("png"), None);
    }

    #[test]
    fn extension_lookup_is_safe_on_multibyte_names() {
        assert_eq!(ImageFormat::from_extension("张三"), None);
        assert_eq!(
            ImageFormat::from_extension("张三.gif"),
            Some((ImageFormat::Gif, "张三"))
        );
    }

    #[test]
    fn unknown_format_falls_back_to_webp() {
        assert_eq!(ImageFormat::parse("PNG"), ImageFormat::Png);
        assert_eq!(ImageFormat::parse("jpg"), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::parse("svg"), ImageFormat::Svg);
        assert_eq!(ImageFormat::parse("bmp"), ImageFormat::Webp);
        assert_eq!(ImageFormat::parse(""), ImageFormat::Webp);
    }

    #[test]
    fn content_types_match_formats() {
        assert_eq!(ImageFormat::Svg.content_type(), "image/svg+xml");
        assert_eq!(ImageFormat::Jpeg.content_type(), "image/jpeg");
        assert_eq!(ImageFormat::Gif.content_type(), "image/gif");
    }
}
