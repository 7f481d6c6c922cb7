//! 图片渲染：把一份 [`RenderSpec`] 变成 SVG 文本或栅格图片字节。
//!
//! 两条输出路径共享同一套排版（字号、换行、行定位）与同一份 SVG 场景；
//! 区别只在于换行时的宽度测量方式，以及栅格路径额外经过 resvg 光栅化与编码。

pub mod color;
pub mod encode;
pub mod fonts;
pub mod raster;
pub mod svg;
pub mod text;
pub mod types;

use std::fmt::Display;
use std::sync::Arc;

use thiserror::Error;

pub use color::{ColorSpec, Rgb};
pub use fonts::FontBook;
pub use text::FontBounds;
pub use types::{FontWeight, ImageFormat, RenderSpec, Shape, TextLayout};

use text::{GlyphMeasurer, HeuristicMeasurer, Measurer};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("无效的画布尺寸: {width}x{height}")]
    Canvas { width: u32, height: u32 },

    #[error("SVG 场景解析失败: {0}")]
    Scene(String),

    #[error("{format:?} 编码失败: {message}")]
    Encode {
        format: ImageFormat,
        message: String,
    },
}

impl RenderError {
    pub(crate) fn encode(format: ImageFormat, err: impl Display) -> Self {
        Self::Encode {
            format,
            message: err.to_string(),
        }
    }
}

/// 排版参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPolicy {
    pub font_bounds: FontBounds,
    /// 估算换行时每行至少容纳的字符数
    pub min_chars_per_line: usize,
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            font_bounds: FontBounds::default(),
            min_chars_per_line: HeuristicMeasurer::default().min_chars_per_line,
        }
    }
}

/// 渲染器：无内部可变状态，可在多个阻塞线程间共享
#[derive(Debug, Clone)]
pub struct Renderer {
    fonts: Arc<FontBook>,
    policy: RenderPolicy,
}

impl Renderer {
    pub fn new(fonts: Arc<FontBook>, policy: RenderPolicy) -> Self {
        Self { fonts, policy }
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn policy(&self) -> RenderPolicy {
        self.policy
    }

    /// 渲染为 `spec.format` 指定格式的字节
    pub fn render(&self, spec: &RenderSpec) -> Result<Vec<u8>, RenderError> {
        let font_size = text::font_size_for(
            &spec.text,
            spec.width,
            spec.height,
            spec.layout,
            self.policy.font_bounds,
        );

        if spec.format.is_vector() {
            let measurer = HeuristicMeasurer {
                min_chars_per_line: self.policy.min_chars_per_line,
            };
            let lines = self.layout_lines(spec, font_size, &measurer);
            let markup = svg::build_scene(spec, &lines, font_size, fonts::GENERIC_FAMILY);
            return Ok(markup.into_bytes());
        }

        let measurer = GlyphMeasurer::new(&self.fonts, spec.weight);
        let lines = self.layout_lines(spec, font_size, &measurer);
        raster::render_raster(spec, &lines, font_size, &self.fonts)
    }

    fn layout_lines(&self, spec: &RenderSpec, font_size: f64, measurer: &dyn Measurer) -> Vec<String> {
        match spec.layout {
            TextLayout::Single => vec![spec.text.clone()],
            TextLayout::Wrapped => text::wrap(
                &spec.text,
                text::usable_width(spec.width),
                font_size,
                measurer,
            ),
        }
    }
}
