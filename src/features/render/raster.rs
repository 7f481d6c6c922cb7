use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, ImageRendering, Options as UsvgOptions, ShapeRendering, TextRendering};

use super::RenderError;
use super::encode;
use super::fonts::FontBook;
use super::svg::build_scene;
use super::types::RenderSpec;

/// 将排好版的场景栅格化并编码为 `spec.format` 指定的格式
pub fn render_raster(
    spec: &RenderSpec,
    lines: &[String],
    font_size: f64,
    fonts: &FontBook,
) -> Result<Vec<u8>, RenderError> {
    let mut pixmap = Pixmap::new(spec.width, spec.height).ok_or(RenderError::Canvas {
        width: spec.width,
        height: spec.height,
    })?;

    let markup = build_scene(spec, lines, font_size, fonts.family());
    let opt = UsvgOptions {
        fontdb: fonts.database(),
        font_family: fonts.family().to_string(),
        font_size: font_size as f32,
        languages: vec!["en".to_string(), "zh-CN".to_string()],
        shape_rendering: ShapeRendering::GeometricPrecision,
        text_rendering: TextRendering::OptimizeLegibility,
        image_rendering: ImageRendering::OptimizeQuality,
        ..Default::default()
    };

    let tree = usvg::Tree::from_data(markup.as_bytes(), &opt)
        .map_err(|e| RenderError::Scene(e.to_string()))?;
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

    encode::encode(&pixmap, spec.format)
}
