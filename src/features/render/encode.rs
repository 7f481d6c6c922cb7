//! 栅格编码：PNG / JPEG / GIF / WebP。

use image::ExtendedColorType;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use resvg::tiny_skia::Pixmap;

use super::RenderError;
use super::types::ImageFormat;

const JPEG_QUALITY: u8 = 90;
const WEBP_QUALITY: f32 = 90.0;

pub fn encode(pixmap: &Pixmap, format: ImageFormat) -> Result<Vec<u8>, RenderError> {
    match format {
        ImageFormat::Png => encode_png(pixmap),
        ImageFormat::Jpeg => encode_jpeg(pixmap),
        ImageFormat::Gif => encode_gif(pixmap),
        // 矢量格式不会走到栅格路径；兜底按 WebP 编码
        ImageFormat::Webp | ImageFormat::Svg => encode_webp(pixmap),
    }
}

/// tiny-skia 内部为预乘 alpha，编码器需要直通 alpha
fn straight_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    let rgba = straight_rgba(pixmap);
    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Default);
        encoder.set_filter(png::FilterType::Paeth);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::encode(ImageFormat::Png, e))?;
        writer
            .write_image_data(&rgba)
            .map_err(|e| RenderError::encode(ImageFormat::Png, e))?;
    }
    Ok(buf)
}

fn encode_jpeg(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    // JPEG 无透明通道：预乘数据直接丢弃 alpha，相当于合成到黑底
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    let mut buf = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
        encoder
            .encode(
                &rgb,
                pixmap.width(),
                pixmap.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| RenderError::encode(ImageFormat::Jpeg, e))?;
    }
    Ok(buf)
}

fn encode_gif(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    let rgba = straight_rgba(pixmap);
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut buf);
        encoder
            .encode(
                &rgba,
                pixmap.width(),
                pixmap.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| RenderError::encode(ImageFormat::Gif, e))?;
    }
    Ok(buf)
}

fn encode_webp(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    let rgba = straight_rgba(pixmap);
    let encoder = webp::Encoder::from_rgba(&rgba, pixmap.width(), pixmap.height());
    let memory = encoder
        .encode_simple(false, WEBP_QUALITY)
        .map_err(|e| RenderError::encode(ImageFormat::Webp, format!("{e:?}")))?;
    Ok(memory.to_vec())
}
