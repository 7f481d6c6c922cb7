use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
};

use super::params::{
    AvatarQuery, DEFAULT_AVATAR_BACKGROUND, DEFAULT_NAME, DEFAULT_PLACEHOLDER_BACKGROUND,
    DEFAULT_SIZE, PlaceholderQuery, decode_name, non_empty, parse_bool, parse_dimensions,
    parse_positive_or, resolve_format, split_format,
};
use super::service::serve_image;
use crate::error::AppError;
use crate::features::content::ContentKind;
use crate::features::render::{
    FontWeight, ImageFormat, Rgb, RenderSpec, Shape, TextLayout,
    color::{color_from_seed, resolve_background, resolve_contrast},
    text::initials,
};
use crate::state::AppState;

/// 背景色取值：`background` 优先，`bg` 为简写
fn background_param<'a>(background: Option<&'a str>, bg: Option<&'a str>, default: &'a str) -> &'a str {
    non_empty(background).or(non_empty(bg)).unwrap_or(default)
}

/// 前景色：显式指定时直接解析，否则按背景亮度取黑/白
fn foreground_for(color: Option<&str>, background: &str) -> Rgb {
    match non_empty(color) {
        Some(c) => Rgb::parse_hex(c),
        None => resolve_contrast(background),
    }
}

#[utoipa::path(
    get,
    path = "/avatar/{name}",
    summary = "生成首字母头像",
    description = "取名字前两个词的首字母绘制头像。路径末尾的 .png/.jpg/.jpeg/.gif/.webp/.svg 决定输出格式（缺省为 SVG）；也可省略路径段改用 `?name=`（`GET /avatar`）。",
    params(
        ("name" = String, Path, description = "名字，`+` 视为空格；可带格式后缀"),
        ("size" = Option<u32>, Query, description = "边长像素，默认 128"),
        ("background" = Option<String>, Query, description = "背景色：hex、`c1,c2` 渐变或 `random`；别名 `bg`，默认 f0e9e9"),
        ("color" = Option<String>, Query, description = "文字颜色 hex；缺省按背景亮度取黑/白"),
        ("rounded" = Option<bool>, Query, description = "圆形头像"),
        ("bold" = Option<bool>, Query, description = "粗体文字"),
        ("format" = Option<String>, Query, description = "输出格式，覆盖路径后缀；无法识别时为 webp")
    ),
    responses(
        (status = 200, description = "图片字节或 SVG 文本"),
        (status = 304, description = "与 If-None-Match 匹配"),
        (status = 429, description = "请求过于频繁", body = crate::error::ProblemDetails, content_type = "application/problem+json"),
        (status = 500, description = "渲染失败", body = crate::error::ProblemDetails, content_type = "application/problem+json")
    ),
    tag = "Image"
)]
pub async fn avatar(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(q): Query<AvatarQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (path_format, name) = split_format(&segment);
    let spec = build_avatar_spec(&state, path_format, Some(decode_name(name)), &q);
    serve_image(&state, &headers, spec).await
}

#[utoipa::path(
    get,
    path = "/avatar",
    summary = "生成首字母头像（查询参数形式）",
    description = "与 `/avatar/{name}` 相同，名字取自 `?name=`，缺省为 John Doe；格式由 `format` 决定，缺省为 SVG。",
    params(
        ("name" = Option<String>, Query, description = "名字"),
        ("size" = Option<u32>, Query, description = "边长像素，默认 128"),
        ("background" = Option<String>, Query, description = "背景色：hex、`c1,c2` 渐变或 `random`；别名 `bg`"),
        ("color" = Option<String>, Query, description = "文字颜色 hex"),
        ("rounded" = Option<bool>, Query, description = "圆形头像"),
        ("bold" = Option<bool>, Query, description = "粗体文字"),
        ("format" = Option<String>, Query, description = "输出格式；无法识别时为 webp")
    ),
    responses(
        (status = 200, description = "图片字节或 SVG 文本"),
        (status = 304, description = "与 If-None-Match 匹配"),
        (status = 429, description = "请求过于频繁", body = crate::error::ProblemDetails, content_type = "application/problem+json")
    ),
    tag = "Image"
)]
pub async fn avatar_by_query(
    State(state): State<AppState>,
    Query(q): Query<AvatarQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let spec = build_avatar_spec(&state, ImageFormat::Svg, None, &q);
    serve_image(&state, &headers, spec).await
}

/// 路径名字优先，其次 `?name=`，最后默认名字
fn build_avatar_spec(
    state: &AppState,
    path_format: ImageFormat,
    path_name: Option<String>,
    q: &AvatarQuery,
) -> RenderSpec {
    let name = path_name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| non_empty(q.name.as_deref()).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_NAME.to_string());

    let format = resolve_format(path_format, q.format.as_deref());
    let max = state.config.render.max_dimension;
    let size = parse_positive_or(q.size.as_deref(), DEFAULT_SIZE).min(max);

    let requested_bg = background_param(
        q.background.as_deref(),
        q.bg.as_deref(),
        DEFAULT_AVATAR_BACKGROUND,
    );
    let background = if requested_bg.eq_ignore_ascii_case("random") {
        color_from_seed(&name)
    } else {
        requested_bg.to_string()
    };

    RenderSpec {
        width: size,
        height: size,
        background: resolve_background(&background),
        foreground: foreground_for(q.color.as_deref(), &background),
        text: initials(&name),
        shape: if parse_bool(q.rounded.as_deref()) {
            Shape::Circle
        } else {
            Shape::Rect
        },
        weight: if parse_bool(q.bold.as_deref()) {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        },
        layout: TextLayout::Single,
        format,
    }
}

#[utoipa::path(
    get,
    path = "/placeholder/{dimensions}",
    summary = "生成占位图",
    description = "按 `{W}x{H}` 生成占位图（也可用 `GET /placeholder?w=&h=`）。宽度不低于阈值时可用 `quote`/`joke` 填充随机名言或笑话（名言优先），否则显示 `text` 或 \"W x H\"。",
    params(
        ("dimensions" = String, Path, description = "尺寸段，如 300x200 或 300x200.png"),
        ("w" = Option<u32>, Query, description = "宽度（路径未给出尺寸时），默认 128"),
        ("h" = Option<u32>, Query, description = "高度（路径未给出尺寸时），默认 128"),
        ("text" = Option<String>, Query, description = "自定义文字"),
        ("quote" = Option<bool>, Query, description = "填充随机名言"),
        ("joke" = Option<bool>, Query, description = "填充随机笑话"),
        ("category" = Option<String>, Query, description = "名言/笑话类别，缺省为全部"),
        ("background" = Option<String>, Query, description = "背景色：hex 或 `c1,c2` 渐变；别名 `bg`，默认 cccccc"),
        ("color" = Option<String>, Query, description = "文字颜色 hex；缺省按背景亮度取黑/白"),
        ("format" = Option<String>, Query, description = "输出格式，覆盖路径后缀；无法识别时为 webp")
    ),
    responses(
        (status = 200, description = "图片字节或 SVG 文本"),
        (status = 304, description = "与 If-None-Match 匹配"),
        (status = 429, description = "请求过于频繁", body = crate::error::ProblemDetails, content_type = "application/problem+json"),
        (status = 500, description = "渲染失败", body = crate::error::ProblemDetails, content_type = "application/problem+json")
    ),
    tag = "Image"
)]
pub async fn placeholder(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    Query(q): Query<PlaceholderQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let (path_format, metric) = split_format(&segment);
    let spec = build_placeholder_spec(&state, path_format, metric, &q);
    serve_image(&state, &headers, spec).await
}

#[utoipa::path(
    get,
    path = "/placeholder",
    summary = "生成占位图（查询参数形式）",
    description = "与 `/placeholder/{dimensions}` 相同，尺寸取自 `?w=&h=`（默认 128）。",
    params(
        ("w" = Option<u32>, Query, description = "宽度，默认 128"),
        ("h" = Option<u32>, Query, description = "高度，默认 128"),
        ("text" = Option<String>, Query, description = "自定义文字"),
        ("quote" = Option<bool>, Query, description = "填充随机名言"),
        ("joke" = Option<bool>, Query, description = "填充随机笑话"),
        ("category" = Option<String>, Query, description = "名言/笑话类别"),
        ("background" = Option<String>, Query, description = "背景色；别名 `bg`，默认 cccccc"),
        ("color" = Option<String>, Query, description = "文字颜色 hex"),
        ("format" = Option<String>, Query, description = "输出格式；无法识别时为 webp")
    ),
    responses(
        (status = 200, description = "图片字节或 SVG 文本"),
        (status = 304, description = "与 If-None-Match 匹配"),
        (status = 429, description = "请求过于频繁", body = crate::error::ProblemDetails, content_type = "application/problem+json")
    ),
    tag = "Image"
)]
pub async fn placeholder_by_query(
    State(state): State<AppState>,
    Query(q): Query<PlaceholderQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let spec = build_placeholder_spec(&state, ImageFormat::Svg, "", &q);
    serve_image(&state, &headers, spec).await
}

/// 尺寸段不合法时退回 `?w=&h=`
fn build_placeholder_spec(
    state: &AppState,
    path_format: ImageFormat,
    metric: &str,
    q: &PlaceholderQuery,
) -> RenderSpec {
    let (raw_w, raw_h) = match parse_dimensions(metric) {
        Some((w, h)) => (Some(w), Some(h)),
        None => (q.w.as_deref(), q.h.as_deref()),
    };
    let max = state.config.render.max_dimension;
    let width = parse_positive_or(raw_w, DEFAULT_SIZE).min(max);
    let height = parse_positive_or(raw_h, DEFAULT_SIZE).min(max);

    let format = resolve_format(path_format, q.format.as_deref());

    let fallback_text = non_empty(q.text.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{width} x {height}"));

    let kind = if parse_bool(q.quote.as_deref()) {
        Some(ContentKind::Quote)
    } else if parse_bool(q.joke.as_deref()) {
        Some(ContentKind::Joke)
    } else {
        None
    };

    let (text, layout) = match kind.filter(|_| width >= state.config.render.min_width_for_quote) {
        Some(kind) => {
            let category = q.category.as_deref().unwrap_or_default();
            match state.content.get_random(kind, category) {
                Ok(text) => (text, TextLayout::Wrapped),
                Err(e) => {
                    tracing::debug!("内容获取失败，回退到普通文字: {e}");
                    (fallback_text, TextLayout::Single)
                }
            }
        }
        None => (fallback_text, TextLayout::Single),
    };

    let background = background_param(
        q.background.as_deref(),
        q.bg.as_deref(),
        DEFAULT_PLACEHOLDER_BACKGROUND,
    );

    RenderSpec {
        width,
        height,
        background: resolve_background(background),
        foreground: foreground_for(q.color.as_deref(), background),
        text,
        shape: Shape::Rect,
        weight: FontWeight::Bold,
        layout,
        format,
    }
}
