//! 图片接口的参数解析：数值、布尔开关、路径后缀与尺寸段。

use serde::Deserialize;

use crate::features::render::ImageFormat;

/// 默认尺寸（头像边长 / 占位图宽高）
pub const DEFAULT_SIZE: u32 = 128;
/// 头像默认背景色
pub const DEFAULT_AVATAR_BACKGROUND: &str = "f0e9e9";
/// 占位图默认背景色
pub const DEFAULT_PLACEHOLDER_BACKGROUND: &str = "cccccc";
/// 未提供名字时使用的默认名字
pub const DEFAULT_NAME: &str = "John Doe";

/// 头像查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvatarQuery {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    /// `background` 的简写
    #[serde(default)]
    pub bg: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub rounded: Option<String>,
    #[serde(default)]
    pub bold: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

/// 占位图查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceholderQuery {
    #[serde(default)]
    pub w: Option<String>,
    #[serde(default)]
    pub h: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub joke: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub bg: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

/// 非空、去除首尾空白后的参数值
pub fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// 解析正整数；缺失、非数字或为 0 时返回默认值
pub fn parse_positive_or(raw: Option<&str>, default: u32) -> u32 {
    non_empty(raw)
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

/// 布尔开关：`1/true/yes/on`（大小写不敏感）为真，其余为假
pub fn parse_bool(raw: Option<&str>) -> bool {
    non_empty(raw).is_some_and(|s| {
        matches!(
            s.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

/// 拆分路径段的格式后缀；无已知后缀时为 SVG
pub fn split_format(segment: &str) -> (ImageFormat, &str) {
    ImageFormat::from_extension(segment).unwrap_or((ImageFormat::Svg, segment))
}

/// `format` 查询参数覆盖路径后缀
pub fn resolve_format(from_path: ImageFormat, query: Option<&str>) -> ImageFormat {
    non_empty(query).map_or(from_path, ImageFormat::parse)
}

/// 解析 `{W}x{H}` 尺寸段（均为十进制数字）；格式不符时返回 None
pub fn parse_dimensions(segment: &str) -> Option<(&str, &str)> {
    let (w, h) = segment.split_once('x')?;
    let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    (is_number(w) && is_number(h)).then_some((w, h))
}

/// 路径中的名字：`+` 视为空格
pub fn decode_name(segment: &str) -> String {
    segment.replace('+', " ")
}
