//! 统一的出图流程：条件请求 → 缓存 → 渲染 → 写缓存 → 响应头。

use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::features::cache::{digest, fingerprint};
use crate::features::render::RenderSpec;
use crate::state::AppState;

pub const CACHE_CONTROL_IMMUTABLE: &str = "public, max-age=31536000, immutable";
pub const X_CACHE: &str = "x-cache";

/// 响应来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

/// `If-None-Match` 是否与当前 ETag 匹配（支持逗号分隔列表、弱校验前缀与 `*`）
fn etag_matches(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .any(|candidate| {
            candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
        })
}

/// 渲染（或从缓存取出）并构造图片响应
pub async fn serve_image(
    state: &AppState,
    headers: &HeaderMap,
    spec: RenderSpec,
) -> Result<Response, AppError> {
    let key = fingerprint(&spec);
    let etag = digest(&key);

    if etag_matches(headers, &etag) {
        tracing::debug!(%etag, "条件请求命中，返回 304");
        return Ok(not_modified(&etag));
    }

    let content_type = spec.format.content_type();

    if let Some(bytes) = state.cache.get(&key) {
        tracing::debug!(key = %key, "缓存命中");
        return Ok(image_response(bytes, content_type, &etag, CacheStatus::Hit));
    }

    let t_wait = Instant::now();
    let _permit = state
        .render_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| AppError::Internal(format!("获取渲染信号量失败: {e}")))?;
    let wait_ms = t_wait.elapsed().as_millis() as u64;

    let t_render = Instant::now();
    let renderer = state.renderer.clone();
    let (width, height, format) = (spec.width, spec.height, spec.format);
    // 栅格化与编码是 CPU 密集型操作，必须移出 tokio worker
    let rendered = tokio::task::spawn_blocking(move || renderer.render(&spec)).await??;
    let bytes = Bytes::from(rendered);

    tracing::debug!(
        width,
        height,
        format = format.code(),
        bytes = bytes.len(),
        wait_ms,
        render_ms = t_render.elapsed().as_millis() as u64,
        "渲染完成"
    );

    state.cache.put(key, bytes.clone());
    Ok(image_response(bytes, content_type, &etag, CacheStatus::Miss))
}

fn image_response(bytes: Bytes, content_type: &'static str, etag: &str, cache: CacheStatus) -> Response {
    let mut res = (StatusCode::OK, Body::from(bytes)).into_response();
    let h = res.headers_mut();
    h.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    h.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(CACHE_CONTROL_IMMUTABLE),
    );
    if let Ok(v) = HeaderValue::from_str(etag) {
        h.insert(header::ETAG, v);
    }
    h.insert(X_CACHE, HeaderValue::from_static(cache.as_str()));
    res
}

fn not_modified(etag: &str) -> Response {
    let mut res = StatusCode::NOT_MODIFIED.into_response();
    if let Ok(v) = HeaderValue::from_str(etag) {
        res.headers_mut().insert(header::ETAG, v);
    }
    res
}
