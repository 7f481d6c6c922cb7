use std::time::Duration;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::features::render::RenderError;

/// 应用统一错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 图像渲染或编码失败
    #[error("图像渲染错误: {0}")]
    Render(#[from] RenderError),

    /// 资源不存在（如未知的内容类别）
    #[error("资源不存在: {0}")]
    NotFound(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// RFC7807 风格的错误响应（Problem Details）。
///
/// 图片接口成功时返回二进制或 SVG，失败时统一返回该 JSON 结构，
/// content-type 为 `application/problem+json`。
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// 问题类型（URI）。若无更细分的类型，可使用 about:blank。
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,

    /// 简短标题，用于概括错误。
    #[schema(example = "Too Many Requests")]
    pub title: String,

    /// HTTP 状态码（与响应 status 一致）。
    #[schema(example = 429)]
    pub status: u16,

    /// 人类可读的详细信息（尽量稳定，不建议依赖解析）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// 稳定的错误码，用于程序化处理。
    #[schema(example = "RATE_LIMITED")]
    pub code: String,

    /// 请求追踪 ID（由 request-id 中间件回填）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn stable_code(&self) -> &'static str {
        match self {
            AppError::Render(_) => "IMAGE_RENDER_FAILED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

fn title_for(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "Bad Request",
        StatusCode::NOT_FOUND => "Not Found",
        StatusCode::TOO_MANY_REQUESTS => "Too Many Requests",
        StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
        _ => "Error",
    }
}

/// 构造 `application/problem+json` 响应
pub fn problem_response(status: StatusCode, code: &str, detail: Option<String>) -> Response {
    let problem = ProblemDetails {
        type_url: "about:blank".to_string(),
        title: title_for(status).to_string(),
        status: status.as_u16(),
        detail,
        code: code.to_string(),
        request_id: crate::request_id::current_request_id(),
    };

    let mut res = Json(problem).into_response();
    *res.status_mut() = status;
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/problem+json"),
    );
    res
}

/// 限流拒绝响应：429 + `Retry-After`（整秒，至少 1 秒）
pub fn too_many_requests(retry_after: Duration) -> Response {
    let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
    let mut res = problem_response(
        StatusCode::TOO_MANY_REQUESTS,
        "RATE_LIMITED",
        Some(format!("请求过于频繁，请在 {secs} 秒后重试")),
    );
    res.headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    res
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("请求处理失败: {self}");
        }
        problem_response(status, self.stable_code(), Some(self.to_string()))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("渲染任务异常: {err}"))
    }
}
