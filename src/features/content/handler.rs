use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use super::ContentKind;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CategoriesResponse {
    pub kind: ContentKind,
    pub categories: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/categories/{kind}",
    summary = "列出内容类别",
    description = "返回名言（quote/quotes）或笑话（joke/jokes）的全部类别名，可用于占位图的 `category` 参数。",
    params(
        ("kind" = String, Path, description = "内容类型：quote(s) 或 joke(s)")
    ),
    responses(
        (status = 200, description = "类别列表", body = CategoriesResponse),
        (status = 404, description = "未知的内容类型", body = crate::error::ProblemDetails, content_type = "application/problem+json")
    ),
    tag = "Content"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<CategoriesResponse>, AppError> {
    let kind: ContentKind = kind
        .parse()
        .map_err(|_| AppError::NotFound(format!("未知的内容类型 `{kind}`")))?;
    Ok(Json(CategoriesResponse {
        kind,
        categories: state.content.get_categories(kind),
    }))
}
