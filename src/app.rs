//! 路由组装：业务路由、文档与全局中间件。

use axum::{Router, middleware, routing::get};
use tower_http::compression::CompressionLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::features::content::create_content_router;
use crate::features::health::handler::health_check;
use crate::features::image::create_image_router;
use crate::features::ratelimit::middleware::rate_limit_middleware;
use crate::openapi::{ApiDoc, with_server};
use crate::request_id::request_id_middleware;
use crate::state::AppState;

fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    // 只压缩文本类响应：SVG 与 JSON 收益明显，png/jpeg/gif/webp 本身已压缩。
    // NotForContentType::IMAGES 对 image/svg+xml 放行。
    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}

/// 组装完整的应用路由
///
/// 限流只作用于图片接口；健康检查、类别查询与文档不计入配额。
pub fn build_app(state: AppState) -> Router {
    let image_routes = create_image_router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        rate_limit_middleware,
    ));

    let doc = with_server(ApiDoc::openapi(), &state.config.server.domain);

    Router::<AppState>::new()
        .route("/health", get(health_check))
        .merge(image_routes)
        .merge(create_content_router())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", doc))
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CompressionLayer::new().compress_when(compression_predicate()))
}
