use utoipa::OpenApi;
use utoipa::openapi::server::ServerBuilder;

/// 文档中的 Servers：对外域名来自 `server.domain`，运行时注入。
pub fn with_server(mut doc: utoipa::openapi::OpenApi, domain: &str) -> utoipa::openapi::OpenApi {
    let url = if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("http://{domain}")
    };
    let public = ServerBuilder::new()
        .url(url)
        .description(Some("对外地址（server.domain）"))
        .build();
    let root = ServerBuilder::new()
        .url("/")
        .description(Some("同源"))
        .build();
    doc.servers = Some(vec![root, public]);
    doc
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::image::handler::avatar,
        crate::features::image::handler::avatar_by_query,
        crate::features::image::handler::placeholder,
        crate::features::image::handler::placeholder_by_query,
        crate::features::content::handler::list_categories,
    ),
    components(schemas(
        crate::error::ProblemDetails,
        crate::features::health::handler::HealthResponse,
        crate::features::content::handler::CategoriesResponse,
        crate::features::content::ContentKind,
        crate::features::render::ImageFormat,
    )),
    tags(
        (
            name = "Image",
            description = "图片生成：首字母头像与占位图（svg/png/jpeg/gif/webp），带 ETag 与结果缓存。"
        ),
        (name = "Content", description = "内容库：占位图可用的名言/笑话类别。"),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "Grout API",
        version = env!("CARGO_PKG_VERSION"),
        description = "头像与占位图生成服务（Axum + utoipa）。图片接口按客户端限流，超出配额返回 429。"
    )
)]
pub struct ApiDoc;
