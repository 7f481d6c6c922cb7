#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use tower::ServiceExt;

use grout::config::{AppConfig, FontsConfig};
use grout::startup::load_font_book;
use grout::features::content::ContentRepository;
use grout::features::render::FontBook;
use grout::{AppState, build_app};

/// 无系统字体、内置内容库、默认不限流的测试配置
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.rate_limit.enabled = false;
    config.fonts.load_system_fonts = false;
    config
}

pub fn app_with(config: AppConfig) -> Router {
    let content = ContentRepository::builtin().expect("builtin content");
    build_app(AppState::new(config, FontBook::empty(), content))
}

/// 使用仓库自带字体（不加载系统字体）的应用
pub fn app_with_bundled_fonts() -> Router {
    let config = test_config();
    let fonts = load_font_book(&FontsConfig {
        dir: concat!(env!("CARGO_MANIFEST_DIR"), "/resources/fonts").to_string(),
        family: None,
        load_system_fonts: false,
    });
    let content = ContentRepository::builtin().expect("builtin content");
    build_app(AppState::new(config, fonts, content))
}

pub fn app() -> Router {
    app_with(test_config())
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.expect("request")
}

pub fn header<'a>(resp: &'a Response<Body>, name: &str) -> &'a str {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

pub async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
    to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

pub async fn body_text(resp: Response<Body>) -> String {
    String::from_utf8(body_bytes(resp).await).expect("utf-8 body")
}
