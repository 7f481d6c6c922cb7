pub mod handler;
pub mod params;
pub mod service;

use axum::{Router, routing::get};

use crate::state::AppState;

pub use service::{CACHE_CONTROL_IMMUTABLE, X_CACHE, serve_image};

/// 头像与占位图路由（限流中间件由调用方挂载）
pub fn create_image_router() -> Router<AppState> {
    Router::new()
        .route("/avatar", get(handler::avatar_by_query))
        .route("/avatar/:name", get(handler::avatar))
        .route("/placeholder", get(handler::placeholder_by_query))
        .route("/placeholder/:dimensions", get(handler::placeholder))
}
