/// 渲染结果缓存
pub mod cache;

/// 名言/笑话内容库
pub mod content;

/// 健康检查
pub mod health {
    pub mod handler;
}

/// 头像与占位图接口
pub mod image;

/// 按客户端限流
pub mod ratelimit;

/// SVG 构建、栅格化与编码
pub mod render;
