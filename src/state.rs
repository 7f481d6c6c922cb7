use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::AppConfig;
use crate::features::cache::ImageCache;
use crate::features::content::ContentRepository;
use crate::features::ratelimit::RateLimiter;
use crate::features::render::{FontBook, Renderer};

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub renderer: Arc<Renderer>,
    /// 渲染结果缓存（指纹 → 图片字节）
    pub cache: Arc<ImageCache>,
    pub content: Arc<ContentRepository>,
    /// 按客户端限流；None 表示不限流
    pub rate_limiter: Option<Arc<RateLimiter>>,
    /// 控制并发渲染的信号量（限制 CPU 密集型任务数量）
    pub render_semaphore: Arc<Semaphore>,
}

impl AppState {
    /// 按配置组装状态。限流清扫任务需由调用方在运行时内启动。
    pub fn new(config: AppConfig, fonts: FontBook, content: ContentRepository) -> Self {
        let renderer = Renderer::new(Arc::new(fonts), config.render.policy());
        let cache = ImageCache::new(config.cache.capacity);
        let rate_limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiter::new(config.rate_limit.policy())));
        let render_semaphore = Arc::new(Semaphore::new(config.render.parallelism()));

        Self {
            config: Arc::new(config),
            renderer: Arc::new(renderer),
            cache: Arc::new(cache),
            content: Arc::new(content),
            rate_limiter,
            render_semaphore,
        }
    }
}
