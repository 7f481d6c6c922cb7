use std::net::SocketAddr;
use std::time::Duration;

use grout::shutdown::cleanup_with_timeout;
use grout::startup::{load_content, load_font_book};
use grout::{AppConfig, AppState, ShutdownManager, build_app};

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.as_str().into());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.logging.format.eq_ignore_ascii_case("compact") {
        builder.compact().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    // Load config
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config init failed: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config);
    let config_path = AppConfig::config_path();
    if config_path.exists() {
        tracing::info!("已加载配置文件 {:?}", config_path);
    } else {
        tracing::info!("未找到配置文件 {:?}，使用默认配置与环境变量", config_path);
    }

    // 创建优雅退出管理器
    let shutdown_manager = ShutdownManager::new();

    // 启动期资源：字体与内容库
    let fonts = load_font_book(&config.fonts);
    let content = match load_content(&config.content) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!("内容库加载失败: {}", e);
            std::process::exit(1);
        }
    };

    let addr = config.server_addr();
    let shutdown_timeout = Duration::from_secs(config.shutdown.timeout_secs);
    let app_state = AppState::new(config, fonts, content);

    let rate_limiter = app_state.rate_limiter.clone();
    if let Some(limiter) = rate_limiter.as_ref() {
        limiter.start_sweeper();
        let policy = limiter.policy();
        tracing::info!(
            requests_per_minute = policy.requests_per_minute,
            burst = policy.burst,
            "限流已启用"
        );
    } else {
        tracing::info!("限流已关闭");
    }

    // 启动信号处理器
    if let Err(e) = shutdown_manager.start_signal_handler() {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    let app = build_app(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);

    // 限流需要连接对端地址
    let graceful = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let reason = shutdown_manager.wait_for_shutdown().await;
        tracing::info!("接收到退出信号: {:?}，开始优雅关闭HTTP服务器...", reason);
    });

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    if let Some(limiter) = rate_limiter {
        match cleanup_with_timeout(limiter.shutdown(), shutdown_timeout).await {
            Ok(()) => tracing::info!("限流清扫任务已停止"),
            Err(e) => tracing::warn!("限流清扫任务停止失败: {}", e),
        }
    }

    tracing::info!("服务器已优雅关闭");
}
