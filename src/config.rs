use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::features::ratelimit::RateLimitPolicy;
use crate::features::render::{FontBounds, RenderPolicy};

/// 配置文件路径的环境变量覆盖
const CONFIG_PATH_ENV: &str = "GROUT_CONFIG";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
    /// 对外展示的域名（仅用于日志与文档）
    #[serde(default = "ServerConfig::default_domain")]
    pub domain: String,
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }
    fn default_port() -> u16 {
        8080
    }
    fn default_domain() -> String {
        "localhost:8080".to_string()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            domain: Self::default_domain(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（EnvFilter 语法；`RUST_LOG` 优先）
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
    /// 日志格式：full / compact
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "grout=info,tower_http=info".to_string()
    }
    fn default_format() -> String {
        "full".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            format: Self::default_format(),
        }
    }
}

/// 渲染结果缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 最多缓存的图片条数（LRU 淘汰）
    #[serde(default = "CacheConfig::default_capacity")]
    pub capacity: usize,
}

impl CacheConfig {
    fn default_capacity() -> usize {
        2000
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
        }
    }
}

/// 限流配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "RateLimitConfig::default_enabled")]
    pub enabled: bool,
    /// 稳态速率（每分钟请求数）
    #[serde(default = "RateLimitConfig::default_rpm")]
    pub requests_per_minute: u32,
    /// 突发容量
    #[serde(default = "RateLimitConfig::default_burst")]
    pub burst: u32,
    /// 客户端空闲多久后被清扫（秒）
    #[serde(default = "RateLimitConfig::default_idle_ttl")]
    pub idle_ttl_secs: u64,
    /// 清扫周期（秒）
    #[serde(default = "RateLimitConfig::default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl RateLimitConfig {
    fn default_enabled() -> bool {
        true
    }
    fn default_rpm() -> u32 {
        100
    }
    fn default_burst() -> u32 {
        10
    }
    fn default_idle_ttl() -> u64 {
        600
    }
    fn default_sweep_interval() -> u64 {
        600
    }

    pub fn policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::from(self)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            requests_per_minute: Self::default_rpm(),
            burst: Self::default_burst(),
            idle_ttl_secs: Self::default_idle_ttl(),
            sweep_interval_secs: Self::default_sweep_interval(),
        }
    }
}

/// 渲染配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// 多行文本的最小字号
    #[serde(default = "RenderConfig::default_min_font_size")]
    pub min_font_size: f64,
    /// 多行文本的最大字号
    #[serde(default = "RenderConfig::default_max_font_size")]
    pub max_font_size: f64,
    /// 估算换行时每行至少容纳的字符数
    #[serde(default = "RenderConfig::default_min_chars_per_line")]
    pub min_chars_per_line: usize,
    /// 宽度不低于该值的占位图才会填充名言/笑话
    #[serde(default = "RenderConfig::default_min_width_for_quote")]
    pub min_width_for_quote: u32,
    /// 宽高上限，超出时截断到该值
    #[serde(default = "RenderConfig::default_max_dimension")]
    pub max_dimension: u32,
    /// 并发渲染许可数（0=自动，取 CPU 核心数）
    #[serde(default)]
    pub max_parallel: u32,
}

impl RenderConfig {
    fn default_min_font_size() -> f64 {
        16.0
    }
    fn default_max_font_size() -> f64 {
        48.0
    }
    fn default_min_chars_per_line() -> usize {
        10
    }
    fn default_min_width_for_quote() -> u32 {
        300
    }
    fn default_max_dimension() -> u32 {
        4096
    }

    pub fn policy(&self) -> RenderPolicy {
        RenderPolicy {
            font_bounds: FontBounds {
                min: self.min_font_size,
                max: self.max_font_size,
            },
            min_chars_per_line: self.min_chars_per_line,
        }
    }

    /// 实际并发许可数
    pub fn parallelism(&self) -> usize {
        if self.max_parallel == 0 {
            num_cpus::get().max(1)
        } else {
            self.max_parallel as usize
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            min_font_size: Self::default_min_font_size(),
            max_font_size: Self::default_max_font_size(),
            min_chars_per_line: Self::default_min_chars_per_line(),
            min_width_for_quote: Self::default_min_width_for_quote(),
            max_dimension: Self::default_max_dimension(),
            max_parallel: 0,
        }
    }
}

/// 字体配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontsConfig {
    /// 额外字体目录（其中的 .ttf/.otf 会被加载）
    #[serde(default = "FontsConfig::default_dir")]
    pub dir: String,
    /// 首选字体族名，缺省时使用系统无衬线字体
    #[serde(default)]
    pub family: Option<String>,
    /// 是否加载系统字体
    #[serde(default = "FontsConfig::default_load_system_fonts")]
    pub load_system_fonts: bool,
}

impl FontsConfig {
    fn default_dir() -> String {
        "./resources/fonts".to_string()
    }
    fn default_load_system_fonts() -> bool {
        true
    }
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            family: None,
            load_system_fonts: Self::default_load_system_fonts(),
        }
    }
}

/// 内容库配置；路径为空时使用内置数据
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default)]
    pub quotes_path: Option<String>,
    #[serde(default)]
    pub jokes_path: Option<String>,
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 优雅退出超时（秒）
    #[serde(default = "ShutdownConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout_secs() -> u64 {
        30
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub fonts: FontsConfig,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 从配置文件加载配置（文件可选），支持环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        let builder = ConfigBuilder::builder()
            // 加载配置文件（不存在时全部使用默认值）
            .add_source(File::from(config_path.as_path()).required(false))
            // 支持环境变量覆盖，例如：GROUT_RATE_LIMIT__BURST=20
            .add_source(
                Environment::with_prefix("GROUT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = builder.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 配置文件路径：`GROUT_CONFIG`，缺省为 `config.toml`
    pub fn config_path() -> PathBuf {
        std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.render.min_font_size > self.render.max_font_size {
            return Err(ConfigError::Message(format!(
                "render.min_font_size ({}) 不能大于 render.max_font_size ({})",
                self.render.min_font_size, self.render.max_font_size
            )));
        }
        if self.render.max_dimension == 0 {
            return Err(ConfigError::Message(
                "render.max_dimension 必须大于 0".to_string(),
            ));
        }
        Ok(())
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
