//! Logging - tracing 订阅器初始化
//!
//! `RUST_LOG` 优先；否则使用配置的级别。日志写入 stderr，CLI 的 stdout 只输出章节文本。

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogConfig;

/// 默认过滤规则
pub fn default_filter(level: &str) -> String {
    format!("{level},storyforge={level},tower_http=debug")
}

/// 初始化全局订阅器；重复初始化时保持已有订阅器
pub fn init(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&config.level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(err) = result {
        eprintln!("tracing subscriber already initialized: {err}");
    }
}
