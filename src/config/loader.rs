//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml / config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "STORYFORGE";

/// 加载应用配置
///
/// # 环境变量示例
/// - `STORYFORGE_SERVER__PORT=8080`
/// - `STORYFORGE_AI__PROVIDER=scripted`
/// - `STORYFORGE_GENERATION__PACING_MS=0`
/// - `STORYFORGE_CLIENT__BASE_URL=http://story-host:3001`
///
/// 凭证本身不在这里读取：`ai.api_key_env` 指定的变量在每次请求时重新读取。
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_layered(config_path, ENV_PREFIX)
}

fn load_layered(config_path: Option<&Path>, env_prefix: &str) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3001)?
        .set_default("ai.provider", "deepseek")?
        .set_default("ai.base_url", "https://api.deepseek.com")?
        .set_default("ai.model", "deepseek-chat")?
        .set_default("ai.api_key_env", "DEEPSEEK_API_KEY")?
        .set_default("ai.max_tokens", 800)?
        .set_default("ai.title_max_tokens", 50)?
        .set_default("ai.temperature", 0.7)?
        .set_default("ai.timeout_secs", 60)?
        .set_default("ai.connect_timeout_secs", 5)?
        .set_default("generation.pacing_ms", 50)?
        .set_default("generation.max_duration_secs", 60)?
        .set_default("generation.channel_capacity", 32)?
        .set_default("generation.max_previous_chars", 4000)?
        .set_default("client.base_url", "http://localhost:3001")?
        .set_default("client.reveal_mode", "words")?
        .set_default("client.reveal_step_ms", 30)?
        .set_default("client.status_cache_secs", 30)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），层级分隔符为双下划线
    builder = builder.add_source(
        Environment::with_prefix(env_prefix)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.server.port == 0 {
        return invalid("Server port cannot be 0");
    }
    if config.ai.base_url.trim().is_empty() {
        return invalid("AI base URL cannot be empty");
    }
    if config.ai.model.trim().is_empty() {
        return invalid("AI model cannot be empty");
    }
    if !(0.0..=2.0).contains(&config.ai.temperature) {
        return invalid("AI temperature must be between 0 and 2");
    }
    if config.ai.max_tokens == 0 || config.ai.title_max_tokens == 0 {
        return invalid("AI max tokens cannot be 0");
    }
    if config.generation.max_duration_secs == 0 {
        return invalid("Generation max duration cannot be 0");
    }
    if config.generation.channel_capacity == 0 {
        return invalid("Generation channel capacity cannot be 0");
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）；凭证只报告是否存在
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("AI Provider: {:?}", config.ai.provider);
    tracing::info!("AI Base URL: {}", config.ai.base_url);
    tracing::info!("AI Model: {}", config.ai.model);
    tracing::info!(
        "AI Credential: env {} ({}), config file ({})",
        config.ai.api_key_env,
        presence(std::env::var(&config.ai.api_key_env).is_ok_and(|v| !v.trim().is_empty())),
        presence(config.ai.configured_key().is_some()),
    );
    tracing::info!("Max Tokens: {}", config.ai.max_tokens);
    tracing::info!("Pacing: {}ms", config.generation.pacing_ms);
    tracing::info!("Max Duration: {}s", config.generation.max_duration_secs);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

fn presence(present: bool) -> &'static str {
    if present {
        "set"
    } else {
        "not set"
    }
}
