//! Configuration Types
//!
//! 定义所有配置结构体

use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::application::draft::{RevealConfig, RevealMode};
use crate::application::GenerationSettings;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// AI 提供方配置
    #[serde(default)]
    pub ai: AiConfig,

    /// 流式生成配置
    #[serde(default)]
    pub generation: GenerationConfig,

    /// CLI 客户端配置
    #[serde(default)]
    pub client: ClientConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 服务端生成参数
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            max_tokens: self.ai.max_tokens,
            title_max_tokens: self.ai.title_max_tokens,
            temperature: self.ai.temperature,
            pacing: Duration::from_millis(self.generation.pacing_ms),
            max_duration: Duration::from_secs(self.generation.max_duration_secs),
            channel_capacity: self.generation.channel_capacity,
            max_previous_chars: self.generation.max_previous_chars,
        }
    }
}

// ============================================================================
// Server
// ============================================================================

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============================================================================
// AI
// ============================================================================

/// 补全引擎实现
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI 兼容的 DeepSeek 接口
    #[default]
    Deepseek,
    /// 固定脚本输出，离线演示用
    Scripted,
}

/// AI 提供方配置
#[derive(Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    /// API 基础 URL
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,

    #[serde(default = "default_ai_model")]
    pub model: String,

    /// 凭证环境变量名，每次请求重新读取
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// 配置文件中的凭证（环境变量缺失时使用）
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_title_max_tokens")]
    pub title_max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// 非流式请求超时（秒）
    #[serde(default = "default_ai_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_ai_base_url() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_ai_model() -> String {
    "deepseek-chat".to_string()
}

fn default_api_key_env() -> String {
    "DEEPSEEK_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    800
}

fn default_title_max_tokens() -> u32 {
    50
}

fn default_temperature() -> f32 {
    0.7
}

fn default_ai_timeout() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    5
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: default_ai_base_url(),
            model: default_ai_model(),
            api_key_env: default_api_key_env(),
            api_key: None,
            max_tokens: default_max_tokens(),
            title_max_tokens: default_title_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_ai_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl AiConfig {
    /// 配置文件中的凭证；空白视为未配置
    pub fn configured_key(&self) -> Option<SecretString> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| SecretString::new(k.into()))
    }
}

impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("max_tokens", &self.max_tokens)
            .field("title_max_tokens", &self.title_max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

// ============================================================================
// Generation
// ============================================================================

/// 流式生成配置
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// 相邻 text 帧之间的延迟（毫秒）
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// 单次生成总时长上限（秒）
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: u64,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// 前文摘要最大字符数
    #[serde(default = "default_max_previous_chars")]
    pub max_previous_chars: usize,
}

fn default_pacing_ms() -> u64 {
    50
}

fn default_max_duration() -> u64 {
    60
}

fn default_channel_capacity() -> usize {
    32
}

fn default_max_previous_chars() -> usize {
    4000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
            max_duration_secs: default_max_duration(),
            channel_capacity: default_channel_capacity(),
            max_previous_chars: default_max_previous_chars(),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// CLI 客户端配置
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// 服务端地址
    #[serde(default = "default_client_base_url")]
    pub base_url: String,

    /// 模拟展示粒度：words 或 chars
    #[serde(default)]
    pub reveal_mode: RevealMode,

    /// 模拟展示每步延迟（毫秒）
    #[serde(default = "default_reveal_step_ms")]
    pub reveal_step_ms: u64,

    /// AI 状态缓存时长（秒）
    #[serde(default = "default_status_cache_secs")]
    pub status_cache_secs: u64,
}

fn default_client_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_reveal_step_ms() -> u64 {
    30
}

fn default_status_cache_secs() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_client_base_url(),
            reveal_mode: RevealMode::default(),
            reveal_step_ms: default_reveal_step_ms(),
            status_cache_secs: default_status_cache_secs(),
        }
    }
}

impl ClientConfig {
    pub fn reveal(&self) -> RevealConfig {
        RevealConfig {
            mode: self.reveal_mode,
            step_delay: Duration::from_millis(self.reveal_step_ms),
        }
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_cache_secs)
    }
}

// ============================================================================
// Log
// ============================================================================

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
