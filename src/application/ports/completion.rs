//! Completion Port - 文本补全引擎抽象
//!
//! 上游 LLM（OpenAI 兼容的 chat completions 接口）的抽象，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use secrecy::SecretString;
use thiserror::Error;

/// 补全错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("Provider unavailable")]
    Unavailable,

    #[error("Provider error {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid credential")]
    InvalidCredential,
}

/// 补全请求
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// 系统提示词
    pub system: Option<String>,
    /// 用户提示词
    pub prompt: String,
    /// 最大生成 token 数
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens,
            temperature,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// 文本增量流；有限，上游结束时终止
pub type DeltaStream = BoxStream<'static, Result<String, CompletionError>>;

/// Completion Port
#[async_trait]
pub trait CompletionPort: Send + Sync {
    /// 提供方名称（用于状态接口和日志）
    fn provider_name(&self) -> &str;

    /// 模型名称
    fn model(&self) -> &str;

    /// 在打开任何流之前检查凭证能否构成合法请求
    fn validate_credential(&self, _api_key: &SecretString) -> Result<(), CompletionError> {
        Ok(())
    }

    /// 非流式补全，一次返回完整文本
    async fn complete(
        &self,
        api_key: &SecretString,
        request: CompletionRequest,
    ) -> Result<String, CompletionError>;

    /// 流式补全
    ///
    /// 返回 Err 表示建立流失败（尚未产出任何增量）；
    /// 流中的 Err 表示传输途中中断
    async fn stream(
        &self,
        api_key: &SecretString,
        request: CompletionRequest,
    ) -> Result<DeltaStream, CompletionError>;
}
