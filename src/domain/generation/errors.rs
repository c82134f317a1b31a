//! Generation Context - Errors

use thiserror::Error;

/// 生成失败分类
///
/// 每一种失败最终都落到 AI 文本或带标注的模板文本，用户不会看到空白结果。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// 未配置凭证
    #[error("AI provider credential is not configured")]
    ConfigurationAbsent,

    /// 在产出任何内容之前上游拒绝或网络失败
    #[error("Upstream invocation failed: {0}")]
    UpstreamInvocation(String),

    /// 流在传输途中中断
    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    /// 单帧解码失败
    #[error("Protocol parse error: {0}")]
    ProtocolParse(String),

    /// 完成但没有任何非空白文本
    #[error("Completion was empty")]
    EmptyCompletion,

    /// 超出总时长预算
    #[error("Generation timed out after {0}s")]
    TimedOut(u64),
}

impl GenerationError {
    /// 面向用户的简短说明
    pub fn user_message(&self) -> &'static str {
        match self {
            GenerationError::ConfigurationAbsent => {
                "Template chapter created. Add DeepSeek API key for AI generation."
            }
            GenerationError::UpstreamInvocation(_) | GenerationError::EmptyCompletion => {
                "AI generation failed. Template chapter provided."
            }
            GenerationError::StreamInterrupted(_) => "Streaming failed, using template",
            GenerationError::ProtocolParse(_) => "A malformed update was skipped",
            GenerationError::TimedOut(_) => "AI generation timed out. Template chapter provided.",
        }
    }

    /// 是否已经产出过部分内容（流开始之后的失败）
    pub fn is_mid_stream(&self) -> bool {
        matches!(
            self,
            GenerationError::StreamInterrupted(_) | GenerationError::TimedOut(_)
        )
    }
}

/// 帧到事件的解码错误
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Invalid payload for '{event}': {source}")]
    InvalidPayload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<ProtocolError> for GenerationError {
    fn from(err: ProtocolError) -> Self {
        GenerationError::ProtocolParse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_completion_reads_like_upstream_failure() {
        assert_eq!(
            GenerationError::EmptyCompletion.user_message(),
            GenerationError::UpstreamInvocation("boom".into()).user_message()
        );
    }

    #[test]
    fn test_mid_stream_classification() {
        assert!(GenerationError::TimedOut(60).is_mid_stream());
        assert!(GenerationError::StreamInterrupted("reset".into()).is_mid_stream());
        assert!(!GenerationError::ConfigurationAbsent.is_mid_stream());
    }
}
