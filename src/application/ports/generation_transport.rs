//! Generation Transport Port - 客户端到生成服务的传输抽象
//!
//! 服务端对一次生成请求有两种回答：
//! - `text/event-stream`：SSE 字节流
//! - `application/json`：一次性返回的章节文档（AI 不可用或流开始前失败）

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::queries::AiStatus;
use crate::domain::generation::GenerationRequest;

/// 传输错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Stream interrupted: {0}")]
    Interrupted(String),
}

/// 一次性返回的章节文档
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDocument {
    pub content: String,
    #[serde(rename = "isAIGenerated", default)]
    pub is_ai_generated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// SSE 原始字节流
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// 服务端回答
pub enum GenerationResponse {
    Stream(ByteStream),
    Document(ChapterDocument),
}

impl std::fmt::Debug for GenerationResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationResponse::Stream(_) => f.write_str("GenerationResponse::Stream(..)"),
            GenerationResponse::Document(doc) => {
                f.debug_tuple("GenerationResponse::Document").field(doc).finish()
            }
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl GenerationResponse {
    /// 根据状态码和 Content-Type 解释响应体
    pub async fn from_parts<S>(
        status: u16,
        content_type: Option<&str>,
        body: S,
    ) -> Result<Self, TransportError>
    where
        S: Stream<Item = Result<Bytes, TransportError>> + Send + 'static,
    {
        let is_event_stream = content_type
            .map(|ct| ct.trim_start().starts_with("text/event-stream"))
            .unwrap_or(false);

        if (200..300).contains(&status) && is_event_stream {
            return Ok(GenerationResponse::Stream(body.boxed()));
        }

        let bytes = collect_body(body).await?;

        if !(200..300).contains(&status) {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|b| b.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            return Err(TransportError::Status { status, message });
        }

        let document: ChapterDocument = serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        Ok(GenerationResponse::Document(document))
    }
}

async fn collect_body<S>(body: S) -> Result<Vec<u8>, TransportError>
where
    S: Stream<Item = Result<Bytes, TransportError>> + Send,
{
    futures_util::pin_mut!(body);
    let mut buf = Vec::new();
    while let Some(chunk) = body.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf)
}

/// Generation Transport Port
#[async_trait]
pub trait GenerationTransportPort: Send + Sync {
    /// 提交生成请求，返回流或文档
    async fn open(&self, request: &GenerationRequest) -> Result<GenerationResponse, TransportError>;

    /// 查询 AI 可用性
    async fn check_ai_status(&self) -> Result<AiStatus, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn body(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes, TransportError>> + Send {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn test_event_stream_is_passed_through() {
        let resp = GenerationResponse::from_parts(
            200,
            Some("text/event-stream"),
            body(&["event: connected\n", "data: {}\n\n"]),
        )
        .await
        .unwrap();
        assert!(matches!(resp, GenerationResponse::Stream(_)));
    }

    #[tokio::test]
    async fn test_json_document_is_collected() {
        let resp = GenerationResponse::from_parts(
            200,
            Some("application/json"),
            body(&[r#"{"content":"Chapter","#, r#""isAIGenerated":false,"message":"m"}"#]),
        )
        .await
        .unwrap();
        match resp {
            GenerationResponse::Document(doc) => {
                assert_eq!(doc.content, "Chapter");
                assert!(!doc.is_ai_generated);
                assert_eq!(doc.message.as_deref(), Some("m"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_carries_server_message() {
        let err = GenerationResponse::from_parts(
            400,
            Some("application/json"),
            body(&[r#"{"error":"Missing required fields"}"#]),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            TransportError::Status {
                status: 400,
                message: "Missing required fields".into()
            }
        );
    }
}
