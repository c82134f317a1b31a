//! DeepSeek Client - OpenAI 兼容的 chat completions 客户端
//!
//! 实现 CompletionPort trait
//!
//! 上游 API:
//! POST {base_url}/chat/completions
//! Request: {"model", "messages", "max_tokens", "temperature", "stream"}
//! Streaming response: `data: {"choices":[{"delta":{"content":"..."}}]}` 帧，`data: [DONE]` 结束

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, BoxStream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::application::ports::{CompletionError, CompletionPort, CompletionRequest, DeltaStream};
use crate::domain::generation::FrameDecoder;
use crate::domain::text::truncate_chars;

/// 错误响应体保留的最大字符数
const ERROR_BODY_MAX_CHARS: usize = 300;

/// 流结束标记
const DONE_MARKER: &str = "[DONE]";

// ============================================================================
// Wire structs
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct ResponseChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// DeepSeek 客户端配置
#[derive(Debug, Clone)]
pub struct DeepSeekClientConfig {
    /// API 基础 URL（不含 `/chat/completions`）
    pub base_url: String,
    /// 模型名称
    pub model: String,
    /// 提供方显示名称
    pub provider_name: String,
    /// 非流式请求超时（秒）
    pub timeout_secs: u64,
    /// 连接超时（秒）
    pub connect_timeout_secs: u64,
}

impl Default for DeepSeekClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            provider_name: "DeepSeek".to_string(),
            timeout_secs: 60,
            connect_timeout_secs: 5,
        }
    }
}

impl DeepSeekClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// DeepSeek 客户端
pub struct DeepSeekClient {
    client: Client,
    config: DeepSeekClientConfig,
}

impl DeepSeekClient {
    /// 创建客户端；流式请求的总时长由调用方控制，这里只限制连接时间
    pub fn new(config: DeepSeekClientConfig) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|e| CompletionError::Network(format!("http client build failed: {}", e)))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn auth_header(api_key: &SecretString) -> Result<HeaderValue, CompletionError> {
        let key = api_key.expose_secret().trim();
        if key.is_empty() {
            return Err(CompletionError::InvalidCredential);
        }
        let mut value = HeaderValue::from_str(&format!("Bearer {}", key))
            .map_err(|_| CompletionError::InvalidCredential)?;
        value.set_sensitive(true);
        Ok(value)
    }

    fn payload<'a>(&'a self, request: &'a CompletionRequest, stream: bool) -> ChatCompletionRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });
        ChatCompletionRequest {
            model: &self.config.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream,
        }
    }

    async fn send(
        &self,
        api_key: &SecretString,
        request: &CompletionRequest,
        stream: bool,
    ) -> Result<reqwest::Response, CompletionError> {
        let auth = Self::auth_header(api_key)?;
        let mut builder = self
            .client
            .post(self.completions_url())
            .header(AUTHORIZATION, auth)
            .json(&self.payload(request, stream));
        if stream {
            builder = builder.header("Accept", "text/event-stream");
        } else {
            builder = builder.timeout(Duration::from_secs(self.config.timeout_secs));
        }

        tracing::debug!(
            url = %self.completions_url(),
            model = %self.config.model,
            stream = stream,
            max_tokens = request.max_tokens,
            "Sending completion request"
        );

        let response = builder.send().await.map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, retry_after, &body));
        }
        Ok(response)
    }
}

#[async_trait]
impl CompletionPort for DeepSeekClient {
    fn provider_name(&self) -> &str {
        &self.config.provider_name
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn validate_credential(&self, api_key: &SecretString) -> Result<(), CompletionError> {
        Self::auth_header(api_key).map(|_| ())
    }

    async fn complete(
        &self,
        api_key: &SecretString,
        request: CompletionRequest,
    ) -> Result<String, CompletionError> {
        let response = self.send(api_key, &request, false).await?;
        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(format!("json decode error: {}", e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CompletionError::InvalidResponse("no choices in response".into()))?;

        tracing::info!(chars = text.len(), "Completion received");
        Ok(text)
    }

    async fn stream(
        &self,
        api_key: &SecretString,
        request: CompletionRequest,
    ) -> Result<DeltaStream, CompletionError> {
        let response = self.send(api_key, &request, true).await?;
        Ok(delta_stream(response.bytes_stream().boxed()))
    }
}

// ============================================================================
// SSE → deltas
// ============================================================================

struct DeltaState {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: FrameDecoder,
    pending: VecDeque<Result<String, CompletionError>>,
    done: bool,
}

impl DeltaState {
    /// 处理一帧的 data；返回 false 表示流已结束
    fn accept(&mut self, data: &str) -> bool {
        let data = data.trim();
        if data == DONE_MARKER {
            self.done = true;
            return false;
        }
        match serde_json::from_str::<ChatCompletionChunk>(data) {
            Ok(chunk) => {
                for choice in chunk.choices {
                    if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                        self.pending.push_back(Ok(content));
                    }
                }
                true
            }
            Err(e) => {
                self.pending.push_back(Err(CompletionError::InvalidResponse(format!(
                    "malformed stream chunk: {}",
                    e
                ))));
                self.done = true;
                false
            }
        }
    }
}

fn delta_stream(body: BoxStream<'static, reqwest::Result<Bytes>>) -> DeltaStream {
    let state = DeltaState {
        body,
        decoder: FrameDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.done {
                return None;
            }
            match st.body.next().await {
                Some(Ok(chunk)) => {
                    for frame in st.decoder.feed(&chunk) {
                        if !st.accept(&frame.data) {
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    st.done = true;
                    st.pending.push_back(Err(CompletionError::Network(e.to_string())));
                }
                None => {
                    if let Some(frame) = st.decoder.finish() {
                        st.accept(&frame.data);
                    }
                    st.done = true;
                }
            }
        }
    })
    .boxed()
}

// ============================================================================
// Error mapping
// ============================================================================

fn map_send_error(e: reqwest::Error) -> CompletionError {
    if e.is_timeout() {
        CompletionError::Timeout
    } else if e.is_connect() {
        CompletionError::Unavailable
    } else {
        CompletionError::Network(e.to_string())
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

fn map_http_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> CompletionError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited { retry_after },
        s if s.is_server_error() => CompletionError::Unavailable,
        s => CompletionError::Provider {
            status: s.as_u16(),
            message: truncate_chars(body, ERROR_BODY_MAX_CHARS).to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(base: &str) -> DeepSeekClient {
        DeepSeekClient::new(DeepSeekClientConfig::new(base)).unwrap()
    }

    fn key() -> SecretString {
        SecretString::new("sk-test".into())
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("Write chapter one", 800, 0.7).with_system("You are a storyteller")
    }

    fn sse(chunks: &[&str]) -> String {
        let mut body = String::new();
        for c in chunks {
            let data = json!({"choices": [{"delta": {"content": c}}]});
            body.push_str(&format!("data: {}\n\n", data));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    #[tokio::test]
    async fn test_stream_parses_deltas_until_done() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .json_body_partial(r#"{"model":"deepseek-chat","stream":true,"max_tokens":800}"#);
                then.status(200)
                    .header("content-type", "text/event-stream")
                    .body(format!(": keep-alive\n\n{}", sse(&["Once ", "upon ", "a ", "time."])));
            })
            .await;

        let deltas: Vec<_> = client(&server.base_url())
            .stream(&key(), request())
            .await
            .unwrap()
            .collect()
            .await;

        mock.assert_async().await;
        let texts: Vec<String> = deltas.into_iter().map(Result::unwrap).collect();
        assert_eq!(texts, ["Once ", "upon ", "a ", "time."]);
    }

    #[tokio::test]
    async fn test_malformed_chunk_ends_stream_with_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200)
                    .header("content-type", "text/event-stream")
                    .body("data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: {oops\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"never\"}}]}\n\n");
            })
            .await;

        let deltas: Vec<_> = client(&server.base_url())
            .stream(&key(), request())
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0], Ok("Hi".to_string()));
        assert!(matches!(deltas[1], Err(CompletionError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_complete_returns_message_content() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .json_body_partial(r#"{"stream":false}"#);
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "The Ember Crown"}}]
                }));
            })
            .await;

        let text = client(&server.base_url())
            .complete(&key(), request())
            .await
            .unwrap();
        assert_eq!(text, "The Ember Crown");
    }

    #[tokio::test]
    async fn test_429_with_retry_after() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429).header("Retry-After", "7").body("slow down");
            })
            .await;

        let err = client(&server.base_url())
            .stream(&key(), request())
            .await
            .err()
            .unwrap();
        assert_eq!(err, CompletionError::RateLimited { retry_after: Some(7) });
    }

    #[tokio::test]
    async fn test_5xx_maps_to_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(503).body("maintenance");
            })
            .await;

        let err = client(&server.base_url())
            .complete(&key(), request())
            .await
            .unwrap_err();
        assert_eq!(err, CompletionError::Unavailable);
    }

    #[tokio::test]
    async fn test_4xx_body_is_truncated() {
        let server = MockServer::start_async().await;
        let long = "x".repeat(1000);
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(401).body(long.as_str());
            })
            .await;

        match client(&server.base_url()).complete(&key(), request()).await {
            Err(CompletionError::Provider { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message.chars().count(), ERROR_BODY_MAX_CHARS);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_credential_must_form_a_header() {
        let client = client("http://localhost:1");
        assert!(client.validate_credential(&key()).is_ok());
        assert_eq!(
            client.validate_credential(&SecretString::new("bad\nkey".into())),
            Err(CompletionError::InvalidCredential)
        );
        assert_eq!(
            client.validate_credential(&SecretString::new("  ".into())),
            Err(CompletionError::InvalidCredential)
        );
    }
}
