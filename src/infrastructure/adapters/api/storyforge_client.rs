//! Storyforge HTTP Client - 客户端到生成服务的 HTTP 传输
//!
//! 实现 GenerationTransportPort，供 CLI 和草稿控制器使用
//!
//! 服务端 API:
//! POST {base}/api/generate-chapter   → text/event-stream 或 application/json
//! GET  {base}/api/check-ai-status
//! POST {base}/api/generate-title
//! GET  {base}/api/stories/{id}
//! POST {base}/api/stories/{id}/chapters

use async_trait::async_trait;
use futures_util::StreamExt;
use http::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use uuid::Uuid;

use crate::application::ports::{GenerationResponse, GenerationTransportPort, TransportError};
use crate::application::queries::AiStatus;
use crate::domain::generation::GenerationRequest;
use crate::domain::story::{Chapter, NewChapter, Story};
use crate::infrastructure::http::dto::TitleResponse;
use crate::infrastructure::http::error::ErrorResponse;

/// 客户端配置
#[derive(Debug, Clone)]
pub struct StoryforgeClientConfig {
    /// 服务基础 URL
    pub base_url: String,
    /// 非流式请求超时（秒）；流式请求只受连接超时约束
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for StoryforgeClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}

impl StoryforgeClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Storyforge HTTP 客户端
pub struct StoryforgeClient {
    client: Client,
    config: StoryforgeClientConfig,
}

impl StoryforgeClient {
    pub fn new(config: StoryforgeClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// 获取故事（含章节）
    pub async fn get_story(&self, id: Uuid) -> Result<Story, TransportError> {
        let response = self
            .client
            .get(self.url(&format!("/api/stories/{id}")))
            .timeout(self.timeout())
            .send()
            .await
            .map_err(map_send_error)?;
        read_json(response).await
    }

    /// 保存章节
    pub async fn create_chapter(
        &self,
        story_id: Uuid,
        chapter: &NewChapter,
    ) -> Result<Chapter, TransportError> {
        let response = self
            .client
            .post(self.url(&format!("/api/stories/{story_id}/chapters")))
            .timeout(self.timeout())
            .json(chapter)
            .send()
            .await
            .map_err(map_send_error)?;
        read_json(response).await
    }

    /// 生成书名
    pub async fn generate_title(
        &self,
        genre: &str,
        characters: &str,
        setting: &str,
        theme: Option<&str>,
    ) -> Result<TitleResponse, TransportError> {
        let body = serde_json::json!({
            "genre": genre,
            "characters": characters,
            "setting": setting,
            "theme": theme,
        });
        let response = self
            .client
            .post(self.url("/api/generate-title"))
            .timeout(self.timeout())
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;
        read_json(response).await
    }
}

#[async_trait]
impl GenerationTransportPort for StoryforgeClient {
    async fn open(&self, request: &GenerationRequest) -> Result<GenerationResponse, TransportError> {
        tracing::debug!(
            url = %self.url("/api/generate-chapter"),
            chapter_number = request.chapter_number.get(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(self.url("/api/generate-chapter"))
            .header(ACCEPT, "text/event-stream, application/json")
            .json(request)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Interrupted(e.to_string())));

        GenerationResponse::from_parts(status, content_type.as_deref(), body).await
    }

    async fn check_ai_status(&self) -> Result<AiStatus, TransportError> {
        let response = self
            .client
            .get(self.url("/api/check-ai-status"))
            .timeout(self.timeout())
            .send()
            .await
            .map_err(map_send_error)?;
        read_json(response).await
    }
}

fn map_send_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Network(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        TransportError::Network(format!("Cannot connect to storyforge service: {e}"))
    } else {
        TransportError::Network(e.to_string())
    }
}

/// 读取 JSON 响应；非 2xx 时取 `{error}` 作为消息
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| TransportError::Interrupted(e.to_string()))?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorResponse>(&bytes)
            .map(|b| b.error)
            .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
        return Err(TransportError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice(&bytes).map_err(|e| TransportError::InvalidResponse(e.to_string()))
}
