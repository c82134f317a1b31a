//! Data Transfer Objects
//!
//! 请求体字段使用 camelCase；必填字段声明为 Option，由处理器统一校验

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::application::{GenerateChapter, GenerateTitle, TitleResult};
use crate::infrastructure::http::error::ApiError;

// ============================================================================
// JSON 提取
// ============================================================================

/// JSON 请求体；任何解析失败都返回 400 `{error}`
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

// ============================================================================
// Generation DTOs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateChapterRequest {
    pub prompt: Option<String>,
    pub genre: Option<String>,
    pub characters: Option<String>,
    pub setting: Option<String>,
    pub chapter_number: Option<u32>,
    pub previous_chapters: Option<String>,
    pub language: Option<String>,
}

impl From<GenerateChapterRequest> for GenerateChapter {
    fn from(req: GenerateChapterRequest) -> Self {
        GenerateChapter {
            prompt: req.prompt,
            genre: req.genre,
            characters: req.characters,
            setting: req.setting,
            chapter_number: req.chapter_number,
            previous_chapters: req.previous_chapters,
            language: req.language,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTitleRequest {
    pub genre: Option<String>,
    pub characters: Option<String>,
    pub setting: Option<String>,
    pub theme: Option<String>,
}

impl From<GenerateTitleRequest> for GenerateTitle {
    fn from(req: GenerateTitleRequest) -> Self {
        GenerateTitle {
            genre: req.genre,
            characters: req.characters,
            setting: req.setting,
            theme: req.theme,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleResponse {
    pub title: String,
    #[serde(rename = "isAIGenerated")]
    pub is_ai_generated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<TitleResult> for TitleResponse {
    fn from(result: TitleResult) -> Self {
        Self {
            title: result.title,
            is_ai_generated: result.is_ai_generated,
            message: result.message,
        }
    }
}
