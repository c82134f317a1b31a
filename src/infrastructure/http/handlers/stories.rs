//! Story HTTP Handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::{
    CreateChapter, CreateStory, DeleteStory, GetStory, ListStories, UpdateStory,
};
use crate::domain::story::{Chapter, NewChapter, NewStory, Story, StoryPatch};
use crate::infrastructure::http::dto::JsonBody;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 列出所有故事（新的在前）
pub async fn list_stories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Story>>, ApiError> {
    let stories = state.list_stories_handler.handle(ListStories).await?;
    Ok(Json(stories))
}

/// 创建故事
pub async fn create_story(
    State(state): State<Arc<AppState>>,
    JsonBody(fields): JsonBody<NewStory>,
) -> Result<(StatusCode, Json<Story>), ApiError> {
    let story = state
        .create_story_handler
        .handle(CreateStory { fields })
        .await?;
    Ok((StatusCode::CREATED, Json(story)))
}

/// 获取故事详情（含章节）
pub async fn get_story(
    State(state): State<Arc<AppState>>,
    Path(story_id): Path<Uuid>,
) -> Result<Json<Story>, ApiError> {
    let story = state.get_story_handler.handle(GetStory { story_id }).await?;
    Ok(Json(story))
}

/// 更新故事
pub async fn update_story(
    State(state): State<Arc<AppState>>,
    Path(story_id): Path<Uuid>,
    JsonBody(patch): JsonBody<StoryPatch>,
) -> Result<Json<Story>, ApiError> {
    let story = state
        .update_story_handler
        .handle(UpdateStory { story_id, patch })
        .await?;
    Ok(Json(story))
}

/// 删除故事及其章节
pub async fn delete_story(
    State(state): State<Arc<AppState>>,
    Path(story_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .delete_story_handler
        .handle(DeleteStory { story_id })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 保存章节
pub async fn create_chapter(
    State(state): State<Arc<AppState>>,
    Path(story_id): Path<Uuid>,
    JsonBody(chapter): JsonBody<NewChapter>,
) -> Result<(StatusCode, Json<Chapter>), ApiError> {
    let chapter = state
        .create_chapter_handler
        .handle(CreateChapter { story_id, chapter })
        .await?;
    Ok((StatusCode::CREATED, Json(chapter)))
}
