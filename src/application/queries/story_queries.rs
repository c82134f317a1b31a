//! Story Queries

use uuid::Uuid;

/// 获取单个故事（含章节）
#[derive(Debug, Clone)]
pub struct GetStory {
    pub story_id: Uuid,
}

/// 列出全部故事
#[derive(Debug, Clone, Default)]
pub struct ListStories;
