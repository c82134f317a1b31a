//! Story Commands

use uuid::Uuid;

use crate::domain::story::{NewChapter, NewStory, StoryPatch};

/// 创建故事命令
#[derive(Debug, Clone)]
pub struct CreateStory {
    pub fields: NewStory,
}

/// 更新故事命令
#[derive(Debug, Clone)]
pub struct UpdateStory {
    pub story_id: Uuid,
    pub patch: StoryPatch,
}

/// 删除故事命令（连同章节）
#[derive(Debug, Clone)]
pub struct DeleteStory {
    pub story_id: Uuid,
}

/// 新增章节命令
#[derive(Debug, Clone)]
pub struct CreateChapter {
    pub story_id: Uuid,
    pub chapter: NewChapter,
}
