//! Story Store Port - 故事持久化端口
//!
//! 具体实现在 infrastructure 层（目前为内存实现）

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::story::{Chapter, NewChapter, NewStory, Story, StoryPatch};

/// Store 错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Story not found: {0}")]
    NotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Story Store Port
#[async_trait]
pub trait StoryStorePort: Send + Sync {
    /// 全部故事，按创建时间倒序，章节按章节号升序
    async fn list_stories(&self) -> Result<Vec<Story>, StoreError>;

    async fn get_story(&self, id: Uuid) -> Result<Story, StoreError>;

    async fn create_story(&self, fields: NewStory) -> Result<Story, StoreError>;

    async fn update_story(&self, id: Uuid, patch: StoryPatch) -> Result<Story, StoreError>;

    async fn create_chapter(&self, story_id: Uuid, chapter: NewChapter)
        -> Result<Chapter, StoreError>;

    /// 删除故事及其全部章节
    async fn delete_story(&self, id: Uuid) -> Result<(), StoreError>;
}
