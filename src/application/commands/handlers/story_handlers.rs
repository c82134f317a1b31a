//! Story Command Handlers

use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::application::commands::{CreateChapter, CreateStory, DeleteStory, UpdateStory};
use crate::application::error::ApplicationError;
use crate::application::ports::StoryStorePort;
use crate::domain::story::{Chapter, Story, COVER_COLORS};

use super::MISSING_FIELDS_MESSAGE;

// ============================================================================
// CreateStory
// ============================================================================

/// CreateStory Handler
pub struct CreateStoryHandler {
    store: Arc<dyn StoryStorePort>,
}

impl CreateStoryHandler {
    pub fn new(store: Arc<dyn StoryStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, command: CreateStory) -> Result<Story, ApplicationError> {
        let mut fields = command.fields;

        if [&fields.genre, &fields.characters, &fields.setting]
            .iter()
            .any(|v| v.trim().is_empty())
        {
            return Err(ApplicationError::validation(MISSING_FIELDS_MESSAGE));
        }

        if fields.title.trim().is_empty() {
            fields.title = format!("A {} Story", fields.genre);
        }
        if fields.cover_color.is_none() {
            fields.cover_color = COVER_COLORS
                .choose(&mut rand::thread_rng())
                .map(|c| c.to_string());
        }

        let story = self.store.create_story(fields).await?;

        tracing::info!(
            story_id = %story.id,
            title = %story.title,
            language = %story.language,
            "Story created"
        );

        Ok(story)
    }
}

// ============================================================================
// UpdateStory
// ============================================================================

/// UpdateStory Handler
pub struct UpdateStoryHandler {
    store: Arc<dyn StoryStorePort>,
}

impl UpdateStoryHandler {
    pub fn new(store: Arc<dyn StoryStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, command: UpdateStory) -> Result<Story, ApplicationError> {
        if command.patch.is_empty() {
            // 空更新直接返回当前状态
            return Ok(self.store.get_story(command.story_id).await?);
        }

        let story = self
            .store
            .update_story(command.story_id, command.patch)
            .await?;

        tracing::info!(story_id = %story.id, "Story updated");
        Ok(story)
    }
}

// ============================================================================
// DeleteStory
// ============================================================================

/// DeleteStory Handler
pub struct DeleteStoryHandler {
    store: Arc<dyn StoryStorePort>,
}

impl DeleteStoryHandler {
    pub fn new(store: Arc<dyn StoryStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, command: DeleteStory) -> Result<(), ApplicationError> {
        self.store.delete_story(command.story_id).await?;
        tracing::info!(story_id = %command.story_id, "Story deleted");
        Ok(())
    }
}

// ============================================================================
// CreateChapter
// ============================================================================

/// CreateChapter Handler
pub struct CreateChapterHandler {
    store: Arc<dyn StoryStorePort>,
}

impl CreateChapterHandler {
    pub fn new(store: Arc<dyn StoryStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, command: CreateChapter) -> Result<Chapter, ApplicationError> {
        let mut chapter = command.chapter;

        if chapter.chapter_number == 0 {
            return Err(ApplicationError::validation(
                "chapterNumber must be a positive integer",
            ));
        }
        if chapter.content.trim().is_empty() {
            return Err(ApplicationError::validation("Chapter content is empty"));
        }
        if chapter.title.trim().is_empty() {
            chapter.title = format!("Chapter {}", chapter.chapter_number);
        }

        let chapter = self.store.create_chapter(command.story_id, chapter).await?;

        tracing::info!(
            story_id = %command.story_id,
            chapter_number = chapter.chapter_number,
            "Chapter saved"
        );

        Ok(chapter)
    }
}
