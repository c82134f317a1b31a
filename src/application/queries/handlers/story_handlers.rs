//! Story Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::StoryStorePort;
use crate::application::queries::{GetStory, ListStories};
use crate::domain::story::Story;

/// GetStory Handler
pub struct GetStoryHandler {
    store: Arc<dyn StoryStorePort>,
}

impl GetStoryHandler {
    pub fn new(store: Arc<dyn StoryStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: GetStory) -> Result<Story, ApplicationError> {
        Ok(self.store.get_story(query.story_id).await?)
    }
}

/// ListStories Handler
pub struct ListStoriesHandler {
    store: Arc<dyn StoryStorePort>,
}

impl ListStoriesHandler {
    pub fn new(store: Arc<dyn StoryStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, _query: ListStories) -> Result<Vec<Story>, ApplicationError> {
        Ok(self.store.list_stories().await?)
    }
}
