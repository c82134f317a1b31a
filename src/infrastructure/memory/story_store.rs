//! In-Memory Story Store Implementation

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::application::ports::{StoreError, StoryStorePort};
use crate::domain::story::{Chapter, NewChapter, NewStory, Story, StoryPatch};

/// 内存故事存储
///
/// 章节随故事一起保存，删除故事即删除其全部章节。
pub struct InMemoryStoryStore {
    stories: DashMap<Uuid, Story>,
}

impl InMemoryStoryStore {
    pub fn new() -> Self {
        Self {
            stories: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }
}

impl Default for InMemoryStoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoryStorePort for InMemoryStoryStore {
    async fn list_stories(&self) -> Result<Vec<Story>, StoreError> {
        let mut stories: Vec<Story> = self.stories.iter().map(|s| s.value().clone()).collect();
        stories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(stories)
    }

    async fn get_story(&self, id: Uuid) -> Result<Story, StoreError> {
        self.stories
            .get(&id)
            .map(|s| s.clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn create_story(&self, fields: NewStory) -> Result<Story, StoreError> {
        let story = Story::create(fields, Utc::now());
        self.stories.insert(story.id, story.clone());
        tracing::debug!(story_id = %story.id, "Story stored");
        Ok(story)
    }

    async fn update_story(&self, id: Uuid, patch: StoryPatch) -> Result<Story, StoreError> {
        let mut story = self.stories.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        story.apply(patch);
        Ok(story.clone())
    }

    async fn create_chapter(
        &self,
        story_id: Uuid,
        chapter: NewChapter,
    ) -> Result<Chapter, StoreError> {
        let mut story = self
            .stories
            .get_mut(&story_id)
            .ok_or(StoreError::NotFound(story_id))?;
        let chapter = Chapter::create(chapter, Utc::now());
        story.push_chapter(chapter.clone());
        tracing::debug!(
            story_id = %story_id,
            chapter_id = %chapter.id,
            chapters = story.chapters.len(),
            "Chapter stored"
        );
        Ok(chapter)
    }

    async fn delete_story(&self, id: Uuid) -> Result<(), StoreError> {
        self.stories
            .remove(&id)
            .map(|(_, story)| {
                tracing::debug!(story_id = %id, chapters = story.chapters.len(), "Story removed");
            })
            .ok_or(StoreError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(title: &str) -> NewStory {
        NewStory {
            title: title.into(),
            genre: "Fantasy".into(),
            characters: "Ada".into(),
            setting: "Ironwood".into(),
            ..Default::default()
        }
    }

    fn chapter(n: u32) -> NewChapter {
        NewChapter {
            title: format!("Chapter {n}"),
            content: format!("Content {n}"),
            chapter_number: n,
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = InMemoryStoryStore::new();
        let first = store.create_story(fields("First")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.create_story(fields("Second")).await.unwrap();

        let ids: Vec<Uuid> = store.list_stories().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_chapters_stay_ordered_by_number() {
        let store = InMemoryStoryStore::new();
        let story = store.create_story(fields("Saga")).await.unwrap();
        for n in [2, 1, 3] {
            store.create_chapter(story.id, chapter(n)).await.unwrap();
        }

        let numbers: Vec<u32> = store
            .get_story(story.id)
            .await
            .unwrap()
            .chapters
            .iter()
            .map(|c| c.chapter_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_update_applies_patch() {
        let store = InMemoryStoryStore::new();
        let story = store.create_story(fields("Draft")).await.unwrap();
        let updated = store
            .update_story(
                story.id,
                StoryPatch {
                    title: Some("Final".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.genre, "Fantasy");
    }

    #[tokio::test]
    async fn test_delete_removes_story_and_chapters() {
        let store = InMemoryStoryStore::new();
        let story = store.create_story(fields("Gone")).await.unwrap();
        store.create_chapter(story.id, chapter(1)).await.unwrap();

        store.delete_story(story.id).await.unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.get_story(story.id).await,
            Err(StoreError::NotFound(id)) if id == story.id
        ));
        assert!(store.delete_story(story.id).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_story_is_not_found() {
        let store = InMemoryStoryStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.create_chapter(id, chapter(1)).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.update_story(id, StoryPatch::default()).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
