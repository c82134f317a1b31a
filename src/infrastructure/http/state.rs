//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    AvailabilityGate, CompletionPort, GenerationSettings, StoryStorePort,
    // Command handlers
    CreateChapterHandler, CreateStoryHandler, DeleteStoryHandler, GenerateChapterHandler,
    GenerateTitleHandler, UpdateStoryHandler,
    // Query handlers
    CheckAiStatusHandler, GetStoryHandler, ListStoriesHandler,
};

/// 应用状态
pub struct AppState {
    // ========== Command Handlers ==========
    pub generate_chapter_handler: GenerateChapterHandler,
    pub generate_title_handler: GenerateTitleHandler,
    pub create_story_handler: CreateStoryHandler,
    pub update_story_handler: UpdateStoryHandler,
    pub delete_story_handler: DeleteStoryHandler,
    pub create_chapter_handler: CreateChapterHandler,

    // ========== Query Handlers ==========
    pub check_ai_status_handler: CheckAiStatusHandler,
    pub get_story_handler: GetStoryHandler,
    pub list_stories_handler: ListStoriesHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        completion: Arc<dyn CompletionPort>,
        store: Arc<dyn StoryStorePort>,
        gate: AvailabilityGate,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            // Command handlers
            generate_chapter_handler: GenerateChapterHandler::new(
                completion.clone(),
                gate.clone(),
                settings.clone(),
            ),
            generate_title_handler: GenerateTitleHandler::new(
                completion.clone(),
                gate.clone(),
                settings,
            ),
            create_story_handler: CreateStoryHandler::new(store.clone()),
            update_story_handler: UpdateStoryHandler::new(store.clone()),
            delete_story_handler: DeleteStoryHandler::new(store.clone()),
            create_chapter_handler: CreateChapterHandler::new(store.clone()),

            // Query handlers
            check_ai_status_handler: CheckAiStatusHandler::new(completion, gate),
            get_story_handler: GetStoryHandler::new(store.clone()),
            list_stories_handler: ListStoriesHandler::new(store),
        }
    }
}
