//! Command Handlers

mod generation_handlers;
mod story_handlers;

pub use generation_handlers::{
    GenerateChapterHandler, GenerateTitleHandler, GenerationOutcome, TitleResult,
    MISSING_FIELDS_MESSAGE,
};
pub use story_handlers::{
    CreateChapterHandler, CreateStoryHandler, DeleteStoryHandler, UpdateStoryHandler,
};
