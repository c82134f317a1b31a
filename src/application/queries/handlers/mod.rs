//! Query Handlers

mod status_handlers;
mod story_handlers;

pub use status_handlers::CheckAiStatusHandler;
pub use story_handlers::{GetStoryHandler, ListStoriesHandler};
