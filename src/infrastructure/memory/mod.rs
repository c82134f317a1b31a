//! Memory Layer - In-Memory State Management
//!
//! 实现 StoryStorePort，故事和章节保存在进程内存中

mod story_store;

pub use story_store::InMemoryStoryStore;
