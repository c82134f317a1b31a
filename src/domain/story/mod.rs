//! Story Context - 故事与章节
//!
//! 持久化由 Story Store 端口负责，生成核心只读取故事、产出候选章节内容。

mod continuation;
mod entities;

pub use continuation::{default_prompt, next_chapter_number, previous_chapters_summary, SUMMARY_EXCERPT_CHARS};
pub use entities::{Chapter, NewChapter, NewStory, Story, StoryPatch, COVER_COLORS};
