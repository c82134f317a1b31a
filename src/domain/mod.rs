//! Domain Layer - 领域层
//!
//! - generation: 章节生成协议（请求、事件、SSE 帧、提示词、失败分类）
//! - story: 故事与章节
//! - language: 语言解析
//! - template: 模板章节（AI 不可用时的兜底）
//! - title: 兜底书名

pub mod generation;
pub mod language;
pub mod story;
pub mod template;
pub mod text;
pub mod title;

pub use language::{Language, DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES};
pub use template::template_chapter_for;
pub use text::word_count;
