//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：AI 状态、故事读取

mod status_queries;
mod story_queries;

pub mod handlers;

pub use status_queries::*;
pub use story_queries::*;
