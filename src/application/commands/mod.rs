//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：章节生成、书名生成、故事写入

mod generation_commands;
mod story_commands;

pub mod handlers;

pub use generation_commands::*;
pub use story_commands::*;
