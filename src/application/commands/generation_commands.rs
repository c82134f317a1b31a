//! Generation Commands
//!
//! 字段保持请求体的原始形态（可缺失），校验在 handler 中完成。

/// 生成章节命令
#[derive(Debug, Clone, Default)]
pub struct GenerateChapter {
    pub prompt: Option<String>,
    pub genre: Option<String>,
    pub characters: Option<String>,
    pub setting: Option<String>,
    /// 缺省为 1
    pub chapter_number: Option<u32>,
    pub previous_chapters: Option<String>,
    pub language: Option<String>,
}

/// 生成书名命令
#[derive(Debug, Clone, Default)]
pub struct GenerateTitle {
    pub genre: Option<String>,
    pub characters: Option<String>,
    pub setting: Option<String>,
    pub theme: Option<String>,
}
