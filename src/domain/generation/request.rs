//! Generation Request

use std::num::NonZeroU32;

use serde::Serialize;

use crate::domain::language::{Language, DEFAULT_LANGUAGE};
use crate::domain::text::truncate_chars;

/// 章节生成请求
///
/// 校验在应用层完成，这里只承载已经合法的数据。
/// 序列化格式与 `POST /api/generate-chapter` 的请求体一致。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// 本章写作方向
    pub prompt: String,
    pub genre: String,
    /// 主要角色（自由文本）
    pub characters: String,
    pub setting: String,
    /// 章节号，从 1 开始
    pub chapter_number: NonZeroU32,
    /// 前文摘要（已截断）
    #[serde(rename = "previousChapters", skip_serializing_if = "Option::is_none")]
    pub previous_chapters_summary: Option<String>,
    /// 语言代码
    #[serde(rename = "language")]
    pub language_code: String,
}

impl GenerationRequest {
    pub fn new(
        prompt: impl Into<String>,
        genre: impl Into<String>,
        characters: impl Into<String>,
        setting: impl Into<String>,
        chapter_number: NonZeroU32,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            genre: genre.into(),
            characters: characters.into(),
            setting: setting.into(),
            chapter_number,
            previous_chapters_summary: None,
            language_code: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn with_language(mut self, code: impl Into<String>) -> Self {
        self.language_code = code.into();
        self
    }

    /// 设置前文摘要；空白摘要视为无
    pub fn with_previous_chapters(mut self, summary: Option<String>) -> Self {
        self.previous_chapters_summary = summary.filter(|s| !s.trim().is_empty());
        self
    }

    /// 将前文摘要截断到 `max_chars` 个字符
    pub fn truncate_summary(mut self, max_chars: usize) -> Self {
        if let Some(summary) = self.previous_chapters_summary.as_mut() {
            let cut = truncate_chars(summary, max_chars).len();
            summary.truncate(cut);
        }
        self
    }

    /// 解析后的语言
    pub fn language(&self) -> &'static Language {
        Language::resolve(&self.language_code)
    }
}
