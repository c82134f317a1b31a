//! Story Context - Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::language::DEFAULT_LANGUAGE;

/// 封面渐变色候选
pub const COVER_COLORS: &[&str] = &[
    "from-purple-400 to-pink-400",
    "from-blue-400 to-cyan-400",
    "from-green-400 to-emerald-400",
    "from-orange-400 to-red-400",
    "from-indigo-400 to-purple-400",
    "from-teal-400 to-blue-400",
];

/// 章节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: Uuid,
    pub title: String,
    /// Markdown 正文
    pub content: String,
    pub chapter_number: u32,
    pub created_at: DateTime<Utc>,
}

/// 故事（含章节，按章节号升序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    pub characters: String,
    pub setting: String,
    #[serde(default)]
    pub theme: String,
    pub created_at: DateTime<Utc>,
    pub cover_color: String,
    pub language: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

/// 创建故事的字段
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewStory {
    pub title: String,
    pub genre: String,
    pub characters: String,
    pub setting: String,
    pub theme: String,
    pub cover_color: Option<String>,
    pub language: Option<String>,
}

/// 故事的部分更新
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPatch {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub characters: Option<String>,
    pub setting: Option<String>,
    pub theme: Option<String>,
    pub cover_color: Option<String>,
    pub language: Option<String>,
}

impl StoryPatch {
    pub fn is_empty(&self) -> bool {
        self == &StoryPatch::default()
    }
}

/// 新章节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChapter {
    /// 为空时使用 "Chapter N"
    #[serde(default)]
    pub title: String,
    pub content: String,
    pub chapter_number: u32,
}

impl Story {
    /// 由创建字段构建故事；未指定封面色时使用第一个候选
    pub fn create(fields: NewStory, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: fields.title,
            genre: fields.genre,
            characters: fields.characters,
            setting: fields.setting,
            theme: fields.theme,
            created_at: now,
            cover_color: fields
                .cover_color
                .unwrap_or_else(|| COVER_COLORS[0].to_string()),
            language: fields
                .language
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            chapters: Vec::new(),
        }
    }

    /// 应用部分更新
    pub fn apply(&mut self, patch: StoryPatch) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.genre {
            self.genre = v;
        }
        if let Some(v) = patch.characters {
            self.characters = v;
        }
        if let Some(v) = patch.setting {
            self.setting = v;
        }
        if let Some(v) = patch.theme {
            self.theme = v;
        }
        if let Some(v) = patch.cover_color {
            self.cover_color = v;
        }
        if let Some(v) = patch.language {
            self.language = v;
        }
    }

    /// 追加章节并保持章节号升序
    pub fn push_chapter(&mut self, chapter: Chapter) {
        let pos = self
            .chapters
            .partition_point(|c| c.chapter_number <= chapter.chapter_number);
        self.chapters.insert(pos, chapter);
    }
}

impl Chapter {
    pub fn create(fields: NewChapter, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: fields.title,
            content: fields.content,
            chapter_number: fields.chapter_number,
            created_at: now,
        }
    }
}
