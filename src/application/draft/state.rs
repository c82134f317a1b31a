//! Draft State

use serde::Serialize;

use crate::domain::generation::GenerationEvent;
use crate::domain::story::NewChapter;
use crate::domain::text::word_count;

/// 草稿状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Complete,
    Failed,
}

impl DraftStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DraftStatus::Complete | DraftStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Idle => "idle",
            DraftStatus::Connecting => "connecting",
            DraftStatus::Streaming => "streaming",
            DraftStatus::Complete => "complete",
            DraftStatus::Failed => "failed",
        }
    }
}

/// 章节草稿（客户端、临时）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDraft {
    /// 累计文本
    pub text: String,
    /// 始终由 `text` 重新计算
    pub word_count: usize,
    pub status: DraftStatus,
    pub cancelled: bool,
    /// 最近一条提示或错误消息
    pub message: Option<String>,
    pub ai_generated: bool,
    /// 语言显示名称
    pub language: Option<String>,
    pub chapter_number: Option<u32>,
}

impl ChapterDraft {
    /// 开始新一轮生成
    pub fn begin(&mut self) {
        *self = ChapterDraft {
            status: DraftStatus::Connecting,
            ..Default::default()
        };
    }

    /// 归约一个事件；终止或取消之后的事件被忽略。返回状态是否改变
    pub fn apply(&mut self, event: &GenerationEvent) -> bool {
        if self.cancelled || self.status.is_terminal() {
            return false;
        }

        match event {
            GenerationEvent::Connected(_) => {
                if self.status != DraftStatus::Idle {
                    return false;
                }
                self.status = DraftStatus::Connecting;
            }
            GenerationEvent::Start(p) => {
                self.status = DraftStatus::Streaming;
                self.set_text(String::new());
                self.chapter_number = Some(p.chapter_number);
                if !p.language.is_empty() {
                    self.language = Some(p.language.clone());
                }
            }
            GenerationEvent::Text(p) => {
                // fullContent 是权威值，丢帧不影响结果
                self.status = DraftStatus::Streaming;
                self.set_text(p.full_content.clone());
                if self.language.is_none() && !p.language.is_empty() {
                    self.language = Some(p.language.clone());
                }
            }
            GenerationEvent::Complete(p) => {
                self.status = DraftStatus::Complete;
                self.set_text(p.full_content.clone());
                self.ai_generated = p.is_ai_generated;
            }
            GenerationEvent::Error(p) => {
                self.status = DraftStatus::Failed;
                if let Some(fallback) = p.fallback.as_ref().filter(|f| !f.trim().is_empty()) {
                    self.set_text(fallback.clone());
                }
                self.message = Some(p.error.clone());
                self.ai_generated = false;
            }
        }
        true
    }

    /// 取消：幂等，终止之后无效果。返回状态是否改变
    pub fn cancel(&mut self) -> bool {
        if self.cancelled || self.status.is_terminal() {
            return false;
        }
        self.status = DraftStatus::Idle;
        self.set_text(String::new());
        self.cancelled = true;
        self.message = Some("Generation cancelled".to_string());
        true
    }

    pub fn reset(&mut self) {
        *self = ChapterDraft::default();
    }

    /// 替换文本并重新计算字数
    pub fn set_text(&mut self, text: String) {
        self.word_count = word_count(&text);
        self.text = text;
    }

    /// 生成结束且文本非空时转换为新章节
    pub fn to_new_chapter(&self, chapter_number: u32) -> Option<NewChapter> {
        if !self.status.is_terminal() || self.text.trim().is_empty() {
            return None;
        }
        let chapter_number = self.chapter_number.unwrap_or(chapter_number);
        Some(NewChapter {
            title: format!("Chapter {}", chapter_number),
            content: self.text.clone(),
            chapter_number,
        })
    }
}
