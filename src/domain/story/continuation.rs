//! 续写辅助：下一章章节号、前文摘要、默认写作方向

use std::num::NonZeroU32;

use super::entities::{Chapter, Story};
use crate::domain::generation::GenerationRequest;
use crate::domain::text::truncate_chars;

/// 摘要中每章保留的字符数
pub const SUMMARY_EXCERPT_CHARS: usize = 200;

/// 下一章章节号 = 已有章节数 + 1
pub fn next_chapter_number(story: &Story) -> NonZeroU32 {
    let count = u32::try_from(story.chapters.len()).unwrap_or(u32::MAX - 1);
    NonZeroU32::MIN.saturating_add(count)
}

/// `Chapter N: <前 200 字>...`，每章一行；没有章节时为 None
pub fn previous_chapters_summary(chapters: &[Chapter]) -> Option<String> {
    if chapters.is_empty() {
        return None;
    }
    let summary = chapters
        .iter()
        .map(|ch| {
            format!(
                "Chapter {}: {}...",
                ch.chapter_number,
                truncate_chars(&ch.content, SUMMARY_EXCERPT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    Some(summary)
}

/// 未给出写作方向时的默认提示
pub fn default_prompt(story: &Story, chapter_number: NonZeroU32) -> String {
    if chapter_number.get() == 1 {
        format!(
            "Begin the story by introducing {} in {}. Set up the main conflict or adventure.",
            story.characters, story.setting
        )
    } else {
        format!(
            "Continue the story from where chapter {} left off. Advance the plot and develop the characters further.",
            chapter_number.get() - 1
        )
    }
}

impl Story {
    /// 为下一章构建生成请求
    pub fn next_generation_request(&self, prompt: Option<String>) -> GenerationRequest {
        let chapter_number = next_chapter_number(self);
        let prompt = prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| default_prompt(self, chapter_number));
        GenerationRequest::new(
            prompt,
            self.genre.clone(),
            self.characters.clone(),
            self.setting.clone(),
            chapter_number,
        )
        .with_language(self.language.clone())
        .with_previous_chapters(previous_chapters_summary(&self.chapters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::story::{NewChapter, NewStory};
    use chrono::Utc;

    fn story_with(chapters: &[&str]) -> Story {
        let mut story = Story::create(
            NewStory {
                title: "T".into(),
                genre: "Fantasy".into(),
                characters: "Ada".into(),
                setting: "Ironwood".into(),
                language: Some("es".into()),
                ..Default::default()
            },
            Utc::now(),
        );
        for (i, content) in chapters.iter().enumerate() {
            story.push_chapter(Chapter::create(
                NewChapter {
                    title: format!("Chapter {}", i + 1),
                    content: content.to_string(),
                    chapter_number: i as u32 + 1,
                },
                Utc::now(),
            ));
        }
        story
    }

    #[test]
    fn test_first_chapter_request() {
        let req = story_with(&[]).next_generation_request(None);
        assert_eq!(req.chapter_number.get(), 1);
        assert!(req.prompt.starts_with("Begin the story by introducing Ada in Ironwood."));
        assert!(req.previous_chapters_summary.is_none());
        assert_eq!(req.language_code, "es");
    }

    #[test]
    fn test_continuation_request_summarises_previous_chapters() {
        let long = "x".repeat(300);
        let req = story_with(&["short one", &long]).next_generation_request(Some("  ".into()));
        assert_eq!(req.chapter_number.get(), 3);
        assert!(req.prompt.starts_with("Continue the story from where chapter 2 left off."));

        let summary = req.previous_chapters_summary.unwrap();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "Chapter 1: short one...");
        assert_eq!(lines[1], format!("Chapter 2: {}...", "x".repeat(200)));
    }

    #[test]
    fn test_explicit_prompt_is_kept() {
        let req = story_with(&["a"]).next_generation_request(Some("Storm the keep".into()));
        assert_eq!(req.prompt, "Storm the keep");
    }
}
