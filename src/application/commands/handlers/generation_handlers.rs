//! Generation Command Handlers

use std::num::NonZeroU32;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::availability::AvailabilityGate;
use crate::application::chapter_stream::{spawn_chapter_stream, GenerationSettings};
use crate::application::commands::{GenerateChapter, GenerateTitle};
use crate::application::error::ApplicationError;
use crate::application::ports::{CompletionPort, CompletionRequest};
use crate::domain::generation::{title_prompt, Frame, GenerationError, GenerationRequest};
use crate::domain::language::Language;
use crate::domain::template::template_chapter_for;
use crate::domain::title::pick_fallback_title;

/// 必填字段缺失时的错误消息
pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields";

/// 取出非空白的必填字段
fn required(value: Option<String>) -> Result<String, ApplicationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApplicationError::validation(MISSING_FIELDS_MESSAGE))
}

// ============================================================================
// GenerateChapter
// ============================================================================

/// 章节生成结果
#[derive(Debug)]
pub enum GenerationOutcome {
    /// 一次性返回的模板章节（AI 不可用或在流开始前失败）
    Template {
        content: String,
        message: String,
        error: Option<String>,
    },
    /// SSE 帧流
    Stream(mpsc::Receiver<Frame>),
}

/// GenerateChapter Handler
pub struct GenerateChapterHandler {
    completion: Arc<dyn CompletionPort>,
    gate: AvailabilityGate,
    settings: GenerationSettings,
}

impl GenerateChapterHandler {
    pub fn new(
        completion: Arc<dyn CompletionPort>,
        gate: AvailabilityGate,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            completion,
            gate,
            settings,
        }
    }

    /// 校验命令并构建不可变的生成请求
    pub fn build_request(&self, command: GenerateChapter) -> Result<GenerationRequest, ApplicationError> {
        // 四个必填字段一起检查，任何一个缺失都返回同一条消息
        let prompt = required(command.prompt);
        let genre = required(command.genre);
        let characters = required(command.characters);
        let setting = required(command.setting);
        let (prompt, genre, characters, setting) = (prompt?, genre?, characters?, setting?);

        let chapter_number = NonZeroU32::new(command.chapter_number.unwrap_or(1))
            .ok_or_else(|| ApplicationError::validation("chapterNumber must be a positive integer"))?;

        let language = command
            .language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| crate::domain::DEFAULT_LANGUAGE.to_string());
        if !Language::is_supported(&language) {
            tracing::debug!(language = %language, "Unsupported language code, resolving to default");
        }

        Ok(
            GenerationRequest::new(prompt, genre, characters, setting, chapter_number)
                .with_language(language)
                .with_previous_chapters(command.previous_chapters)
                .truncate_summary(self.settings.max_previous_chars),
        )
    }

    pub async fn handle(&self, command: GenerateChapter) -> Result<GenerationOutcome, ApplicationError> {
        let request = self.build_request(command)?;

        let Some(api_key) = self.gate.credential() else {
            tracing::info!(
                chapter_number = request.chapter_number.get(),
                env_var = %self.gate.env_var(),
                localized_template = request.language().has_template(),
                "AI credential not configured, returning template chapter"
            );
            return Ok(GenerationOutcome::Template {
                content: template_chapter_for(&request),
                message: GenerationError::ConfigurationAbsent.user_message().to_string(),
                error: None,
            });
        };

        if let Err(err) = self.completion.validate_credential(&api_key) {
            let err = GenerationError::UpstreamInvocation(err.to_string());
            tracing::warn!(error = %err, "Credential rejected before streaming, returning template chapter");
            return Ok(GenerationOutcome::Template {
                content: template_chapter_for(&request),
                message: err.user_message().to_string(),
                error: Some(err.to_string()),
            });
        }

        tracing::info!(
            chapter_number = request.chapter_number.get(),
            language = request.language().name,
            "Opening chapter stream"
        );

        Ok(GenerationOutcome::Stream(spawn_chapter_stream(
            self.completion.clone(),
            api_key,
            request,
            self.settings.clone(),
        )))
    }
}

// ============================================================================
// GenerateTitle
// ============================================================================

/// 书名生成结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleResult {
    pub title: String,
    pub is_ai_generated: bool,
    pub message: Option<String>,
}

/// GenerateTitle Handler
pub struct GenerateTitleHandler {
    completion: Arc<dyn CompletionPort>,
    gate: AvailabilityGate,
    settings: GenerationSettings,
}

impl GenerateTitleHandler {
    pub fn new(
        completion: Arc<dyn CompletionPort>,
        gate: AvailabilityGate,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            completion,
            gate,
            settings,
        }
    }

    pub async fn handle(&self, command: GenerateTitle) -> Result<TitleResult, ApplicationError> {
        let genre = required(command.genre);
        let characters = required(command.characters);
        let setting = required(command.setting);
        let (genre, characters, setting) = (genre?, characters?, setting?);

        let fallback = || pick_fallback_title(&mut rand::thread_rng(), &genre, &characters, &setting);

        let Some(api_key) = self.gate.credential() else {
            tracing::info!("AI credential not configured, using fallback title");
            return Ok(TitleResult {
                title: fallback(),
                is_ai_generated: false,
                message: None,
            });
        };

        let request = CompletionRequest::new(
            title_prompt(&genre, &characters, &setting, command.theme.as_deref()),
            self.settings.title_max_tokens,
            self.settings.temperature,
        );

        match self.completion.complete(&api_key, request).await {
            Ok(text) if !text.trim().is_empty() => {
                let title = text.trim().to_string();
                tracing::info!(title = %title, "Title generated");
                Ok(TitleResult {
                    title,
                    is_ai_generated: true,
                    message: None,
                })
            }
            result => {
                let reason = match result {
                    Err(e) => e.to_string(),
                    Ok(_) => GenerationError::EmptyCompletion.to_string(),
                };
                tracing::warn!(error = %reason, "Title generation failed, using fallback title");
                Ok(TitleResult {
                    title: fallback(),
                    is_ai_generated: false,
                    message: Some("AI generation failed, using creative fallback".to_string()),
                })
            }
        }
    }
}
