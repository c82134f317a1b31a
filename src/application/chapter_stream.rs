//! Chapter Stream Encoder - 服务端 SSE 编码任务
//!
//! 每个生成请求独占一个 tokio 任务和一次上游调用，编码好的帧写入有界 channel，由 HTTP 层转成 SSE body。
//!
//! 帧顺序：
//! 1. `connected`：任务启动立即发送
//! 2. `start`：开始调用上游时发送
//! 3. `text`：每个非空增量一帧，带累计文本和重新计算的字数
//! 4. `complete` 或 `error`（带模板兜底和已生成的部分文本）
//!
//! 接收端关闭说明 body 已被丢弃（客户端断开）。等待上游时同时监听关闭，任务立即停止并释放上游流。

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use secrecy::SecretString;
use tokio::sync::mpsc;
use tokio::time::timeout_at;

use crate::application::ports::{CompletionPort, CompletionRequest, DeltaStream};
use crate::domain::generation::{
    system_prompt, Frame, GenerationError, GenerationEvent, GenerationRequest,
};
use crate::domain::template::template_chapter_for;
use crate::domain::text::word_count;

/// 生成参数
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    /// 章节最大生成 token 数
    pub max_tokens: u32,
    /// 书名最大生成 token 数
    pub title_max_tokens: u32,
    pub temperature: f32,
    /// 相邻 `text` 帧之间的节流延迟，0 表示不节流
    pub pacing: Duration,
    /// 单次生成的总时长预算
    pub max_duration: Duration,
    /// 帧 channel 容量
    pub channel_capacity: usize,
    /// 前文摘要最大字符数
    pub max_previous_chars: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_tokens: 800,
            title_max_tokens: 50,
            temperature: 0.7,
            pacing: Duration::from_millis(50),
            max_duration: Duration::from_secs(60),
            channel_capacity: 32,
            max_previous_chars: 4000,
        }
    }
}

/// 流结束方式
enum PumpEnd {
    Finished,
    Disconnected,
}

/// 单次生成的编码任务
pub struct ChapterStream {
    completion: Arc<dyn CompletionPort>,
    api_key: SecretString,
    request: GenerationRequest,
    settings: GenerationSettings,
    tx: mpsc::Sender<Frame>,
}

/// 启动编码任务，返回帧接收端
pub fn spawn_chapter_stream(
    completion: Arc<dyn CompletionPort>,
    api_key: SecretString,
    request: GenerationRequest,
    settings: GenerationSettings,
) -> mpsc::Receiver<Frame> {
    let (tx, rx) = mpsc::channel(settings.channel_capacity.max(1));
    let task = ChapterStream {
        completion,
        api_key,
        request,
        settings,
        tx,
    };
    tokio::spawn(task.run());
    rx
}

impl ChapterStream {
    async fn run(self) {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.settings.max_duration;
        let chapter_number = self.request.chapter_number.get();
        let language = self.request.language().name;

        if !self.emit(GenerationEvent::connected()).await {
            return;
        }
        if !self.emit(GenerationEvent::start(&self.request, Utc::now())).await {
            return;
        }

        tracing::info!(
            chapter_number = chapter_number,
            language = language,
            provider = self.completion.provider_name(),
            model = self.completion.model(),
            "Chapter generation started"
        );

        let mut content = String::new();
        let outcome = timeout_at(deadline, self.pump(&mut content)).await;

        let terminal = match outcome {
            Ok(Ok(PumpEnd::Disconnected)) => {
                tracing::info!(
                    chapter_number = chapter_number,
                    generated_chars = content.len(),
                    "Client disconnected, generation abandoned"
                );
                return;
            }
            Ok(Ok(PumpEnd::Finished)) if content.trim().is_empty() => {
                self.failure(GenerationError::EmptyCompletion, &content)
            }
            Ok(Ok(PumpEnd::Finished)) => {
                tracing::info!(
                    chapter_number = chapter_number,
                    word_count = word_count(&content),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Chapter generation completed"
                );
                GenerationEvent::complete(content, true, language, Utc::now())
            }
            Ok(Err(err)) => self.failure(err, &content),
            Err(_) => self.failure(
                GenerationError::TimedOut(self.settings.max_duration.as_secs()),
                &content,
            ),
        };

        self.emit(terminal).await;
    }

    /// 拉取上游增量并逐帧发送
    async fn pump(&self, content: &mut String) -> Result<PumpEnd, GenerationError> {
        let language = self.request.language().name;
        let mut deltas = tokio::select! {
            biased;
            _ = self.tx.closed() => return Ok(PumpEnd::Disconnected),
            opened = self.open_deltas() => opened?,
        };

        loop {
            let item = tokio::select! {
                biased;
                _ = self.tx.closed() => return Ok(PumpEnd::Disconnected),
                item = deltas.next() => item,
            };
            let Some(item) = item else {
                break;
            };
            let delta = item.map_err(|e| {
                if content.is_empty() {
                    GenerationError::UpstreamInvocation(e.to_string())
                } else {
                    GenerationError::StreamInterrupted(e.to_string())
                }
            })?;
            if delta.is_empty() {
                continue;
            }

            content.push_str(&delta);
            let event = GenerationEvent::text(delta, content.as_str(), language);
            if !self.emit(event).await {
                return Ok(PumpEnd::Disconnected);
            }

            if !self.settings.pacing.is_zero() {
                tokio::time::sleep(self.settings.pacing).await;
            }
        }

        Ok(PumpEnd::Finished)
    }

    /// 建立增量流；流式调用建立失败时退回非流式调用，整段文本作为单个增量
    async fn open_deltas(&self) -> Result<DeltaStream, GenerationError> {
        let completion_request = CompletionRequest::new(
            self.request.prompt.clone(),
            self.settings.max_tokens,
            self.settings.temperature,
        )
        .with_system(system_prompt(&self.request));

        match self
            .completion
            .stream(&self.api_key, completion_request.clone())
            .await
        {
            Ok(deltas) => Ok(deltas),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    "Streaming setup failed, falling back to non-streaming completion"
                );
                let text = self
                    .completion
                    .complete(&self.api_key, completion_request)
                    .await
                    .map_err(|e| GenerationError::UpstreamInvocation(e.to_string()))?;
                Ok(stream::once(async move { Ok(text) }).boxed())
            }
        }
    }

    /// 构建带模板兜底的 `error` 帧
    fn failure(&self, err: GenerationError, partial: &str) -> GenerationEvent {
        tracing::warn!(
            chapter_number = self.request.chapter_number.get(),
            error = %err,
            mid_stream = err.is_mid_stream(),
            partial_chars = partial.len(),
            "Chapter generation failed, sending template fallback"
        );
        GenerationEvent::error(
            err.user_message(),
            Some(template_chapter_for(&self.request)),
            Some(partial.to_string()),
        )
    }

    /// 编码并发送一帧；返回 false 表示接收端已关闭
    async fn emit(&self, event: GenerationEvent) -> bool {
        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(event = event.name(), error = %e, "Failed to encode frame");
                return true;
            }
        };
        self.tx.send(frame).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::GenerationEvent;
    use crate::infrastructure::adapters::ScriptedCompletion;
    use std::num::NonZeroU32;

    fn request() -> GenerationRequest {
        GenerationRequest::new("Begin", "Fantasy", "Ada", "Ironwood", NonZeroU32::MIN)
    }

    fn settings() -> GenerationSettings {
        GenerationSettings {
            pacing: Duration::ZERO,
            ..Default::default()
        }
    }

    async fn collect(mut rx: mpsc::Receiver<Frame>) -> Vec<GenerationEvent> {
        let mut events = Vec::new();
        while let Some(frame) = rx.recv().await {
            events.push(GenerationEvent::from_frame(&frame).unwrap());
        }
        events
    }

    fn key() -> SecretString {
        SecretString::new("sk-test".into())
    }

    #[tokio::test]
    async fn test_successful_stream_frame_order() {
        let completion = Arc::new(ScriptedCompletion::new(["Once ", "upon ", "a ", "time."]));
        let events = collect(spawn_chapter_stream(completion, key(), request(), settings())).await;

        let names: Vec<&str> = events.iter().map(|e| e.name()).collect();
        assert_eq!(names, ["connected", "start", "text", "text", "text", "text", "complete"]);

        let cumulative: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                GenerationEvent::Text(p) => Some(p.full_content.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(cumulative, ["Once ", "Once upon ", "Once upon a ", "Once upon a time."]);

        match events.last() {
            Some(GenerationEvent::Complete(p)) => {
                assert_eq!(p.full_content, "Once upon a time.");
                assert_eq!(p.word_count, 4);
                assert!(p.is_ai_generated);
            }
            other => panic!("unexpected terminal: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failure_before_first_delta_sends_fallback() {
        let completion = Arc::new(ScriptedCompletion::new(["never"]).fail_after(0));
        let events = collect(spawn_chapter_stream(completion, key(), request(), settings())).await;

        assert_eq!(events.len(), 3);
        match &events[2] {
            GenerationEvent::Error(p) => {
                let fallback = p.fallback.as_deref().unwrap();
                assert!(fallback.contains("Ada"));
                assert!(fallback.contains("Ironwood"));
                assert!(p.partial_content.is_none());
            }
            other => panic!("unexpected terminal: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mid_stream_failure_keeps_partial_content() {
        let completion = Arc::new(ScriptedCompletion::new(["Once ", "upon ", "a "]).fail_after(2));
        let events = collect(spawn_chapter_stream(completion, key(), request(), settings())).await;

        match events.last() {
            Some(GenerationEvent::Error(p)) => {
                assert_eq!(p.partial_content.as_deref(), Some("Once upon "));
                assert!(p.fallback.is_some());
            }
            other => panic!("unexpected terminal: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_setup_failure_falls_back_to_non_streaming() {
        let completion = Arc::new(ScriptedCompletion::new(["Whole chapter text."]).fail_stream_setup());
        let events = collect(spawn_chapter_stream(completion, key(), request(), settings())).await;

        let names: Vec<&str> = events.iter().map(|e| e.name()).collect();
        assert_eq!(names, ["connected", "start", "text", "complete"]);
    }

    #[tokio::test]
    async fn test_blank_completion_is_an_error() {
        let completion = Arc::new(ScriptedCompletion::new(["  ", "\n"]));
        let events = collect(spawn_chapter_stream(completion, key(), request(), settings())).await;
        assert!(matches!(events.last(), Some(GenerationEvent::Error(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wall_clock_budget_ends_with_error() {
        let completion = Arc::new(
            ScriptedCompletion::new(["slow ", "words"]).with_delay(Duration::from_secs(40)),
        );
        let settings = GenerationSettings {
            max_duration: Duration::from_secs(60),
            ..settings()
        };
        let events = collect(spawn_chapter_stream(completion, key(), request(), settings)).await;

        match events.last() {
            Some(GenerationEvent::Error(p)) => {
                assert_eq!(p.partial_content.as_deref(), Some("slow "));
                assert!(p.error.contains("timed out"));
            }
            other => panic!("unexpected terminal: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dropped_receiver_stops_the_task() {
        let completion = Arc::new(
            ScriptedCompletion::new(["a ", "b ", "c ", "d "]).with_delay(Duration::from_millis(20)),
        );
        let settings = GenerationSettings {
            channel_capacity: 1,
            ..settings()
        };
        let mut rx = spawn_chapter_stream(completion.clone(), key(), request(), settings);
        let first = rx.recv().await.unwrap();
        assert_eq!(first.event, "connected");
        drop(rx);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(completion.delivered() <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_while_waiting_on_provider_ends_task() {
        let completion = Arc::new(
            ScriptedCompletion::new(["slow ", "words"]).with_delay(Duration::from_secs(40)),
        );
        let (tx, mut rx) = mpsc::channel(8);
        let task = ChapterStream {
            completion: completion.clone(),
            api_key: key(),
            request: request(),
            settings: settings(),
            tx,
        };
        let handle = tokio::spawn(task.run());

        assert_eq!(rx.recv().await.unwrap().event, "connected");
        assert_eq!(rx.recv().await.unwrap().event, "start");
        drop(rx);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("task should stop once the receiver is gone")
            .unwrap();
        assert_eq!(completion.delivered(), 0);
    }
}
