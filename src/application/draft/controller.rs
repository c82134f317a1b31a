//! Draft Controller
//!
//! 持有唯一的草稿状态，观察者通过 watch channel 订阅快照。
//! 每个控制器同一时间只允许一个在途生成；取消通过 CancellationToken 中止读取并丢弃传输流。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use futures_util::StreamExt;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::source::{live_events, simulated_events, EventStream, RevealConfig, SimulatedEnd};
use super::state::{ChapterDraft, DraftStatus};
use crate::application::ports::{ChapterDocument, GenerationResponse, GenerationTransportPort};
use crate::domain::generation::{GenerationError, GenerationRequest, StartPayload};
use crate::domain::template::{manual_template, template_chapter_for};

/// 控制器错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("A generation is already in progress")]
    AlreadyInFlight,
}

/// 事件循环的结束方式
enum Consumed {
    Finished,
    Cancelled,
}

/// 在途标记，离开作用域时释放
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 章节草稿控制器
pub struct DraftController {
    transport: Arc<dyn GenerationTransportPort>,
    reveal: RevealConfig,
    state: watch::Sender<ChapterDraft>,
    cancel: Mutex<CancellationToken>,
    in_flight: AtomicBool,
}

impl DraftController {
    pub fn new(transport: Arc<dyn GenerationTransportPort>, reveal: RevealConfig) -> Self {
        let (state, _) = watch::channel(ChapterDraft::default());
        Self {
            transport,
            reveal,
            state,
            cancel: Mutex::new(CancellationToken::new()),
            in_flight: AtomicBool::new(false),
        }
    }

    /// 订阅草稿快照
    pub fn subscribe(&self) -> watch::Receiver<ChapterDraft> {
        self.state.subscribe()
    }

    /// 当前草稿
    pub fn snapshot(&self) -> ChapterDraft {
        self.state.borrow().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// 发起 AI 生成，返回最终草稿
    ///
    /// 传输失败、流在终止帧前结束或结果为空时，用模板章节模拟展示，最终状态为 Failed 且文本非空。
    pub async fn generate(&self, request: GenerationRequest) -> Result<ChapterDraft, DraftError> {
        let _guard = self.acquire()?;
        let token = self.fresh_token();
        self.state.send_modify(ChapterDraft::begin);

        tracing::info!(
            chapter_number = request.chapter_number.get(),
            language = request.language().name,
            "Generation requested"
        );

        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(self.snapshot()),
            opened = self.transport.open(&request) => opened,
        };

        let (events, notice) = match opened {
            Ok(GenerationResponse::Stream(bytes)) => (live_events(bytes), None),
            Ok(GenerationResponse::Document(doc)) => self.document_events(&request, doc),
            Err(err) => {
                tracing::warn!(error = %err, "Generation request failed, playing template");
                return Ok(self.play_fallback(&request, &token).await);
            }
        };

        if let Consumed::Cancelled = self.consume(events, &token).await {
            return Ok(self.snapshot());
        }

        if let Some(message) = notice {
            self.state.send_if_modified(|draft| {
                if draft.status != DraftStatus::Complete {
                    return false;
                }
                draft.message = Some(message);
                true
            });
        }

        let draft = self.snapshot();
        if !draft.status.is_terminal() {
            tracing::warn!(status = draft.status.as_str(), "Stream ended without a terminal event");
            return Ok(self.play_fallback(&request, &token).await);
        }
        if draft.text.trim().is_empty() {
            tracing::warn!(status = draft.status.as_str(), "Generation finished with blank text");
            return Ok(self.play_fallback(&request, &token).await);
        }

        tracing::info!(
            status = draft.status.as_str(),
            word_count = draft.word_count,
            ai_generated = draft.ai_generated,
            "Generation finished"
        );
        Ok(draft)
    }

    /// 手动写作：展示手动模板，最终状态为 Complete 且 ai_generated = false
    pub async fn start_manual(&self, request: &GenerationRequest) -> Result<ChapterDraft, DraftError> {
        let _guard = self.acquire()?;
        let token = self.fresh_token();
        self.state.send_modify(ChapterDraft::begin);

        let events = simulated_events(
            manual_template(request),
            start_payload(request),
            SimulatedEnd::Complete { ai_generated: false },
            self.reveal,
        );
        self.consume(events, &token).await;
        Ok(self.snapshot())
    }

    /// 取消当前生成；幂等，终止之后无效果
    pub fn cancel(&self) -> bool {
        let changed = self.state.send_if_modified(ChapterDraft::cancel);
        if changed {
            self.cancel
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .cancel();
            tracing::info!("Generation cancelled");
        }
        changed
    }

    /// 清空草稿（保存或放弃之后）
    pub fn reset(&self) {
        self.cancel();
        self.state.send_modify(ChapterDraft::reset);
    }

    fn acquire(&self) -> Result<InFlightGuard<'_>, DraftError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| InFlightGuard(&self.in_flight))
            .map_err(|_| DraftError::AlreadyInFlight)
    }

    fn fresh_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.cancel.lock().unwrap_or_else(PoisonError::into_inner) = token.clone();
        token
    }

    /// 单一事件循环：真实流和模拟流走同一条路径
    async fn consume(&self, mut events: EventStream, token: &CancellationToken) -> Consumed {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Consumed::Cancelled,
                next = events.next() => match next {
                    Some(event) => {
                        let terminal = event.is_terminal();
                        self.state.send_if_modified(|draft| draft.apply(&event));
                        if terminal {
                            return Consumed::Finished;
                        }
                    }
                    None => return Consumed::Finished,
                },
            }
        }
    }

    /// 服务端直接返回 JSON 文档时的模拟展示；第二项为完成后附在草稿上的提示
    fn document_events(
        &self,
        request: &GenerationRequest,
        doc: ChapterDocument,
    ) -> (EventStream, Option<String>) {
        let (end, notice) = match doc.error {
            Some(error) => (
                SimulatedEnd::Failed {
                    message: doc.message.unwrap_or(error),
                },
                None,
            ),
            None => (
                SimulatedEnd::Complete {
                    ai_generated: doc.is_ai_generated,
                },
                doc.message,
            ),
        };
        tracing::info!(
            ai_generated = doc.is_ai_generated,
            "Server returned a non-streamed chapter"
        );
        let events = simulated_events(doc.content, start_payload(request), end, self.reveal);
        (events, notice)
    }

    /// 以模板章节模拟展示，最终状态为 Failed；已取消时保持取消后的草稿
    async fn play_fallback(&self, request: &GenerationRequest, token: &CancellationToken) -> ChapterDraft {
        // 与 cancel() 在同一把锁内判断，避免重新开始覆盖取消标记
        let restarted = self.state.send_if_modified(|draft| {
            if draft.cancelled || token.is_cancelled() {
                return false;
            }
            draft.begin();
            true
        });
        if !restarted {
            tracing::debug!("Generation cancelled before template playback");
            return self.snapshot();
        }
        let events = simulated_events(
            template_chapter_for(request),
            start_payload(request),
            SimulatedEnd::Failed {
                message: GenerationError::UpstreamInvocation(String::new())
                    .user_message()
                    .to_string(),
            },
            self.reveal,
        );
        self.consume(events, token).await;
        self.snapshot()
    }
}

fn start_payload(request: &GenerationRequest) -> StartPayload {
    StartPayload {
        chapter_number: request.chapter_number.get(),
        genre: request.genre.clone(),
        characters: request.characters.clone(),
        language: request.language().name.to_string(),
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;
    use std::time::Duration;

    use bytes::Bytes;
    use futures_util::stream::{self, StreamExt};

    use crate::application::draft::RevealMode;
    use crate::application::ports::{ByteStream, TransportError};
    use crate::application::queries::AiStatus;
    use crate::domain::generation::encode_frame;

    enum Reply {
        Frames(Vec<String>),
        Document(ChapterDocument),
        Fail,
        Hang,
    }

    struct FakeTransport {
        reply: Mutex<Option<Reply>>,
    }

    impl FakeTransport {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
            })
        }
    }

    #[async_trait::async_trait]
    impl GenerationTransportPort for FakeTransport {
        async fn open(&self, _request: &GenerationRequest) -> Result<GenerationResponse, TransportError> {
            let reply = self.reply.lock().unwrap().take();
            match reply {
                Some(Reply::Frames(frames)) => {
                    let bytes: ByteStream = stream::iter(
                        frames.into_iter().map(|f| Ok(Bytes::from(f))).collect::<Vec<_>>(),
                    )
                    .boxed();
                    Ok(GenerationResponse::Stream(bytes))
                }
                Some(Reply::Document(doc)) => Ok(GenerationResponse::Document(doc)),
                Some(Reply::Hang) => {
                    let bytes: ByteStream = stream::pending().boxed();
                    Ok(GenerationResponse::Stream(bytes))
                }
                Some(Reply::Fail) | None => Err(TransportError::Network("connection refused".into())),
            }
        }

        async fn check_ai_status(&self) -> Result<AiStatus, TransportError> {
            Err(TransportError::Network("unused".into()))
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("Begin", "Fantasy", "Ada", "Ironwood", NonZeroU32::MIN)
    }

    fn instant() -> RevealConfig {
        RevealConfig {
            mode: RevealMode::Words,
            step_delay: Duration::ZERO,
        }
    }

    fn controller(reply: Reply) -> DraftController {
        DraftController::new(FakeTransport::new(reply), instant())
    }

    #[tokio::test]
    async fn test_streamed_generation_completes() {
        let frames = vec![
            encode_frame("connected", r#"{"status":"connected"}"#),
            encode_frame("start", r#"{"chapterNumber":1,"language":"English"}"#),
            encode_frame("text", r#"{"delta":"Once ","fullContent":"Once ","wordCount":1}"#),
            encode_frame("complete", r#"{"fullContent":"Once upon a time.","wordCount":4,"isAIGenerated":true}"#),
        ];
        let draft = controller(Reply::Frames(frames)).generate(request()).await.unwrap();
        assert_eq!(draft.status, DraftStatus::Complete);
        assert_eq!(draft.text, "Once upon a time.");
        assert_eq!(draft.word_count, 4);
        assert!(draft.ai_generated);
    }

    #[tokio::test]
    async fn test_server_error_event_keeps_fallback_text() {
        let frames = vec![
            encode_frame("start", r#"{"chapterNumber":1}"#),
            encode_frame(
                "error",
                r#"{"error":"AI generation failed. Template chapter provided.","fallback":"Template body"}"#,
            ),
        ];
        let draft = controller(Reply::Frames(frames)).generate(request()).await.unwrap();
        assert_eq!(draft.status, DraftStatus::Failed);
        assert_eq!(draft.text, "Template body");
        assert!(!draft.ai_generated);
    }

    #[tokio::test]
    async fn test_truncated_stream_plays_template() {
        let frames = vec![
            encode_frame("start", r#"{"chapterNumber":1}"#),
            encode_frame("text", r#"{"delta":"Once ","fullContent":"Once ","wordCount":1}"#),
        ];
        let draft = controller(Reply::Frames(frames)).generate(request()).await.unwrap();
        assert_eq!(draft.status, DraftStatus::Failed);
        assert!(draft.text.contains("Ada"));
        assert_eq!(
            draft.message.as_deref(),
            Some("AI generation failed. Template chapter provided.")
        );
    }

    #[tokio::test]
    async fn test_transport_failure_plays_template() {
        let draft = controller(Reply::Fail).generate(request()).await.unwrap();
        assert_eq!(draft.status, DraftStatus::Failed);
        assert!(draft.text.contains("Ironwood"));
        assert!(draft.word_count > 0);
    }

    #[tokio::test]
    async fn test_template_document_is_revealed_as_complete() {
        let doc = ChapterDocument {
            content: "Template chapter text".into(),
            is_ai_generated: false,
            message: Some("Template chapter created. Add DeepSeek API key for AI generation.".into()),
            error: None,
        };
        let draft = controller(Reply::Document(doc)).generate(request()).await.unwrap();
        assert_eq!(draft.status, DraftStatus::Complete);
        assert_eq!(draft.text, "Template chapter text");
        assert!(!draft.ai_generated);
        assert!(draft.message.unwrap().starts_with("Template chapter created."));
    }

    #[tokio::test]
    async fn test_error_document_is_revealed_as_failed() {
        let doc = ChapterDocument {
            content: "Template chapter text".into(),
            is_ai_generated: false,
            message: None,
            error: Some("Invalid credential".into()),
        };
        let draft = controller(Reply::Document(doc)).generate(request()).await.unwrap();
        assert_eq!(draft.status, DraftStatus::Failed);
        assert_eq!(draft.message.as_deref(), Some("Invalid credential"));
        assert_eq!(draft.text, "Template chapter text");
    }

    #[tokio::test]
    async fn test_cancel_stops_generation_and_discards_text() {
        let controller = Arc::new(controller(Reply::Hang));
        let mut rx = controller.subscribe();

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.generate(request()).await }
        });

        rx.wait_for(|d| d.status == DraftStatus::Connecting).await.unwrap();
        assert!(controller.cancel());
        assert!(!controller.cancel());

        let draft = task.await.unwrap().unwrap();
        assert_eq!(draft.status, DraftStatus::Idle);
        assert!(draft.cancelled);
        assert!(draft.text.is_empty());
        assert!(!controller.is_in_flight());
    }

    /// 在 open 内部取消，随后返回传输错误
    struct CancellingTransport {
        controller: std::sync::OnceLock<std::sync::Weak<DraftController>>,
    }

    #[async_trait::async_trait]
    impl GenerationTransportPort for CancellingTransport {
        async fn open(&self, _request: &GenerationRequest) -> Result<GenerationResponse, TransportError> {
            if let Some(controller) = self.controller.get().and_then(|c| c.upgrade()) {
                assert!(controller.cancel());
            }
            Err(TransportError::Network("connection refused".into()))
        }

        async fn check_ai_status(&self) -> Result<AiStatus, TransportError> {
            Err(TransportError::Network("unused".into()))
        }
    }

    #[tokio::test]
    async fn test_cancel_during_failed_open_stays_idle() {
        for _ in 0..20 {
            let transport = Arc::new(CancellingTransport {
                controller: std::sync::OnceLock::new(),
            });
            let controller = Arc::new(DraftController::new(transport.clone(), instant()));
            transport.controller.set(Arc::downgrade(&controller)).unwrap();

            let draft = controller.generate(request()).await.unwrap();
            assert_eq!(draft.status, DraftStatus::Idle);
            assert!(draft.cancelled);
            assert!(draft.text.is_empty());
            assert_eq!(controller.snapshot(), draft);
            assert!(!controller.is_in_flight());
        }
    }

    #[tokio::test]
    async fn test_second_generation_is_rejected_while_in_flight() {
        let controller = Arc::new(controller(Reply::Hang));
        let mut rx = controller.subscribe();

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.generate(request()).await }
        });
        rx.wait_for(|d| d.status == DraftStatus::Connecting).await.unwrap();

        assert_eq!(
            controller.generate(request()).await.unwrap_err(),
            DraftError::AlreadyInFlight
        );

        controller.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_manual_draft_is_not_ai_generated() {
        let controller = controller(Reply::Fail);
        let draft = controller.start_manual(&request()).await.unwrap();
        assert_eq!(draft.status, DraftStatus::Complete);
        assert!(!draft.ai_generated);
        assert!(draft.text.starts_with("Chapter 1"));

        controller.reset();
        assert_eq!(controller.snapshot(), ChapterDraft::default());
    }
}
