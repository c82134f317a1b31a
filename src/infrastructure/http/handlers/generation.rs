//! Generation HTTP Handlers
//!
//! 章节生成根据 AI 可用性返回 JSON 模板章节或 SSE 流

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures_util::stream;

use crate::application::{ChapterDocument, GenerationOutcome};
use crate::domain::generation::Frame;
use crate::infrastructure::http::dto::{
    GenerateChapterRequest, GenerateTitleRequest, JsonBody, TitleResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 生成章节
pub async fn generate_chapter(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<GenerateChapterRequest>,
) -> Result<Response, ApiError> {
    let outcome = state.generate_chapter_handler.handle(req.into()).await?;

    let response = match outcome {
        GenerationOutcome::Template {
            content,
            message,
            error,
        } => Json(ChapterDocument {
            content,
            is_ai_generated: false,
            message: Some(message),
            error,
        })
        .into_response(),
        GenerationOutcome::Stream(rx) => {
            // 响应体被丢弃时 receiver 随之释放，编码任务随即退出
            let events = stream::unfold(rx, |mut rx| async move {
                rx.recv()
                    .await
                    .map(|frame| (Ok::<_, Infallible>(sse_event(frame)), rx))
            });
            (
                [(header::CONNECTION, "keep-alive")],
                Sse::new(events).keep_alive(KeepAlive::new()),
            )
                .into_response()
        }
    };

    Ok(response)
}

fn sse_event(frame: Frame) -> Event {
    Event::default().event(frame.event).data(frame.data)
}

/// 生成书名
pub async fn generate_title(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<GenerateTitleRequest>,
) -> Result<Json<TitleResponse>, ApiError> {
    let result = state.generate_title_handler.handle(req.into()).await?;
    Ok(Json(result.into()))
}
