//! Generation Event Sources
//!
//! 真实 SSE 流和模拟逐步展示统一为同一种事件流，由同一个循环消费。

use std::collections::VecDeque;
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::Deserialize;

use crate::application::ports::ByteStream;
use crate::domain::generation::{Frame, FrameDecoder, GenerationEvent, ProtocolError, StartPayload};

/// 生成事件流
pub type EventStream = BoxStream<'static, GenerationEvent>;

// ============================================================================
// Live
// ============================================================================

struct LiveState {
    bytes: ByteStream,
    decoder: FrameDecoder,
    pending: VecDeque<GenerationEvent>,
    done: bool,
}

impl LiveState {
    fn accept(&mut self, frame: Frame) {
        match GenerationEvent::from_frame(&frame) {
            Ok(event) => self.pending.push_back(event),
            Err(ProtocolError::UnknownEvent(name)) => {
                tracing::debug!(event = %name, "Unknown event skipped");
            }
            Err(err) => {
                tracing::warn!(error = %err, "Malformed frame dropped");
            }
        }
    }
}

/// 从 SSE 字节流解码事件；单帧解析失败跳过，传输错误结束流
pub fn live_events(bytes: ByteStream) -> EventStream {
    let state = LiveState {
        bytes,
        decoder: FrameDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(event) = st.pending.pop_front() {
                return Some((event, st));
            }
            if st.done {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    for frame in st.decoder.feed(&chunk) {
                        st.accept(frame);
                    }
                }
                Some(Err(err)) => {
                    tracing::warn!(error = %err, "Event stream read failed");
                    st.done = true;
                }
                None => {
                    if st.decoder.has_pending() {
                        tracing::debug!("Flushing trailing frame at end of stream");
                    }
                    if let Some(frame) = st.decoder.finish() {
                        st.accept(frame);
                    }
                    st.done = true;
                }
            }
        }
    })
    .boxed()
}

// ============================================================================
// Simulated
// ============================================================================

/// 模拟展示的粒度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevealMode {
    /// 逐词（连同其后的空白）
    #[default]
    Words,
    /// 逐字符
    Chars,
}

/// 模拟展示参数
#[derive(Debug, Clone, Copy)]
pub struct RevealConfig {
    pub mode: RevealMode,
    /// 每步之间的延迟
    pub step_delay: Duration,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            mode: RevealMode::Words,
            step_delay: Duration::from_millis(30),
        }
    }
}

/// 模拟流的终止方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedEnd {
    Complete { ai_generated: bool },
    Failed { message: String },
}

enum Phase {
    Connected,
    Start,
    Reveal,
    Done,
}

struct SimState {
    content: String,
    start: StartPayload,
    end: SimulatedEnd,
    reveal: RevealConfig,
    /// 每一步的结束字节位置
    cuts: Vec<usize>,
    step: usize,
    phase: Phase,
}

/// 将已知内容合成为 `connected, start, text…, terminal` 事件序列
pub fn simulated_events(
    content: String,
    start: StartPayload,
    end: SimulatedEnd,
    reveal: RevealConfig,
) -> EventStream {
    let cuts = reveal_cuts(&content, reveal.mode);
    let state = SimState {
        content,
        start,
        end,
        reveal,
        cuts,
        step: 0,
        phase: Phase::Connected,
    };

    stream::unfold(state, |mut st| async move {
        match st.phase {
            Phase::Connected => {
                st.phase = Phase::Start;
                Some((GenerationEvent::connected(), st))
            }
            Phase::Start => {
                st.phase = Phase::Reveal;
                let event = GenerationEvent::Start(st.start.clone());
                Some((event, st))
            }
            Phase::Reveal if st.step < st.cuts.len() => {
                if !st.reveal.step_delay.is_zero() {
                    tokio::time::sleep(st.reveal.step_delay).await;
                }
                let from = if st.step == 0 { 0 } else { st.cuts[st.step - 1] };
                let to = st.cuts[st.step];
                st.step += 1;
                let event = GenerationEvent::text(
                    &st.content[from..to],
                    &st.content[..to],
                    &st.start.language,
                );
                Some((event, st))
            }
            Phase::Reveal => {
                st.phase = Phase::Done;
                let content = std::mem::take(&mut st.content);
                let event = match &st.end {
                    SimulatedEnd::Complete { ai_generated } => {
                        GenerationEvent::complete(content, *ai_generated, &st.start.language, Utc::now())
                    }
                    SimulatedEnd::Failed { message } => {
                        GenerationEvent::error(message.clone(), Some(content), None)
                    }
                };
                Some((event, st))
            }
            Phase::Done => None,
        }
    })
    .boxed()
}

/// 计算每一步的结束位置（字节偏移，均落在字符边界上）
fn reveal_cuts(content: &str, mode: RevealMode) -> Vec<usize> {
    let mut cuts = Vec::new();
    match mode {
        RevealMode::Chars => {
            cuts.extend(content.char_indices().skip(1).map(|(i, _)| i));
        }
        RevealMode::Words => {
            let mut prev_ws = false;
            for (i, c) in content.char_indices() {
                let ws = c.is_whitespace();
                if prev_ws && !ws {
                    cuts.push(i);
                }
                prev_ws = ws;
            }
        }
    }
    if !content.is_empty() {
        cuts.push(content.len());
    }
    cuts
}
