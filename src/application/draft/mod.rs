//! Chapter Draft - 客户端生成状态机
//!
//! 状态：`Idle → Connecting → Streaming → {Complete | Failed} → Idle`（reset）
//!
//! - state: 草稿状态及事件归约
//! - source: 事件源（真实 SSE 流 / 模拟逐步展示）
//! - controller: 单个在途生成的驱动、取消和兜底
//! - status_cache: AI 状态短时缓存

mod controller;
mod source;
mod state;
mod status_cache;

pub use controller::{DraftController, DraftError};
pub use source::{live_events, simulated_events, EventStream, RevealConfig, RevealMode, SimulatedEnd};
pub use state::{ChapterDraft, DraftStatus};
pub use status_cache::AiStatusCache;
