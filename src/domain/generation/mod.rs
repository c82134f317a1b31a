//! Generation Context - 章节生成协议
//!
//! - request: 生成请求（创建后不可变）
//! - event: 生成事件（connected / start / text / complete / error）
//! - frame: SSE 帧编解码
//! - prompt: 系统提示词构建
//! - errors: 生成失败分类

mod errors;
mod event;
mod frame;
mod prompt;
mod request;

pub use errors::{GenerationError, ProtocolError};
pub use event::{
    CompletePayload, ConnectedPayload, ErrorPayload, GenerationEvent, StartPayload, TextPayload,
};
pub use frame::{encode_frame, Frame, FrameDecoder, DEFAULT_EVENT_NAME};
pub use prompt::{system_prompt, title_prompt};
pub use request::GenerationRequest;
