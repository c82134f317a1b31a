//! Completion 适配器
//!
//! - DeepSeekClient: OpenAI 兼容 chat completions 接口（默认）
//! - ScriptedCompletion: 按预设脚本输出增量，离线演示和测试用

mod deepseek_client;
mod scripted;

pub use deepseek_client::{DeepSeekClient, DeepSeekClientConfig};
pub use scripted::ScriptedCompletion;
