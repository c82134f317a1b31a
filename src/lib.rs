//! Storyforge - 流式章节生成的故事写作服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Generation: 生成请求、SSE 帧编解码、生成事件
//! - Story: 故事与章节、续写辅助
//! - Template / Title: 无 AI 时的兜底内容
//!
//! 应用层 (application/):
//! - Ports: 端口定义（CompletionPort, StoryStorePort, GenerationTransportPort）
//! - Commands / Queries: CQRS 处理器
//! - Chapter Stream: 服务端 SSE 编码任务
//! - Draft: 客户端草稿状态机
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + SSE
//! - Memory: 内存故事存储
//! - Adapters: DeepSeek 补全客户端、脚本补全、Storyforge HTTP 客户端

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;

pub use config::{load_config, AppConfig};
