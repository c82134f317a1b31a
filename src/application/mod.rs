//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（CompletionPort、StoryStorePort、GenerationTransportPort）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - chapter_stream: 服务端章节流编码任务
//! - draft: 客户端草稿状态机
//! - availability: AI 凭证可用性判断
//! - error: 应用层错误定义

pub mod availability;
pub mod chapter_stream;
pub mod commands;
pub mod draft;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use availability::{AvailabilityGate, CredentialSource};
pub use chapter_stream::{spawn_chapter_stream, GenerationSettings};

pub use commands::{
    // Generation commands
    GenerateChapter,
    GenerateTitle,
    // Story commands
    CreateChapter,
    CreateStory,
    DeleteStory,
    UpdateStory,
    // Handlers
    handlers::{
        CreateChapterHandler, CreateStoryHandler, DeleteStoryHandler, GenerateChapterHandler,
        GenerateTitleHandler, GenerationOutcome, TitleResult, UpdateStoryHandler,
    },
};

pub use draft::{AiStatusCache, ChapterDraft, DraftController, DraftError, DraftStatus, RevealConfig, RevealMode};

pub use error::ApplicationError;

pub use ports::{
    ByteStream, ChapterDocument, CompletionError, CompletionPort, CompletionRequest, DeltaStream,
    GenerationResponse, GenerationTransportPort, StoreError, StoryStorePort, TransportError,
};

pub use queries::{
    AiStatus,
    CheckAiStatus,
    GetStory,
    ListStories,
    // Handlers
    handlers::{CheckAiStatusHandler, GetStoryHandler, ListStoriesHandler},
};
