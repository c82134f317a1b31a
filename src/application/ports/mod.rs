//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod completion;
mod generation_transport;
mod story_store;

pub use completion::{CompletionError, CompletionPort, CompletionRequest, DeltaStream};
pub use generation_transport::{
    ByteStream, ChapterDocument, GenerationResponse, GenerationTransportPort, TransportError,
};
pub use story_store::{StoreError, StoryStorePort};
