//! Storyforge API Client

mod storyforge_client;

pub use storyforge_client::{StoryforgeClient, StoryforgeClientConfig};
