//! HTTP Handlers

mod generation;
mod ping;
mod status;
mod stories;

pub use generation::*;
pub use ping::*;
pub use status::*;
pub use stories::*;
