//! ComfyUI 宿主接口

mod prompt_server;
pub use prompt_server::{EVENT_ERROR, EVENT_WARNING, PromptServer};

pub mod types;
