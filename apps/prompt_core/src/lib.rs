//! Prompt Core - 提示词增强核心
//!
//! 提供模型类型预设、指令构建、Gemini 调用以及提示词元数据写入

pub mod config;
pub mod enhancer;
pub mod error;
#[cfg(feature = "client")]
pub mod gemini;
pub mod instruction;
pub mod metadata;
pub mod preset_sync;
pub mod presets;
pub mod types;
pub mod widget;

pub use config::{ClientConfig, resolve_api_key};
pub use enhancer::{PromptEnhancer, TextGenerator};
pub use error::{Error, Result};
#[cfg(feature = "client")]
pub use gemini::GeminiClient;
pub use instruction::{GenerateRequest, SamplingParams};
pub use metadata::{MetadataRecord, embed_png_text, merge_metadata, merge_metadata_pretty};
pub use preset_sync::{FieldHost, FieldState, HandlerList, NegativePresetSync, SyncOutcome};
pub use presets::{NEGATIVE_PRESETS, is_preset_value, negative_preset, resolve_negative};
pub use types::{EnhancementOutcome, EnhancementRequest, EnhancementResult, GeminiModel, ModelType};
