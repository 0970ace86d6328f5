//! 请求与响应类型

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::Error;

/// 目标生图模型类型
///
/// 决定提示词的改写风格以及默认的反向提示词
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumString,
    Display,
    EnumIter,
    Serialize,
    Deserialize,
)]
pub enum ModelType {
    #[strum(to_string = "SD1.5", serialize = "SD15")]
    #[serde(rename = "SD1.5")]
    Sd15,
    #[default]
    #[strum(to_string = "SDXL")]
    #[serde(rename = "SDXL")]
    Sdxl,
    #[strum(to_string = "Flux")]
    #[serde(rename = "Flux")]
    Flux,
    #[strum(to_string = "Flux Kontext", serialize = "FluxKontext")]
    #[serde(rename = "Flux Kontext")]
    FluxKontext,
    #[strum(to_string = "WAN 2.2", serialize = "WAN2.2")]
    #[serde(rename = "WAN 2.2")]
    Wan22,
}

impl ModelType {
    /// 下拉框选项
    pub fn options() -> Vec<String> {
        ModelType::iter().map(|v| v.to_string()).collect()
    }
}

/// Gemini 模型
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, EnumString, Display, EnumIter)]
pub enum GeminiModel {
    #[default]
    #[strum(to_string = "gemini-2.0-flash")]
    Gemini20Flash,
    #[strum(to_string = "gemini-2.0-flash-lite")]
    Gemini20FlashLite,
    #[strum(to_string = "gemini-2.5-flash")]
    Gemini25Flash,
    #[strum(to_string = "gemini-2.5-pro")]
    Gemini25Pro,
    #[strum(to_string = "gemini-1.5-flash")]
    Gemini15Flash,
    #[strum(to_string = "gemini-1.5-pro")]
    Gemini15Pro,
}

impl GeminiModel {
    /// 下拉框选项
    pub fn options() -> Vec<String> {
        GeminiModel::iter().map(|v| v.to_string()).collect()
    }
}

/// 增强请求
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancementRequest {
    pub api_key: String,
    pub model: String,
    pub base_prompt: String,
    /// 调用方传入的反向提示词, 失败时原样返回
    #[serde(default)]
    pub negative_prompt: String,
    #[serde(default)]
    pub model_type: ModelType,
    /// 0.0 ~ 1.0
    pub creativity: f32,
    #[serde(default)]
    pub keep_concise: bool,
    /// 0 表示每次运行都生成不同的结果
    #[serde(default)]
    pub seed_override: u64,
}

impl Default for EnhancementRequest {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: GeminiModel::default().to_string(),
            base_prompt: String::new(),
            negative_prompt: String::new(),
            model_type: ModelType::default(),
            creativity: 0.5,
            keep_concise: false,
            seed_override: 0,
        }
    }
}

/// API key 不输出到日志
impl fmt::Debug for EnhancementRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhancementRequest")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_prompt", &self.base_prompt)
            .field("negative_prompt", &self.negative_prompt)
            .field("model_type", &self.model_type)
            .field("creativity", &self.creativity)
            .field("keep_concise", &self.keep_concise)
            .field("seed_override", &self.seed_override)
            .finish()
    }
}

impl EnhancementRequest {
    pub fn new(api_key: impl Into<String>, base_prompt: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_prompt: base_prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = negative_prompt.into();
        self
    }

    pub fn with_model_type(mut self, model_type: ModelType) -> Self {
        self.model_type = model_type;
        self
    }

    pub fn with_creativity(mut self, creativity: f32) -> Self {
        self.creativity = creativity;
        self
    }

    pub fn with_keep_concise(mut self, keep_concise: bool) -> Self {
        self.keep_concise = keep_concise;
        self
    }

    pub fn with_seed_override(mut self, seed_override: u64) -> Self {
        self.seed_override = seed_override;
        self
    }

    /// 失败时的回退结果: 原始提示词 + 调用方的反向提示词
    pub fn fallback(&self) -> EnhancementResult {
        EnhancementResult {
            positive_prompt: self.base_prompt.clone(),
            negative_prompt: self.negative_prompt.clone(),
        }
    }
}

/// 增强结果
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancementResult {
    pub positive_prompt: String,
    pub negative_prompt: String,
}

/// 增强结果及可能的失败原因
///
/// `error` 存在时 `result` 为回退结果
#[derive(Debug)]
pub struct EnhancementOutcome {
    pub result: EnhancementResult,
    pub error: Option<Error>,
}

impl EnhancementOutcome {
    pub fn enhanced(result: EnhancementResult) -> Self {
        Self {
            result,
            error: None,
        }
    }

    pub fn fallback(request: &EnhancementRequest, error: Error) -> Self {
        Self {
            result: request.fallback(),
            error: Some(error),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.error.is_some()
    }

    pub fn into_result(self) -> EnhancementResult {
        self.result
    }
}
