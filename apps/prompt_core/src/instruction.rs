//! 指令构建
//!
//! 按模型类型选择系统提示词, 并将 creativity / keep_concise 映射为采样参数

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    types::{EnhancementRequest, ModelType},
};

/// 精简模式下的字数上限
pub const CONCISE_WORD_LIMIT: usize = 40;

const MIN_TEMPERATURE: f32 = 0.2;
const MAX_TEMPERATURE: f32 = 1.4;
const MIN_TOP_P: f32 = 0.80;
const MAX_TOP_P: f32 = 0.98;

const CONCISE_MAX_OUTPUT_TOKENS: u32 = 160;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 400;

/// 模型类型的风格说明
fn style_guide(model_type: ModelType) -> &'static [&'static str] {
    match model_type {
        ModelType::Sd15 => &[
            "You are a prompt engineer for Stable Diffusion 1.5.",
            "Write the prompt as comma-separated keywords and short phrases, most important subject first.",
            "You may use emphasis weights such as (keyword:1.2) sparingly.",
            "Include medium, style, lighting, composition and quality tags.",
        ],
        ModelType::Sdxl => &[
            "You are a prompt engineer for Stable Diffusion XL.",
            "Enhance and elaborate the prompt with specific details, artistic style and visual elements.",
            "Mix a short descriptive sentence with comma-separated descriptors.",
            "Mention lighting, color palette, composition and camera or medium where relevant.",
        ],
        ModelType::Flux => &[
            "You are a prompt engineer for the Flux image model.",
            "Write fluent natural-language sentences describing the scene, not keyword lists.",
            "Do not use emphasis weights or negative phrasing; describe what should be visible.",
            "Cover subject, setting, lighting, mood and photographic or artistic style.",
        ],
        ModelType::FluxKontext => &[
            "You are a prompt engineer for the Flux Kontext image editing model.",
            "Rewrite the request as a clear edit instruction applied to an existing input image.",
            "State precisely what should change and explicitly name what must stay unchanged, such as identity, pose, framing and background.",
            "Use direct imperative sentences.",
        ],
        ModelType::Wan22 => &[
            "You are a prompt engineer for the WAN 2.2 video generation model.",
            "Describe a single continuous shot: subject, action and motion over time.",
            "Specify camera movement, shot size, lighting and atmosphere.",
            "Write natural-language sentences in present tense.",
        ],
    }
}

/// 默认的篇幅要求
fn length_guide(model_type: ModelType) -> &'static str {
    match model_type {
        ModelType::Sd15 => "Aim for around 30-60 keywords and phrases.",
        ModelType::FluxKontext => "Aim for around 30-60 words.",
        _ => "Aim for around 50-100 words. Make it very descriptive.",
    }
}

/// 系统提示词
pub fn system_instruction(model_type: ModelType, keep_concise: bool) -> String {
    let mut lines: Vec<String> = style_guide(model_type)
        .iter()
        .map(|v| v.to_string())
        .collect();

    if keep_concise {
        lines.push(format!(
            "Keep the enhanced prompt short: no more than {CONCISE_WORD_LIMIT} words."
        ));
    } else {
        lines.push(length_guide(model_type).to_string());
    }

    lines.push(
        "Respond with the enhanced prompt only: no preamble, no explanations, no quotes, no markdown."
            .to_string(),
    );

    lines.join("\n")
}

/// 用户提示词
pub fn user_instruction(base_prompt: &str) -> String {
    format!("Original Prompt: {}", base_prompt.trim())
}

/// 采样参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    /// None 表示不固定种子
    pub seed: Option<i64>,
}

impl SamplingParams {
    /// 从请求映射采样参数
    ///
    /// creativity 截断到 [0, 1] 后线性映射
    pub fn from_request(request: &EnhancementRequest) -> Self {
        let creativity = if request.creativity.is_finite() {
            request.creativity.clamp(0.0, 1.0)
        } else {
            0.5
        };

        let temperature = MIN_TEMPERATURE + (MAX_TEMPERATURE - MIN_TEMPERATURE) * creativity;
        let top_p = MIN_TOP_P + (MAX_TOP_P - MIN_TOP_P) * creativity;

        let max_output_tokens = if request.keep_concise {
            CONCISE_MAX_OUTPUT_TOKENS
        } else {
            DEFAULT_MAX_OUTPUT_TOKENS
        };

        // 远端的 seed 为 int32, 超出范围时取模
        let seed = match request.seed_override {
            0 => None,
            v => Some((v % i32::MAX as u64) as i64),
        };

        Self {
            temperature,
            top_p,
            max_output_tokens,
            seed,
        }
    }
}

/// 发送给远端的完整请求
#[derive(Clone, PartialEq)]
pub struct GenerateRequest {
    pub api_key: String,
    pub model: String,
    pub system_instruction: String,
    pub user_instruction: String,
    pub sampling: SamplingParams,
}

impl std::fmt::Debug for GenerateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateRequest")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("system_instruction", &self.system_instruction)
            .field("user_instruction", &self.user_instruction)
            .field("sampling", &self.sampling)
            .finish()
    }
}

impl GenerateRequest {
    /// 根据增强请求构建
    pub fn build(request: &EnhancementRequest, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: request.model.trim().to_string(),
            system_instruction: system_instruction(request.model_type, request.keep_concise),
            user_instruction: user_instruction(&request.base_prompt),
            sampling: SamplingParams::from_request(request),
        }
    }
}

lazy_static! {
    static ref CODE_FENCE: std::result::Result<Regex, regex::Error> =
        Regex::new(r"^```[a-zA-Z]*\s*|\s*```$");
    static ref LEADING_LABEL: std::result::Result<Regex, regex::Error> =
        Regex::new(r"(?i)^\**\s*(enhanced|improved|final)?\s*prompt\s*\**\s*:\s*\**");
    static ref WHITESPACE: std::result::Result<Regex, regex::Error> = Regex::new(r"\s+");
}

fn pattern(re: &'static std::result::Result<Regex, regex::Error>) -> Result<&'static Regex> {
    re.as_ref()
        .map_err(|e| Error::InvalidParameter(format!("regex error, {e}")))
}

/// 清理模型返回的文本
///
/// 去掉代码块、引号、"Enhanced prompt:" 之类的前缀, 合并空白
pub fn clean_response(text: &str) -> Result<String> {
    let text = pattern(&CODE_FENCE)?.replace_all(text.trim(), "");
    let text = pattern(&LEADING_LABEL)?.replace(text.trim(), "");
    let text = pattern(&WHITESPACE)?.replace_all(text.trim(), " ");

    let mut text = text.trim();
    for (open, close) in [('"', '"'), ('\'', '\''), ('“', '”')] {
        if text.len() > 1 && text.starts_with(open) && text.ends_with(close) {
            text = text[open.len_utf8()..text.len() - close.len_utf8()].trim();
        }
    }

    if text.is_empty() {
        return Err(Error::MalformedResponse(
            "the model returned an empty prompt".to_string(),
        ));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_instruction_by_model_type() {
        let sd15 = system_instruction(ModelType::Sd15, false);
        assert!(sd15.contains("Stable Diffusion 1.5"));
        assert!(sd15.contains("comma-separated"));

        let wan = system_instruction(ModelType::Wan22, false);
        assert!(wan.contains("camera movement"));

        let kontext = system_instruction(ModelType::FluxKontext, false);
        assert!(kontext.contains("edit instruction"));
    }

    #[test]
    fn test_keep_concise_replaces_length_guide() {
        let long = system_instruction(ModelType::Sdxl, false);
        assert!(long.contains("50-100 words"));

        let short = system_instruction(ModelType::Sdxl, true);
        assert!(short.contains("no more than 40 words"));
        assert!(!short.contains("50-100 words"));
    }

    #[test]
    fn test_creativity_maps_to_temperature() {
        let low = SamplingParams::from_request(&EnhancementRequest::default().with_creativity(0.0));
        let high =
            SamplingParams::from_request(&EnhancementRequest::default().with_creativity(1.0));
        assert!((low.temperature - MIN_TEMPERATURE).abs() < 1e-6);
        assert!((high.temperature - MAX_TEMPERATURE).abs() < 1e-6);
        assert!(high.top_p > low.top_p);

        // 超出范围会被截断
        let clamped =
            SamplingParams::from_request(&EnhancementRequest::default().with_creativity(7.0));
        assert_eq!(clamped.temperature, high.temperature);
    }

    #[test]
    fn test_seed_override() {
        let random = SamplingParams::from_request(&EnhancementRequest::default());
        assert_eq!(random.seed, None);

        let fixed =
            SamplingParams::from_request(&EnhancementRequest::default().with_seed_override(42));
        assert_eq!(fixed.seed, Some(42));
    }

    #[test]
    fn test_keep_concise_limits_tokens() {
        let params =
            SamplingParams::from_request(&EnhancementRequest::default().with_keep_concise(true));
        assert_eq!(params.max_output_tokens, CONCISE_MAX_OUTPUT_TOKENS);
    }

    #[test]
    fn test_clean_response() -> anyhow::Result<()> {
        assert_eq!(
            clean_response("Enhanced prompt: a cat,\n\n  golden hour")?,
            "a cat, golden hour"
        );
        assert_eq!(
            clean_response("```text\na misty forest\n```")?,
            "a misty forest"
        );
        assert_eq!(clean_response("\"a lighthouse at dusk\"")?, "a lighthouse at dusk");
        assert_eq!(clean_response("**Prompt:** neon city")?, "neon city");
        assert!(clean_response("   \n ").is_err());
        Ok(())
    }
}
