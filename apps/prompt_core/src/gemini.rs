//! Gemini generateContent 客户端
//!
//! POST {api_base}/models/{model}:generateContent

use std::thread;

use reqwest::{StatusCode, blocking::Client};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{
    config::ClientConfig,
    enhancer::TextGenerator,
    error::{Error, Result},
    instruction::GenerateRequest,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Gemini 客户端
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: ClientConfig,
    http: Client,
}

impl GeminiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self { config, http })
    }

    /// 使用环境变量配置创建
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// 模型对应的接口地址
    pub fn endpoint(&self, model: &str) -> String {
        let model = model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };
        format!("{}/{}:generateContent", self.config.api_base, model_path)
    }

    /// 请求体
    pub fn payload(request: &GenerateRequest) -> Value {
        let mut generation_config = json!({
            "temperature": request.sampling.temperature,
            "topP": request.sampling.top_p,
            "maxOutputTokens": request.sampling.max_output_tokens,
            "candidateCount": 1,
        });
        if let Some(seed) = request.sampling.seed {
            generation_config["seed"] = json!(seed);
        }

        json!({
            "systemInstruction": {
                "parts": [{ "text": request.system_instruction }],
            },
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.user_instruction }],
            }],
            "generationConfig": generation_config,
        })
    }

    /// 单次请求
    fn send(&self, request: &GenerateRequest) -> Result<String> {
        let endpoint = self.endpoint(&request.model);
        debug!("gemini request: {endpoint}");

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", &request.api_key)
            .json(&Self::payload(request))
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(Self::status_error(status, &body));
        }

        Self::extract_text(&body)
    }

    /// 将 HTTP 错误状态映射为错误类型
    fn status_error(status: StatusCode, body: &str) -> Error {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.chars().take(200).collect());
        let message = format!("{status}: {message}");

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Error::AuthenticationFailure(message)
            }
            StatusCode::BAD_REQUEST
                if message.to_lowercase().contains("api key")
                    || message.contains("API_KEY_INVALID") =>
            {
                Error::AuthenticationFailure(message)
            }
            StatusCode::BAD_REQUEST => Error::InvalidParameter(message),
            StatusCode::TOO_MANY_REQUESTS => Error::RateLimited(message),
            _ => Error::NetworkFailure(message),
        }
    }

    /// 从响应中提取文本
    fn extract_text(body: &str) -> Result<String> {
        let response: GenerateContentResponse = serde_json::from_str(body)
            .map_err(|e| Error::MalformedResponse(format!("invalid json, {e}")))?;

        let Some(candidate) = response.candidates.first() else {
            if let Some(reason) = response.prompt_feedback.and_then(|v| v.block_reason) {
                return Err(Error::ContentBlocked { reason });
            }
            return Err(Error::MalformedResponse(
                "the response has no candidates".to_string(),
            ));
        };

        let text = candidate
            .content
            .as_ref()
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            if let Some(reason) = candidate.finish_reason.as_deref() {
                if reason == "SAFETY" || reason == "PROHIBITED_CONTENT" || reason == "BLOCKLIST" {
                    return Err(Error::ContentBlocked {
                        reason: reason.to_string(),
                    });
                }
            }
            return Err(Error::MalformedResponse(
                "the candidate contains no text".to_string(),
            ));
        }

        Ok(text)
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.send(request) {
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "gemini request failed, retrying ({attempt}/{}): {e}",
                        self.config.max_retries
                    );
                    thread::sleep(self.config.retry_backoff());
                }
                result => return result,
            }
        }
    }
}
