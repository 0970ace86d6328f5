//! Gemini 提示词增强
//!
//! 调用 Gemini 改写提示词, 失败时输出原始提示词, 不中断工作流

use std::str::FromStr;

use log::{error, info, warn};
use pyo3::{
    Bound, Py, PyAny, PyErr, PyResult, Python,
    exceptions::PyRuntimeError,
    pyclass, pymethods,
    types::{PyAnyMethods, PyDict, PyType},
};

use prompt_core::{
    EnhancementOutcome, EnhancementRequest, GeminiClient, GeminiModel, ModelType, PromptEnhancer,
};

use crate::{
    core::{
        category::CATEGORY_PROMPT,
        node_base::{InputSpec, InputType},
    },
    error::Error,
    wrapper::{
        comfy::Clip,
        comfyui::{
            PromptServer,
            types::{NODE_CONDITIONING, NODE_SEED_MAX, NODE_STRING},
        },
    },
};

/// Gemini 提示词增强
#[pyclass(subclass)]
pub struct GeminiPromptEnhancer {
    client: GeminiClient,
}

impl PromptServer for GeminiPromptEnhancer {}

#[pymethods]
impl GeminiPromptEnhancer {
    #[new]
    fn new() -> PyResult<Self> {
        let client = GeminiClient::from_env().map_err(|e| {
            error!("GeminiPromptEnhancer create client failed, {e}");
            PyErr::new::<PyRuntimeError, _>(e.to_string())
        })?;
        Ok(Self { client })
    }

    #[classattr]
    #[pyo3(name = "INPUT_IS_LIST")]
    fn input_is_list() -> bool {
        false
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str, &'static str, &'static str, &'static str) {
        (NODE_STRING, NODE_STRING, NODE_CONDITIONING, NODE_CONDITIONING)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str, &'static str, &'static str) {
        (
            "positive",
            "negative",
            "positive_conditioning",
            "negative_conditioning",
        )
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_PROMPT;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Enhance a prompt with Google Gemini for the selected model type. Falls back to the original prompt when the request fails."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        let request = EnhancementRequest::default();

        InputSpec::new()
            .with_required(
                "api_key",
                InputType::string()
                    .default("")
                    .placeholder("API key")
                    .tooltip("Google AI Studio API key. Enhancement is skipped when empty"),
            )
            .with_required(
                "model",
                InputType::list(GeminiModel::options())
                    .default(GeminiModel::default().to_string())
                    .tooltip("Gemini model used to rewrite the prompt"),
            )
            .with_required(
                "text",
                InputType::string()
                    .multiline(true)
                    .default("")
                    .tooltip("The prompt to enhance"),
            )
            .with_required(
                "negative_text",
                InputType::string()
                    .multiline(true)
                    .default("")
                    .tooltip("Negative prompt. Follows the preset of the model type until you edit it"),
            )
            .with_required(
                "model_type",
                InputType::list(ModelType::options())
                    .default(request.model_type.to_string())
                    .tooltip("Target image model, decides the prompt style and the negative preset"),
            )
            .with_required(
                "creativity",
                InputType::float()
                    .default(request.creativity)
                    .min(0.0)
                    .max(1.0)
                    .step(0.05)
                    .display("slider")
                    .tooltip("Higher values give more varied rewrites"),
            )
            .with_required(
                "keep_concise",
                InputType::bool()
                    .default(request.keep_concise)
                    .tooltip("Keep the enhanced prompt short"),
            )
            .with_required(
                "seed_override",
                InputType::int()
                    .default(request.seed_override)
                    .min(0)
                    .max(NODE_SEED_MAX)
                    .tooltip("0 means a new result on every run"),
            )
            .with_optional(
                "clip",
                InputType::clip().tooltip("Encode the prompts into conditioning when connected"),
            )
            .build()
    }

    #[classmethod]
    #[pyo3(name = "IS_CHANGED", signature = (**kwargs))]
    fn is_changed(_cls: &Bound<'_, PyType>, kwargs: Option<Bound<'_, PyDict>>) -> PyResult<f64> {
        let seed_override = match kwargs {
            Some(kwargs) => kwargs
                .get_item("seed_override")
                .and_then(|v| v.extract::<u64>())
                .unwrap_or(0),
            None => 0,
        };

        Ok(change_token(seed_override))
    }

    #[allow(clippy::too_many_arguments)]
    #[pyo3(
        name = "execute",
        signature = (api_key, model, text, negative_text, model_type, creativity, keep_concise, seed_override, clip = None)
    )]
    fn execute<'py>(
        &mut self,
        py: Python<'py>,
        api_key: String,
        model: String,
        text: String,
        negative_text: String,
        model_type: &str,
        creativity: f32,
        keep_concise: bool,
        seed_override: u64,
        clip: Option<Bound<'py, PyAny>>,
    ) -> PyResult<(
        String,
        String,
        Bound<'py, PyAny>,
        Bound<'py, PyAny>,
    )> {
        let request = match ModelType::from_str(model_type) {
            Ok(model_type) => EnhancementRequest::new(api_key, text)
                .with_model(model)
                .with_negative_prompt(negative_text)
                .with_model_type(model_type)
                .with_creativity(creativity)
                .with_keep_concise(keep_concise)
                .with_seed_override(seed_override),
            Err(e) => return Err(self.fail(py, Error::from(e))),
        };

        let outcome = self.enhance(py, &request);
        self.notify(py, &outcome);

        let result = outcome.into_result();
        let (positive_conditioning, negative_conditioning) = self
            .encode(py, clip, &result.positive_prompt, &result.negative_prompt)
            .map_err(|e| self.fail(py, e))?;

        Ok((
            result.positive_prompt,
            result.negative_prompt,
            positive_conditioning,
            negative_conditioning,
        ))
    }
}

impl GeminiPromptEnhancer {
    /// 远程调用期间释放 GIL
    fn enhance(&self, py: Python<'_>, request: &EnhancementRequest) -> EnhancementOutcome {
        let enhancer = PromptEnhancer::new(&self.client);
        py.detach(|| enhancer.enhance(request))
    }

    /// 增强失败时通知前端, 不中断执行
    fn notify(&self, py: Python<'_>, outcome: &EnhancementOutcome) {
        let Some(e) = &outcome.error else {
            info!("GeminiPromptEnhancer prompt enhanced");
            return;
        };

        warn!("GeminiPromptEnhancer using the original prompt, {e}");
        if let Err(e) = self.send_warning(py, e.kind(), &e.to_string()) {
            error!("send warning failed, {e}");
        }
    }

    /// 文本编码, 未连接 clip 时输出 None
    fn encode<'py>(
        &self,
        py: Python<'py>,
        clip: Option<Bound<'py, PyAny>>,
        positive: &str,
        negative: &str,
    ) -> Result<(Bound<'py, PyAny>, Bound<'py, PyAny>), Error> {
        let Some(clip) = clip.filter(|v| !v.is_none()) else {
            return Ok((py.None().into_bound(py), py.None().into_bound(py)));
        };

        let clip = Clip::new(clip);
        Ok((clip.encode(py, positive)?, clip.encode(py, negative)?))
    }

    fn fail(&self, py: Python<'_>, e: Error) -> PyErr {
        error!("GeminiPromptEnhancer error, {e}");
        if let Err(e) = self.send_error(py, "GeminiPromptEnhancer".to_string(), e.to_string()) {
            error!("send error failed, {e}");
        }
        PyErr::new::<PyRuntimeError, _>(e.to_string())
    }
}

/// IS_CHANGED 的返回值
///
/// 种子为 0 时每次都返回新的随机值, 使节点重新执行
fn change_token(seed_override: u64) -> f64 {
    if seed_override == 0 {
        return f64::from(rand::random::<u32>());
    }
    seed_override as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_seed_is_stable() {
        assert_eq!(change_token(42), 42.0);
        assert_eq!(change_token(42), change_token(42));
    }

    #[test]
    fn test_zero_seed_changes_every_run() {
        let tokens: Vec<f64> = (0..8).map(|_| change_token(0)).collect();
        assert!(tokens.iter().all(|v| *v >= 0.0 && *v <= u32::MAX as f64));
        // 8 次 u32 随机值全部相同的概率可以忽略
        assert!(tokens.iter().any(|v| *v != tokens[0]));
    }
}
