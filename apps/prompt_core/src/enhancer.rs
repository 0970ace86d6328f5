//! 提示词增强
//!
//! 增强失败不会中断工作流, 而是回退到原始提示词并附带错误信息

use tracing::{debug, warn};

use crate::{
    config::resolve_api_key,
    error::{Error, Result},
    instruction::{GenerateRequest, clean_response},
    presets::resolve_negative,
    types::{EnhancementOutcome, EnhancementRequest, EnhancementResult},
};

/// 远程文本生成
pub trait TextGenerator {
    fn generate(&self, request: &GenerateRequest) -> Result<String>;
}

impl<T: TextGenerator + ?Sized> TextGenerator for &T {
    fn generate(&self, request: &GenerateRequest) -> Result<String> {
        (**self).generate(request)
    }
}

impl<T: TextGenerator + ?Sized> TextGenerator for Box<T> {
    fn generate(&self, request: &GenerateRequest) -> Result<String> {
        (**self).generate(request)
    }
}

/// 提示词增强器
#[derive(Debug, Clone)]
pub struct PromptEnhancer<G> {
    generator: G,
}

impl<G: TextGenerator> PromptEnhancer<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// 增强提示词
    ///
    /// 任何失败都会返回原始提示词和调用方的反向提示词
    pub fn enhance(&self, request: &EnhancementRequest) -> EnhancementOutcome {
        match self.try_enhance(request) {
            Ok(result) => EnhancementOutcome::enhanced(result),
            Err(Error::EmptyInput { field }) => {
                debug!("skip prompt enhancement, empty {field}");
                EnhancementOutcome::fallback(request, Error::EmptyInput { field })
            }
            Err(e) => {
                warn!(
                    "prompt enhancement failed, using the original prompt ({}): {e}",
                    e.kind()
                );
                EnhancementOutcome::fallback(request, e)
            }
        }
    }

    fn try_enhance(&self, request: &EnhancementRequest) -> Result<EnhancementResult> {
        if request.base_prompt.trim().is_empty() {
            return Err(Error::EmptyInput {
                field: "text".to_string(),
            });
        }

        // 未填写 key 时不发起请求
        let api_key = resolve_api_key(&request.api_key).ok_or_else(|| {
            Error::AuthenticationFailure("API key is missing, set it on the node".to_string())
        })?;

        if request.model.trim().is_empty() {
            return Err(Error::InvalidParameter("model name is empty".to_string()));
        }

        let generate_request = GenerateRequest::build(request, api_key);
        debug!(
            "enhancing prompt with {} for {}",
            generate_request.model, request.model_type
        );

        let text = self.generator.generate(&generate_request)?;
        let positive_prompt = clean_response(&text)?;

        Ok(EnhancementResult {
            positive_prompt,
            negative_prompt: resolve_negative(&request.negative_prompt, request.model_type),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::{
        config::API_KEY_PLACEHOLDER,
        presets::{SD15_NEGATIVE, SDXL_NEGATIVE},
        types::ModelType,
    };

    /// 记录调用次数的假生成器
    struct FakeGenerator {
        response: fn() -> Result<String>,
        calls: Cell<usize>,
        last: RefCell<Option<GenerateRequest>>,
    }

    impl FakeGenerator {
        fn new(response: fn() -> Result<String>) -> Self {
            Self {
                response,
                calls: Cell::new(0),
                last: RefCell::new(None),
            }
        }
    }

    impl TextGenerator for FakeGenerator {
        fn generate(&self, request: &GenerateRequest) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            *self.last.borrow_mut() = Some(request.clone());
            (self.response)()
        }
    }

    fn enhancer(generator: &FakeGenerator) -> PromptEnhancer<&FakeGenerator> {
        PromptEnhancer::new(generator)
    }

    #[test]
    fn test_success_uses_preset_for_empty_negative() {
        let generator = FakeGenerator::new(|| Ok("Enhanced prompt: a majestic red fox".to_string()));
        let request = EnhancementRequest::new("key", "a fox").with_model_type(ModelType::Sdxl);

        let outcome = enhancer(&generator).enhance(&request);
        assert!(!outcome.is_fallback());
        assert_eq!(outcome.result.positive_prompt, "a majestic red fox");
        assert_eq!(outcome.result.negative_prompt, SDXL_NEGATIVE);
        assert_eq!(generator.calls.get(), 1);
    }

    #[test]
    fn test_success_keeps_user_negative() {
        let generator = FakeGenerator::new(|| Ok("a fox".to_string()));
        let request = EnhancementRequest::new("key", "fox")
            .with_model_type(ModelType::Sd15)
            .with_negative_prompt("no hats");

        let outcome = enhancer(&generator).enhance(&request);
        assert_eq!(outcome.result.negative_prompt, "no hats");
        assert_ne!(outcome.result.negative_prompt, SD15_NEGATIVE);
    }

    #[test]
    fn test_every_failure_falls_back_to_inputs() {
        let failures: [fn() -> Result<String>; 5] = [
            || Err(Error::AuthenticationFailure("bad key".to_string())),
            || Err(Error::NetworkFailure("timeout".to_string())),
            || Err(Error::RateLimited("quota".to_string())),
            || Err(Error::ContentBlocked { reason: "SAFETY".to_string() }),
            || Ok("   ".to_string()),
        ];

        for failure in failures {
            let generator = FakeGenerator::new(failure);
            let request = EnhancementRequest::new("key", "a lighthouse")
                .with_negative_prompt("")
                .with_model_type(ModelType::Sdxl);

            let outcome = enhancer(&generator).enhance(&request);
            assert!(outcome.is_fallback());
            assert_eq!(outcome.result.positive_prompt, "a lighthouse");
            // 失败时返回调用方传入的值, 不替换为预设
            assert_eq!(outcome.result.negative_prompt, "");
        }
    }

    #[test]
    fn test_missing_api_key_skips_the_call() {
        let generator = FakeGenerator::new(|| Ok("unused".to_string()));

        for api_key in ["", "   ", API_KEY_PLACEHOLDER] {
            let request = EnhancementRequest::new(api_key, "a cat");
            let outcome = enhancer(&generator).enhance(&request);
            assert!(matches!(
                outcome.error,
                Some(Error::AuthenticationFailure(_))
            ));
            assert_eq!(outcome.result.positive_prompt, "a cat");
        }
        assert_eq!(generator.calls.get(), 0);
    }

    #[test]
    fn test_empty_api_key_ignores_environment() {
        let generator = FakeGenerator::new(|| Ok("a totally different prompt".to_string()));

        // SAFETY: 该变量名只在本测试中使用
        unsafe { std::env::set_var("GOOGLE_API_KEY", "from-env") };
        let outcome = enhancer(&generator).enhance(&EnhancementRequest::new("", "a cat"));
        unsafe { std::env::remove_var("GOOGLE_API_KEY") };

        assert_eq!(generator.calls.get(), 0);
        assert!(outcome.is_fallback());
        assert_eq!(outcome.result.positive_prompt, "a cat");
    }

    #[test]
    fn test_empty_prompt_is_short_circuited() {
        let generator = FakeGenerator::new(|| Ok("unused".to_string()));
        let request = EnhancementRequest::new("key", "  ").with_negative_prompt("blurry");

        let outcome = enhancer(&generator).enhance(&request);
        assert!(matches!(outcome.error, Some(Error::EmptyInput { .. })));
        assert_eq!(outcome.result.positive_prompt, "  ");
        assert_eq!(outcome.result.negative_prompt, "blurry");
        assert_eq!(generator.calls.get(), 0);
    }

    #[test]
    fn test_request_is_framed_for_model_type() {
        let generator = FakeGenerator::new(|| Ok("ok".to_string()));
        let request = EnhancementRequest::new(" key ", "a dancer")
            .with_model_type(ModelType::Wan22)
            .with_seed_override(7);

        enhancer(&generator).enhance(&request);

        let last = generator.last.borrow();
        let Some(sent) = last.as_ref() else {
            panic!("generator was not called");
        };
        assert_eq!(sent.api_key, "key");
        assert!(sent.system_instruction.contains("WAN 2.2"));
        assert_eq!(sent.user_instruction, "Original Prompt: a dancer");
        assert_eq!(sent.sampling.seed, Some(7));
    }
}
