//! 节点分类

/// 提示词
pub const CATEGORY_PROMPT: &str = "GeminiPromptEnhancer/Prompt";
/// 图片
pub const CATEGORY_IMAGE: &str = "GeminiPromptEnhancer/Image";
