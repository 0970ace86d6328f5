//! 反向提示词预设
//!
//! 预设表是只读的进程级常量, 前端与节点共用同一份

use crate::types::ModelType;

/// SD1.5 反向提示词
pub const SD15_NEGATIVE: &str = "lowres, bad anatomy, bad hands, text, error, missing fingers, extra digit, fewer digits, cropped, worst quality, low quality, normal quality, jpeg artifacts, signature, watermark, username, blurry";

/// SDXL 反向提示词
pub const SDXL_NEGATIVE: &str = "lowres, worst quality, low quality, blurry, jpeg artifacts, watermark, signature, text, deformed, disfigured, bad anatomy, extra limbs, mutated hands, poorly drawn face";

/// WAN 2.2 官方反向提示词
pub const WAN22_NEGATIVE: &str = "色调艳丽，过曝，静态，细节模糊不清，字幕，风格，作品，画作，画面，静止，整体发灰，最差质量，低质量，JPEG压缩残留，丑陋的，残缺的，多余的手指，画得不好的手部，画得不好的脸部，畸形的，毁容的，形态畸形的肢体，手指融合，静止不动的画面，杂乱的背景，三条腿，背景人很多，倒着走";

/// 模型类型 -> 默认反向提示词
///
/// Flux 系列不使用反向提示词, 因此没有映射
pub const NEGATIVE_PRESETS: &[(ModelType, &str)] = &[
    (ModelType::Sd15, SD15_NEGATIVE),
    (ModelType::Sdxl, SDXL_NEGATIVE),
    (ModelType::Wan22, WAN22_NEGATIVE),
];

/// 获取模型类型对应的预设
pub fn negative_preset(model_type: ModelType) -> Option<&'static str> {
    NEGATIVE_PRESETS
        .iter()
        .find(|(k, _)| *k == model_type)
        .map(|(_, v)| *v)
}

/// 获取模型类型对应的预设, 没有映射时返回空字符串
pub fn preset_or_empty(model_type: ModelType) -> &'static str {
    negative_preset(model_type).unwrap_or_default()
}

/// 是否为预设值
///
/// 空白字符串视为预设, 与 `resolve_negative` 一致; 每次调用都基于当前表重新判断
pub fn is_preset_value(value: &str) -> bool {
    is_blank(value) || NEGATIVE_PRESETS.iter().any(|(_, v)| *v == value)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// 解析节点最终输出的反向提示词
///
/// 调用方未填写时使用模型类型的预设
pub fn resolve_negative(supplied: &str, model_type: ModelType) -> String {
    if is_blank(supplied) {
        return preset_or_empty(model_type).to_string();
    }
    supplied.to_string()
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_every_preset_is_recognised() {
        for model_type in ModelType::iter() {
            assert!(is_preset_value(preset_or_empty(model_type)));
        }
    }

    #[test]
    fn test_flux_has_no_mapping() {
        assert_eq!(negative_preset(ModelType::Flux), None);
        assert_eq!(negative_preset(ModelType::FluxKontext), None);
        assert_eq!(preset_or_empty(ModelType::Flux), "");
    }

    #[test]
    fn test_user_text_is_not_a_preset() {
        assert!(!is_preset_value("ugly, duplicate"));
        // 前后空白不同也不算预设
        assert!(!is_preset_value(&format!("{SDXL_NEGATIVE} ")));
    }

    #[test]
    fn test_resolve_negative() {
        assert_eq!(resolve_negative("", ModelType::Sdxl), SDXL_NEGATIVE);
        assert_eq!(resolve_negative("  ", ModelType::Flux), "");
        assert_eq!(resolve_negative("my words", ModelType::Sd15), "my words");
    }

    #[test]
    fn test_whitespace_is_treated_as_empty() {
        for value in ["", "  ", "\n\t"] {
            assert!(is_preset_value(value));
            assert_eq!(resolve_negative(value, ModelType::Sdxl), SDXL_NEGATIVE);
        }
    }
}
