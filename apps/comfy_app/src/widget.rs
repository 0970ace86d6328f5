//! 部件节点

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

/// 小部件信息
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Widget {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub r#type: String,
    #[serde(default)]
    pub options: WidgetOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<WidgetValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialize: Option<bool>,
}

impl Widget {
    /// 从 JsValue 反序列化
    pub fn from_js(js_value: JsValue) -> Result<Widget, JsValue> {
        let result: Widget = serde_wasm_bindgen::from_value(js_value)?;
        Ok(result)
    }

    /// 序列化为 JsValue
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self)?)
    }
}

/// 小部件选项
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct WidgetOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    /// 下拉框选项
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl WidgetOptions {
    /// 从 JsValue 反序列化
    pub fn from_js(js_value: JsValue) -> Result<WidgetOptions, JsValue> {
        let result: WidgetOptions = serde_wasm_bindgen::from_value(js_value)?;
        Ok(result)
    }

    /// 序列化为 JsValue
    pub fn to_js(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self)?)
    }
}

/// 小部件的值
///
/// 下拉框/文本框为字符串, 数值框为数字, 开关为布尔值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WidgetValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Null,
}

impl WidgetValue {
    /// 从 JsValue 反序列化
    pub fn from_js(js_value: JsValue) -> Result<WidgetValue, JsValue> {
        if js_value.is_undefined() {
            return Ok(WidgetValue::Null);
        }
        let result: WidgetValue = serde_wasm_bindgen::from_value(js_value)?;
        Ok(result)
    }

    /// 序列化为 JsValue
    pub fn to_js(&self) -> JsValue {
        match self {
            WidgetValue::Bool(v) => JsValue::from_bool(*v),
            WidgetValue::Int(v) => JsValue::from_f64(*v as f64),
            WidgetValue::Float(v) => JsValue::from_f64(*v),
            WidgetValue::String(v) => JsValue::from_str(v),
            WidgetValue::Null => JsValue::NULL,
        }
    }

    /// 文本值, 非字符串时为 None
    pub fn as_str(&self) -> Option<&str> {
        match self {
            WidgetValue::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for WidgetValue {
    fn from(value: &str) -> Self {
        WidgetValue::String(value.to_string())
    }
}

impl From<String> for WidgetValue {
    fn from(value: String) -> Self {
        WidgetValue::String(value)
    }
}

impl From<bool> for WidgetValue {
    fn from(value: bool) -> Self {
        WidgetValue::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_widget_value_untagged() -> Result<(), serde_json::Error> {
        assert_eq!(
            serde_json::from_value::<WidgetValue>(json!("SDXL"))?,
            WidgetValue::String("SDXL".to_string())
        );
        assert_eq!(
            serde_json::from_value::<WidgetValue>(json!(true))?,
            WidgetValue::Bool(true)
        );
        assert_eq!(
            serde_json::from_value::<WidgetValue>(json!(42))?,
            WidgetValue::Int(42)
        );
        assert_eq!(
            serde_json::from_value::<WidgetValue>(json!(0.7))?,
            WidgetValue::Float(0.7)
        );
        assert_eq!(
            serde_json::from_value::<WidgetValue>(json!(null))?,
            WidgetValue::Null
        );
        Ok(())
    }

    #[test]
    fn test_combo_widget() -> Result<(), serde_json::Error> {
        let widget: Widget = serde_json::from_value(json!({
            "name": "model_type",
            "type": "combo",
            "value": "Flux",
            "options": {"values": ["SDXL", "Flux", "Pony"]},
            "y": 0
        }))?;

        assert_eq!(widget.name, "model_type");
        assert_eq!(widget.value.as_ref().and_then(WidgetValue::as_str), Some("Flux"));
        assert_eq!(
            widget.options.values,
            Some(vec!["SDXL".to_string(), "Flux".to_string(), "Pony".to_string()])
        );
        Ok(())
    }

    #[test]
    fn test_text_widget_without_options() -> Result<(), serde_json::Error> {
        let widget: Widget = serde_json::from_value(json!({
            "name": "api_key",
            "type": "text",
            "value": ""
        }))?;

        assert_eq!(widget.r#type, "text");
        assert!(widget.options.values.is_none());
        Ok(())
    }
}
