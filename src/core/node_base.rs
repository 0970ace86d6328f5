//! ComfyUI 节点输入构建器
//!
//! 用于生成 ComfyUI 节点的 INPUT_TYPES
//!
//! # 使用示例
//!
//! ```ignore
//! InputSpec::new()
//!     .with_required("text", InputType::string().default("hello").multiline(true))
//!     .with_required("model_type", InputType::list(ModelType::options()).default("SDXL"))
//!     .with_optional("clip", InputType::clip())
//!     .with_hidden("extra_pnginfo", InputType::hidden(HIDDEN_EXTRA_PNGINFO))
//!     .build()
//! ```

use indexmap::IndexMap;
use pyo3::{
    Bound, IntoPyObject, Py, PyAny, PyResult, Python,
    types::{PyDict, PyDictMethods},
};

use crate::wrapper::comfyui::types::{
    NODE_BOOLEAN, NODE_CLIP, NODE_FLOAT, NODE_IMAGE, NODE_INT, NODE_STRING,
};

/// INPUT_TYPES 中的分组, 顺序即字典中的顺序
const SECTIONS: [&str; 3] = ["required", "optional", "hidden"];

/// 输入规范构建器
#[derive(Default)]
pub struct InputSpec {
    sections: [Vec<(String, InputType)>; 3],
}

impl InputSpec {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, section: usize, name: impl Into<String>, input: InputType) -> Self {
        self.sections[section].push((name.into(), input));
        self
    }

    /// 添加必需输入
    pub fn with_required(self, name: impl Into<String>, input: InputType) -> Self {
        self.push(0, name, input)
    }

    /// 添加可选输入
    pub fn with_optional(self, name: impl Into<String>, input: InputType) -> Self {
        self.push(1, name, input)
    }

    /// 添加隐藏输入
    pub fn with_hidden(self, name: impl Into<String>, input: InputType) -> Self {
        self.push(2, name, input)
    }

    /// 构建 INPUT_TYPES 字典
    pub fn build(self) -> PyResult<Py<PyDict>> {
        Python::attach(|py| {
            let dict = PyDict::new(py);
            for (section, inputs) in SECTIONS.into_iter().zip(self.sections) {
                let section_dict = PyDict::new(py);
                for (name, input) in inputs {
                    section_dict.set_item(name, input.to_py_object(py)?)?;
                }
                dict.set_item(section, section_dict)?;
            }
            Ok(dict.into())
        })
    }
}

/// 单个输入: 类型 + 参数
pub struct InputType {
    kind: InputKind,
    params: IndexMap<&'static str, ParamValue>,
}

#[derive(Debug, Clone, PartialEq)]
enum InputKind {
    /// 内置类型, 如 STRING / CLIP
    Named(&'static str),
    /// 下拉框选项
    List(Vec<String>),
    /// 隐藏输入, 只输出类型名称
    Hidden(&'static str),
}

/// 参数值
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl InputType {
    fn with_kind(kind: InputKind) -> Self {
        Self {
            kind,
            params: IndexMap::new(),
        }
    }

    fn named(type_name: &'static str) -> Self {
        Self::with_kind(InputKind::Named(type_name))
    }

    pub fn string() -> Self {
        Self::named(NODE_STRING)
    }

    pub fn int() -> Self {
        Self::named(NODE_INT)
    }

    pub fn float() -> Self {
        Self::named(NODE_FLOAT)
    }

    pub fn bool() -> Self {
        Self::named(NODE_BOOLEAN)
    }

    pub fn image() -> Self {
        Self::named(NODE_IMAGE)
    }

    pub fn clip() -> Self {
        Self::named(NODE_CLIP)
    }

    /// 下拉框
    pub fn list(options: Vec<String>) -> Self {
        Self::with_kind(InputKind::List(options))
    }

    /// 隐藏输入, 如 `EXTRA_PNGINFO`
    pub fn hidden(type_name: &'static str) -> Self {
        Self::with_kind(InputKind::Hidden(type_name))
    }
}

impl InputType {
    /// 写入参数, 同名参数覆盖但保留原位置
    fn param(mut self, key: &'static str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key, value.into());
        self
    }

    pub fn default(self, value: impl Into<ParamValue>) -> Self {
        self.param("default", value)
    }

    pub fn tooltip(self, value: impl Into<ParamValue>) -> Self {
        self.param("tooltip", value)
    }

    /// 只能通过连线输入
    pub fn force_input(self, force: bool) -> Self {
        self.param("forceInput", force)
    }

    pub fn min(self, value: impl Into<ParamValue>) -> Self {
        self.param("min", value)
    }

    pub fn max(self, value: impl Into<ParamValue>) -> Self {
        self.param("max", value)
    }

    pub fn step(self, value: impl Into<ParamValue>) -> Self {
        self.param("step", value)
    }

    /// 浮点数显示方式, slider | number
    pub fn display(self, display: impl Into<String>) -> Self {
        self.param("display", display.into())
    }

    pub fn multiline(self, multiline: bool) -> Self {
        self.param("multiline", multiline)
    }

    /// 输入框占位文本
    pub fn placeholder(self, placeholder: impl Into<String>) -> Self {
        self.param("placeholder", placeholder.into())
    }

    /// 类型名称, 下拉框没有
    fn type_name(&self) -> Option<&'static str> {
        match &self.kind {
            InputKind::Named(name) | InputKind::Hidden(name) => Some(*name),
            InputKind::List(_) => None,
        }
    }

    /// 转换为 Python 对象
    ///
    /// 下拉框: (options, params)
    /// 隐藏输入: type_name
    /// 其他: (type_name, params)
    fn to_py_object<'py>(self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        let params = params_to_py_dict(&self.params, py)?;
        match self.kind {
            InputKind::Named(name) => Ok((name, params).into_pyobject(py)?.into_any()),
            InputKind::List(options) => Ok((options, params).into_pyobject(py)?.into_any()),
            InputKind::Hidden(name) => Ok(name.into_pyobject(py)?.into_any()),
        }
    }
}

fn params_to_py_dict<'py>(
    params: &IndexMap<&'static str, ParamValue>,
    py: Python<'py>,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for (&key, value) in params {
        match value {
            ParamValue::String(v) => dict.set_item(key, v.as_str())?,
            ParamValue::Int(v) => dict.set_item(key, *v)?,
            ParamValue::Float(v) => dict.set_item(key, *v)?,
            ParamValue::Bool(v) => dict.set_item(key, *v)?,
        }
    }
    Ok(dict)
}

macro_rules! param_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    ParamValue::$variant(value.into())
                }
            }
        )*
    };
}

param_value_from! {
    String => String,
    &str => String,
    i64 => Int,
    i32 => Int,
    f64 => Float,
    f32 => Float,
    bool => Bool,
}

/// 种子上限可能超过 i64, 饱和截断
impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_spec_sections() {
        let spec = InputSpec::new()
            .with_required("text", InputType::string().default("hello"))
            .with_required("seed", InputType::int().default(0).min(0))
            .with_optional("clip", InputType::clip())
            .with_hidden("extra_pnginfo", InputType::hidden("EXTRA_PNGINFO"));

        let [required, optional, hidden] = &spec.sections;
        assert_eq!(required.len(), 2);
        assert_eq!(optional.len(), 1);
        assert_eq!(hidden.len(), 1);
        assert_eq!(required[0].0, "text");
    }

    #[test]
    fn test_params_keep_order() {
        let input = InputType::float()
            .default(0.5)
            .min(0.0)
            .max(1.0)
            .step(0.05)
            .tooltip("creativity");

        let keys: Vec<&str> = input.params.keys().copied().collect();
        assert_eq!(keys, vec!["default", "min", "max", "step", "tooltip"]);
        assert_eq!(input.params["default"], ParamValue::Float(0.5));
    }

    #[test]
    fn test_list_keeps_options() {
        let options = vec!["SDXL".to_string(), "Flux".to_string()];
        let input = InputType::list(options.clone()).default("SDXL");

        assert_eq!(input.kind, InputKind::List(options));
        assert_eq!(input.type_name(), None);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(InputType::clip().type_name(), Some(NODE_CLIP));
        assert_eq!(InputType::bool().type_name(), Some(NODE_BOOLEAN));
        assert_eq!(
            InputType::hidden("EXTRA_PNGINFO").type_name(),
            Some("EXTRA_PNGINFO")
        );
    }

    #[test]
    fn test_param_value_conversions() {
        assert_eq!(ParamValue::from(3_i32), ParamValue::Int(3));
        assert_eq!(ParamValue::from(0.5_f32), ParamValue::Float(0.5));
        assert_eq!(ParamValue::from("x"), ParamValue::String("x".to_string()));
        assert_eq!(ParamValue::from(true), ParamValue::Bool(true));
    }

    #[test]
    fn test_seed_param_saturates() {
        let input = InputType::int().max(u64::MAX);
        assert_eq!(input.params["max"], ParamValue::Int(i64::MAX));
    }
}
