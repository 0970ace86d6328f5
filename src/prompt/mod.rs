//! 提示词相关的节点
use pyo3::{
    Bound, PyResult, Python,
    types::{PyModule, PyModuleMethods},
};

use crate::core::node::NodeRegister;

mod gemini_prompt_enhancer;
pub use gemini_prompt_enhancer::GeminiPromptEnhancer;

/// 提示词模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "prompt")?;
    submodule.add_class::<GeminiPromptEnhancer>()?;
    Ok(submodule)
}

/// Prompt node register
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![NodeRegister(
        "GeminiPromptEnhancer",
        py.get_type::<GeminiPromptEnhancer>(),
        "Gemini Prompt Enhancer",
    )];
    Ok(nodes)
}
