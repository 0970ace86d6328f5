//! 图片相关的节点
use pyo3::{
    Bound, PyResult, Python,
    types::{PyModule, PyModuleMethods},
    wrap_pyfunction,
};

use crate::core::node::NodeRegister;

mod prompt_metadata_embedder;
pub use prompt_metadata_embedder::{PromptMetadataEmbedder, embed_prompt_metadata};

/// 图片模块
pub fn submodule(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    let submodule = PyModule::new(py, "image")?;
    submodule.add_class::<PromptMetadataEmbedder>()?;
    submodule.add_function(wrap_pyfunction!(embed_prompt_metadata, &submodule)?)?;
    Ok(submodule)
}

/// Image node register
pub fn node_register(py: Python<'_>) -> PyResult<Vec<NodeRegister<'_>>> {
    let nodes: Vec<NodeRegister> = vec![NodeRegister(
        "PromptMetadataEmbedder",
        py.get_type::<PromptMetadataEmbedder>(),
        "Prompt Metadata Embedder",
    )];
    Ok(nodes)
}
