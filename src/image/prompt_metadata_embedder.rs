//! 提示词元数据写入
//!
//! 图片原样输出, 提示词写入 extra_pnginfo, 由保存节点写入每张图片

use log::{error, info};
use pyo3::{
    Bound, Py, PyAny, PyErr, PyResult, Python,
    exceptions::PyRuntimeError,
    pyclass, pyfunction, pymethods,
    types::{PyBytes, PyDict, PyDictMethods, PyType},
};
use pythonize::pythonize;

use prompt_core::{
    MetadataRecord, embed_png_text, merge_metadata_pretty, metadata::METADATA_KEY,
};

use crate::{
    core::{
        category::CATEGORY_IMAGE,
        node_base::{InputSpec, InputType},
    },
    error::Error,
    wrapper::comfyui::{
        PromptServer,
        types::{HIDDEN_EXTRA_PNGINFO, NODE_IMAGE, NODE_STRING},
    },
};

/// 提示词元数据写入
#[pyclass(subclass)]
pub struct PromptMetadataEmbedder {}

impl PromptServer for PromptMetadataEmbedder {}

#[pymethods]
impl PromptMetadataEmbedder {
    #[new]
    fn new() -> Self {
        Self {}
    }

    #[classattr]
    #[pyo3(name = "INPUT_IS_LIST")]
    fn input_is_list() -> bool {
        false
    }

    #[classattr]
    #[pyo3(name = "RETURN_TYPES")]
    fn return_types() -> (&'static str, &'static str) {
        (NODE_IMAGE, NODE_STRING)
    }

    #[classattr]
    #[pyo3(name = "RETURN_NAMES")]
    fn return_names() -> (&'static str, &'static str) {
        ("images", "metadata")
    }

    #[classattr]
    #[pyo3(name = "CATEGORY")]
    const CATEGORY: &'static str = CATEGORY_IMAGE;

    #[classattr]
    #[pyo3(name = "DESCRIPTION")]
    fn description() -> &'static str {
        "Attach the original, enhanced and negative prompts to the image metadata. Images pass through unchanged."
    }

    #[classattr]
    #[pyo3(name = "FUNCTION")]
    const FUNCTION: &'static str = "execute";

    #[classmethod]
    #[pyo3(name = "INPUT_TYPES")]
    fn input_types(_cls: &Bound<'_, PyType>) -> PyResult<Py<PyDict>> {
        InputSpec::new()
            .with_required("images", InputType::image())
            .with_required(
                "enhanced_prompt",
                InputType::string()
                    .multiline(true)
                    .force_input(true)
                    .tooltip("The enhanced positive prompt"),
            )
            .with_optional(
                "original_prompt",
                InputType::string()
                    .multiline(true)
                    .force_input(true)
                    .tooltip("The prompt before enhancement"),
            )
            .with_optional(
                "negative_prompt",
                InputType::string()
                    .multiline(true)
                    .force_input(true)
                    .tooltip("The negative prompt"),
            )
            .with_optional(
                "metadata",
                InputType::string()
                    .multiline(true)
                    .default("{}")
                    .tooltip("Existing metadata as a JSON object"),
            )
            .with_hidden("extra_pnginfo", InputType::hidden(HIDDEN_EXTRA_PNGINFO))
            .build()
    }

    #[allow(clippy::too_many_arguments)]
    #[pyo3(
        name = "execute",
        signature = (images, enhanced_prompt, original_prompt = String::new(), negative_prompt = String::new(), metadata = "{}".to_string(), extra_pnginfo = None)
    )]
    fn execute<'py>(
        &mut self,
        py: Python<'py>,
        images: Bound<'py, PyAny>,
        enhanced_prompt: String,
        original_prompt: String,
        negative_prompt: String,
        metadata: String,
        extra_pnginfo: Option<Bound<'py, PyDict>>,
    ) -> PyResult<(Bound<'py, PyAny>, String)> {
        let record = MetadataRecord::new(original_prompt, enhanced_prompt, negative_prompt);

        match self.embed(py, &record, &metadata, extra_pnginfo) {
            Ok(metadata) => Ok((images, metadata)),
            Err(e) => {
                error!("PromptMetadataEmbedder error, {e}");
                if let Err(e) =
                    self.send_error(py, "PromptMetadataEmbedder".to_string(), e.to_string())
                {
                    error!("send error failed, {e}");
                };
                Err(PyErr::new::<PyRuntimeError, _>(e.to_string()))
            }
        }
    }
}

impl PromptMetadataEmbedder {
    /// 合并元数据并写入 extra_pnginfo
    fn embed<'py>(
        &self,
        py: Python<'py>,
        record: &MetadataRecord,
        metadata: &str,
        extra_pnginfo: Option<Bound<'py, PyDict>>,
    ) -> Result<String, Error> {
        let merged = merge_metadata_pretty(metadata, record)?;

        match extra_pnginfo {
            Some(extra_pnginfo) => {
                extra_pnginfo.set_item(METADATA_KEY, pythonize(py, &record.to_value())?)?;
            }
            None => info!("extra_pnginfo is not available, metadata is only returned as text"),
        }

        Ok(merged)
    }
}

/// 向 PNG 写入提示词文本块, 像素数据不变
#[pyfunction]
pub fn embed_prompt_metadata<'py>(
    py: Python<'py>,
    png_bytes: &[u8],
    enhanced: &str,
    original: &str,
    negative: &str,
) -> PyResult<Bound<'py, PyBytes>> {
    let record = MetadataRecord::new(original, enhanced, negative);
    let output = py
        .detach(|| embed_png_text(png_bytes, &record))
        .map_err(|e| {
            error!("embed prompt metadata failed, {e}");
            PyErr::new::<PyRuntimeError, _>(e.to_string())
        })?;
    Ok(PyBytes::new(py, &output))
}
