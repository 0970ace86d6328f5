//! CLIP Object for comfyui

use pyo3::{
    Bound, PyAny, Python,
    types::{PyAnyMethods, PyDict, PyDictMethods, PyList},
};

use crate::error::Error;

/// CLIP
#[derive(Debug)]
pub struct Clip<'py> {
    clip: Bound<'py, PyAny>,
}

impl<'py> Clip<'py> {
    pub fn new(clip: Bound<'py, PyAny>) -> Self {
        Self { clip }
    }

    /// 文本编码为 CONDITIONING
    ///
    /// 返回 `[[cond, {"pooled_output": pooled}]]`
    pub fn encode(&self, py: Python<'py>, text: &str) -> Result<Bound<'py, PyAny>, Error> {
        let tokens = self.clip.call_method1("tokenize", (text,))?;

        let kwargs = PyDict::new(py);
        kwargs.set_item("return_pooled", true)?;
        let output = self
            .clip
            .call_method("encode_from_tokens", (tokens,), Some(&kwargs))?;
        let (cond, pooled): (Bound<'py, PyAny>, Bound<'py, PyAny>) = output.extract()?;

        let extra = PyDict::new(py);
        extra.set_item("pooled_output", pooled)?;

        let item = PyList::new(py, [cond, extra.into_any()])?;
        let conditioning = PyList::new(py, [item])?;
        Ok(conditioning.into_any())
    }
}
