//! Prompt Server

use pyo3::{
    PyResult, PyTypeInfo, Python,
    types::{PyAnyMethods, PyDict, PyDictMethods, PyModule},
};

/// 前端事件名称
pub const EVENT_ERROR: &str = "gemini_prompt_enhancer.error";
pub const EVENT_WARNING: &str = "gemini_prompt_enhancer.warning";

/// comfyui PromptServer wrapper
pub trait PromptServer: PyTypeInfo {
    /// 节点执行出现异常时通知前端
    fn send_error(&self, py: Python, error_type: String, message: String) -> PyResult<()> {
        self.send_event(py, EVENT_ERROR, &error_type, &message)
    }

    /// 非致命的提示, 节点仍然正常输出
    fn send_warning(&self, py: Python, warning_type: &str, message: &str) -> PyResult<()> {
        self.send_event(py, EVENT_WARNING, warning_type, message)
    }

    fn send_event(&self, py: Python, event: &str, kind: &str, message: &str) -> PyResult<()> {
        let server = PyModule::import(py, "server")?
            .getattr("PromptServer")?
            .getattr("instance")?;

        let data = PyDict::new(py);
        data.set_item("type", kind)?;
        data.set_item("node", self.get_class_name(py)?)?;
        data.set_item("message", message)?;

        server.getattr("send_sync")?.call1((event, data))?;
        Ok(())
    }

    /// Class 名称
    fn get_class_name(&self, py: Python) -> PyResult<String> {
        Self::type_object(py)
            .getattr("__name__")?
            .extract::<String>()
    }
}
