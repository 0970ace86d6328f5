//! 错误处理

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("strum error, {0}")]
    ParseEnumString(String),

    #[error(transparent)]
    PromptCoreError(#[from] prompt_core::Error),

    #[error("py error, {0}")]
    PyErr(#[from] pyo3::PyErr),
    #[error("pythonize error, {0}")]
    PythonizeError(#[from] pythonize::PythonizeError),
}

impl From<strum::ParseError> for Error {
    fn from(e: strum::ParseError) -> Self {
        Error::ParseEnumString(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use prompt_core::ModelType;

    use super::*;

    #[test]
    fn test_unknown_model_type() {
        let e = Error::from(ModelType::from_str("SD3").unwrap_err());
        assert!(matches!(e, Error::ParseEnumString(_)));
    }

    #[test]
    fn test_core_error_is_transparent() {
        let e = Error::from(prompt_core::Error::InvalidParameter("model".to_string()));
        assert_eq!(e.to_string(), "Invalid parameter: model");
    }
}
