//! 错误类型定义

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// 提示词增强错误类型
#[derive(Debug, Error)]
pub enum Error {
    // ==================== 远程调用错误 ====================
    #[error("Authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Content blocked: {reason}")]
    ContentBlocked { reason: String },

    // ==================== 输入错误 ====================
    #[error("Empty input: {field}")]
    EmptyInput { field: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    // ==================== 图像元数据错误 ====================
    #[error("png encoding error, {0}")]
    Png(#[from] png::EncodingError),

    #[error("png decoding error, {0}")]
    PngDecode(#[from] png::DecodingError),

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    // ==================== IO和序列化错误 ====================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl Error {
    /// 是否可以重试
    ///
    /// 只有网络层面的失败才会重试, 鉴权/限流/响应格式错误重试无意义
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::NetworkFailure(_))
    }

    /// 错误类别标识, 用于前端提示
    pub fn kind(&self) -> &'static str {
        match self {
            Error::AuthenticationFailure(_) => "authentication_failure",
            Error::NetworkFailure(_) => "network_failure",
            Error::RateLimited(_) => "rate_limited",
            Error::MalformedResponse(_) => "malformed_response",
            Error::ContentBlocked { .. } => "content_blocked",
            Error::EmptyInput { .. } => "empty_input",
            Error::InvalidParameter(_) => "invalid_parameter",
            Error::UnknownField(_) => "unknown_field",
            Error::Png(_) | Error::PngDecode(_) | Error::UnsupportedImage(_) => "image",
            Error::Io(_) => "io",
            Error::Serde(_) => "serde",
        }
    }
}

#[cfg(feature = "client")]
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return Error::MalformedResponse(e.to_string());
        }
        Error::NetworkFailure(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_failure_is_retryable() {
        assert!(Error::NetworkFailure("reset".to_string()).is_retryable());
        assert!(!Error::AuthenticationFailure("bad key".to_string()).is_retryable());
        assert!(!Error::RateLimited("quota".to_string()).is_retryable());
        assert!(!Error::MalformedResponse("{}".to_string()).is_retryable());
    }

    #[test]
    fn test_kind() {
        let err = Error::EmptyInput {
            field: "text".to_string(),
        };
        assert_eq!(err.kind(), "empty_input");
        assert_eq!(err.to_string(), "Empty input: text");
    }
}
