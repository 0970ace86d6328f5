//! 客户端配置
//!
//! 默认值可被环境变量覆盖:
//! - `GEMINI_API_BASE`
//! - `GEMINI_TIMEOUT_SECS`
//! - `GEMINI_MAX_RETRIES`

use std::{env, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// 输入框中的占位 key, 视为未填写
pub const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// 远程客户端配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API 地址
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// 请求超时(秒)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 连接超时(秒)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// 网络失败时的重试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 重试间隔(毫秒)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    500
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl ClientConfig {
    /// 从环境变量加载, 未设置的项使用默认值
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(api_base) = non_empty_env("GEMINI_API_BASE") {
            config = config.with_api_base(api_base);
        }
        if let Some(timeout_secs) = parse_env::<u64>("GEMINI_TIMEOUT_SECS") {
            config.timeout_secs = timeout_secs;
        }
        if let Some(max_retries) = parse_env::<u32>("GEMINI_MAX_RETRIES") {
            config.max_retries = max_retries;
        }

        config
    }

    /// 设置 API 地址, 去掉末尾的 `/`
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_connect_timeout_secs(mut self, connect_timeout_secs: u64) -> Self {
        self.connect_timeout_secs = connect_timeout_secs;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_backoff_ms(mut self, retry_backoff_ms: u64) -> Self {
        self.retry_backoff_ms = retry_backoff_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// 解析节点上填写的 API key
///
/// 为空或为占位符时返回 None, 不读取环境变量
pub fn resolve_api_key(api_key: &str) -> Option<String> {
    let api_key = api_key.trim();
    if api_key.is_empty() || api_key == API_KEY_PLACEHOLDER {
        return None;
    }
    Some(api_key.to_string())
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    let value = non_empty_env(key)?;
    match value.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring invalid value for {key}: {value}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_retries, 1);
    }

    #[test]
    fn test_builder_trims_api_base() {
        let config = ClientConfig::default()
            .with_api_base("http://127.0.0.1:8080/v1beta/ ")
            .with_max_retries(0);
        assert_eq!(config.api_base, "http://127.0.0.1:8080/v1beta");
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_deserialize_partial() -> anyhow::Result<()> {
        let config: ClientConfig = serde_json::from_str(r#"{"timeout_secs": 5}"#)?;
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        Ok(())
    }

    #[test]
    fn test_explicit_api_key_is_trimmed() {
        assert_eq!(resolve_api_key("  abc  "), Some("abc".to_string()));
    }

    #[test]
    fn test_empty_api_key_ignores_env() {
        // SAFETY: 只有该测试读写 GEMINI_API_KEY
        unsafe { env::set_var("GEMINI_API_KEY", "from-env") };

        assert_eq!(resolve_api_key(""), None);
        assert_eq!(resolve_api_key("   "), None);
        assert_eq!(resolve_api_key(API_KEY_PLACEHOLDER), None);

        unsafe { env::remove_var("GEMINI_API_KEY") };
    }

    #[test]
    fn test_from_env_trims_api_base() {
        // SAFETY: 只有该测试读写 GEMINI_API_BASE
        unsafe { env::set_var("GEMINI_API_BASE", "http://127.0.0.1:9000/v1beta/") };
        let config = ClientConfig::from_env();
        unsafe { env::remove_var("GEMINI_API_BASE") };

        assert_eq!(config.api_base, "http://127.0.0.1:9000/v1beta");
        assert_eq!(config.retry_backoff_ms, 500);
    }
}
