//! 反向提示词预设同步
//!
//! 模型类型切换时, 若反向提示词仍是预设值(或为空白)则替换为新类型的预设;
//! 用户自己填写的内容不会被覆盖。

use std::{fmt, str::FromStr};

use tracing::debug;

use crate::{
    error::{Error, Result},
    presets::{is_preset_value, preset_or_empty},
    types::ModelType,
};

pub const MODEL_TYPE_FIELD: &str = "model_type";
pub const NEGATIVE_FIELD: &str = "negative_text";

/// 反向提示词输入框的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    /// 用户自定义内容
    UserOwned,
    /// 空白或任意模型的预设值
    PresetTracking,
}

impl FieldState {
    /// 根据当前值判断
    ///
    /// 与其他模型预设恰好相同的值也视为预设
    pub fn classify(value: &str) -> Self {
        if is_preset_value(value) {
            FieldState::PresetTracking
        } else {
            FieldState::UserOwned
        }
    }
}

/// 节点输入框的读写接口
pub trait FieldHost {
    fn field_value(&self, name: &str) -> Result<String>;

    fn set_field_value(&mut self, name: &str, value: &str) -> Result<()>;
}

/// 同步结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// 写入了新的预设
    Applied { model_type: ModelType, value: String },
    /// 用户内容, 未修改
    Kept,
}

/// 反向提示词预设同步
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegativePresetSync {
    model_type_field: String,
    negative_field: String,
}

impl Default for NegativePresetSync {
    fn default() -> Self {
        Self::new(MODEL_TYPE_FIELD, NEGATIVE_FIELD)
    }
}

impl NegativePresetSync {
    pub fn new(model_type_field: impl Into<String>, negative_field: impl Into<String>) -> Self {
        Self {
            model_type_field: model_type_field.into(),
            negative_field: negative_field.into(),
        }
    }

    pub fn model_type_field(&self) -> &str {
        &self.model_type_field
    }

    pub fn negative_field(&self) -> &str {
        &self.negative_field
    }

    /// 模型类型下拉框变化
    pub fn on_model_type_changed<H: FieldHost + ?Sized>(
        &self,
        host: &mut H,
        model_type: &str,
    ) -> Result<SyncOutcome> {
        let model_type = ModelType::from_str(model_type.trim())
            .map_err(|_| Error::InvalidParameter(format!("unknown model type: {model_type}")))?;
        self.apply(host, model_type)
    }

    /// 节点创建后执行一次同步
    ///
    /// 模型类型无法解析时按默认的 SDXL 处理
    pub fn on_created<H: FieldHost + ?Sized>(&self, host: &mut H) -> Result<SyncOutcome> {
        let value = host.field_value(&self.model_type_field)?;
        let model_type = ModelType::from_str(value.trim()).unwrap_or_else(|_| {
            debug!("unknown model type {value:?}, using {}", ModelType::default());
            ModelType::default()
        });
        self.apply(host, model_type)
    }

    /// 按模型类型写入预设
    pub fn apply<H: FieldHost + ?Sized>(
        &self,
        host: &mut H,
        model_type: ModelType,
    ) -> Result<SyncOutcome> {
        let current = host.field_value(&self.negative_field)?;
        match FieldState::classify(&current) {
            FieldState::UserOwned => Ok(SyncOutcome::Kept),
            FieldState::PresetTracking => {
                let value = preset_or_empty(model_type);
                if current != value {
                    host.set_field_value(&self.negative_field, value)?;
                }
                Ok(SyncOutcome::Applied {
                    model_type,
                    value: value.to_string(),
                })
            }
        }
    }
}

type Handler<'a, A, E> = Box<dyn Fn(&A) -> std::result::Result<(), E> + 'a>;

/// 回调链
///
/// 按注册顺序执行, 遇到第一个错误即停止
pub struct HandlerList<'a, A, E> {
    handlers: Vec<Handler<'a, A, E>>,
}

impl<A, E> Default for HandlerList<'_, A, E> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<A, E> fmt::Debug for HandlerList<'_, A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerList")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl<'a, A, E> HandlerList<'a, A, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<F>(&mut self, handler: F)
    where
        F: Fn(&A) -> std::result::Result<(), E> + 'a,
    {
        self.handlers.push(Box::new(handler));
    }

    pub fn with<F>(mut self, handler: F) -> Self
    where
        F: Fn(&A) -> std::result::Result<(), E> + 'a,
    {
        self.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn dispatch(&self, arg: &A) -> std::result::Result<(), E> {
        for handler in &self.handlers {
            handler(arg)?;
        }
        Ok(())
    }
}
