//! 类型定义
//! 相关节点定义: ComfyUI/comfy/comfy_types/node_typing.py

pub const NODE_INT: &str = "INT";
pub const NODE_FLOAT: &str = "FLOAT";
pub const NODE_STRING: &str = "STRING";
pub const NODE_BOOLEAN: &str = "BOOLEAN";
pub const NODE_IMAGE: &str = "IMAGE";
pub const NODE_CLIP: &str = "CLIP";
pub const NODE_CONDITIONING: &str = "CONDITIONING";

/// 隐藏输入: 工作流信息, 保存图片时会写入 PNG
pub const HIDDEN_EXTRA_PNGINFO: &str = "EXTRA_PNGINFO";

pub const NODE_SEED_MAX: u64 = 10000000;
