//! comfy 模块包装

mod clip;
pub use clip::Clip;
