//! 节点类型的对象

use js_sys::{Object, Reflect};
use wasm_bindgen::{JsValue, prelude::wasm_bindgen};

use crate::LGraphNode;

/// 节点类型封装
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct NodeType {
    inner: Object,
}

#[wasm_bindgen]
impl NodeType {
    #[wasm_bindgen(constructor)]
    pub fn new(inner: Object) -> Self {
        Self { inner }
    }

    /// 获取inner对象
    pub fn get_inner(&self) -> Object {
        self.inner.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn prototype(&self) -> Result<LGraphNode, JsValue> {
        let prototype: JsValue = Reflect::get(&self.inner, &"prototype".into())?;
        Ok(LGraphNode::new(prototype))
    }
}

impl From<NodeType> for Object {
    fn from(node_type: NodeType) -> Self {
        node_type.get_inner()
    }
}
