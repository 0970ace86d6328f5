//! 包含节点信息的对象
use js_sys::{Object, Reflect};
use wasm_bindgen::{JsValue, prelude::wasm_bindgen};

/// 节点数据封装
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct NodeData {
    inner: Object,
}

#[wasm_bindgen]
impl NodeData {
    #[wasm_bindgen(constructor)]
    pub fn new(inner: Object) -> Self {
        Self { inner }
    }

    /// 获取inner对象
    fn get_inner(&self) -> Object {
        self.inner.clone()
    }
}

#[wasm_bindgen]
impl NodeData {
    #[wasm_bindgen(getter)]
    pub fn name(&self) -> Result<String, JsValue> {
        Reflect::get(&self.inner, &"name".into()).and_then(|v| v.as_string().ok_or(JsValue::NULL))
    }
}

impl From<NodeData> for Object {
    fn from(value: NodeData) -> Self {
        value.get_inner()
    }
}
