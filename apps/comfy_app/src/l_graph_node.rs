use js_sys::{Function, Object, Reflect};
use wasm_bindgen::{
    JsCast, JsValue,
    prelude::{Closure, wasm_bindgen},
};

use crate::Node;

/// 节点原型
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct LGraphNode {
    inner: JsValue,
}

#[wasm_bindgen]
impl LGraphNode {
    #[wasm_bindgen(constructor)]
    pub fn new(inner: JsValue) -> Self {
        Self { inner }
    }

    /// 获取inner对象
    pub fn get_inner(&self) -> JsValue {
        self.inner.clone()
    }
}

impl LGraphNode {
    /// 设置onNodeCreated钩子
    ///
    /// binding: onNodeCreated
    ///
    /// 先调用原型上已有的 onNodeCreated, 再调用 handler
    ///
    /// Args:
    /// * this: 新创建的节点实例
    pub fn on_node_created<F>(&self, handler: F) -> Result<(), JsValue>
    where
        F: Fn(Node) -> Result<(), JsValue> + 'static,
    {
        let previous = Reflect::get(&self.inner, &"onNodeCreated".into())?;
        let previous = match previous.dyn_into::<Function>() {
            Ok(f) => f.into(),
            Err(_) => JsValue::NULL,
        };

        let rust_handler = Closure::wrap(Box::new(move |this: Object| handler(Node::new(this)))
            as Box<dyn Fn(Object) -> Result<(), JsValue>>);

        // 创建 JavaScript 包装函数, 用于透传 this 对象到rust的闭包
        let wrapper_js = r#"
            return function(...args) {
                const result = previous ? previous.apply(this, args) : undefined;
                try {
                    rustHandler(this);
                } catch (e) {
                    console.error("Error in onNodeCreated:", e);
                }
                return result;
            };
        "#;

        let create_wrapper = Function::new_with_args("rustHandler, previous", wrapper_js);
        let wrapper = create_wrapper
            .call2(&JsValue::NULL, &rust_handler.as_ref().clone(), &previous)?
            .dyn_into::<Function>()?;

        Reflect::set(&self.inner, &"onNodeCreated".into(), &wrapper)?;

        // 保持闭包生命周期
        rust_handler.forget();

        Ok(())
    }
}
