//! 扩展入口
//!
//! 网页加载时：
//! init → beforeRegisterNodeDef → registerCustomNodes → nodeCreated → loadedGraphNode → setup
//!
//! 加载工作流时：
//! nodeCreated → loadedGraphNode
//!
//! 添加新节点时：
//! nodeCreated
//!

use std::fmt;

use js_sys::{Object, Reflect};
use wasm_bindgen::{
    JsValue,
    prelude::{Closure, wasm_bindgen},
};
use web_sys::console;

use crate::{ComfyApp, Node, NodeData, NodeType};

/// 扩展
#[wasm_bindgen]
#[derive(Clone)]
pub struct Extension {
    /// 扩展名称, 需要唯一
    #[wasm_bindgen(skip)]
    pub name: String,
    // 扩展对象
    extension: Object,
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Extension {{ extension: Object, name: {} }}", self.name)
    }
}

impl Extension {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            extension: Object::new(),
        }
    }

    /// 获取扩展对象
    pub fn as_js_value(&self) -> JsValue {
        self.extension.clone().into()
    }

    /// 钩子是否已设置
    pub fn has_hook(&self, hook: &str) -> bool {
        Reflect::get(&self.extension, &hook.into())
            .map(|v| v.is_function())
            .unwrap_or(false)
    }
}

/// Comfy 钩子（Hooks）
impl Extension {
    /// 设置init钩子
    ///
    /// async init()
    pub fn init<F>(&mut self, handler: F) -> Result<(), JsValue>
    where
        F: FnOnce() -> Result<(), JsValue> + 'static,
    {
        let handler = Closure::once_into_js(move || {
            if let Err(e) = handler() {
                console::error_1(&e);
            }
            JsValue::undefined()
        });

        Reflect::set(&self.extension, &"init".into(), &handler)?;

        Ok(())
    }

    /// 设置beforeRegisterNodeDef钩子
    ///
    /// async beforeRegisterNodeDef(nodeType, nodeData, app)
    pub fn before_register_node_def<F>(&mut self, handler: F) -> Result<(), JsValue>
    where
        F: Fn(NodeType, NodeData, ComfyApp) -> Result<JsValue, JsValue> + 'static,
    {
        let handler = Closure::wrap(Box::new(
            move |node_type: Object, node_data: Object, app: Object| {
                let node_type = NodeType::new(node_type);
                let node_data = NodeData::new(node_data);
                let app = ComfyApp::from_app(app);
                handler(node_type, node_data, app)
            },
        )
            as Box<dyn Fn(Object, Object, Object) -> Result<JsValue, JsValue>>);

        Reflect::set(
            &self.extension,
            &"beforeRegisterNodeDef".into(),
            &handler.as_ref().clone(),
        )?;

        // 保持闭包生命周期
        handler.forget();

        Ok(())
    }

    /// 设置loadedGraphNode钩子
    ///
    /// loadedGraphNode(node, app)
    ///
    /// 工作流中保存的部件值已恢复
    pub fn loaded_graph_node<F>(&mut self, handler: F) -> Result<(), JsValue>
    where
        F: Fn(Node, ComfyApp) -> Result<JsValue, JsValue> + 'static,
    {
        let handler = Closure::wrap(Box::new(move |node: Object, app: Object| {
            handler(Node::new(node), ComfyApp::from_app(app))
        })
            as Box<dyn Fn(Object, Object) -> Result<JsValue, JsValue>>);

        Reflect::set(
            &self.extension,
            &"loadedGraphNode".into(),
            &handler.as_ref().clone(),
        )?;

        // 保持闭包生命周期
        handler.forget();

        Ok(())
    }

    /// 设置setup钩子
    ///
    /// async setup()
    ///
    /// 启动流程结束时调用, 只调用一次
    pub fn setup<F>(&mut self, handler: F) -> Result<(), JsValue>
    where
        F: FnOnce() -> Result<(), JsValue> + 'static,
    {
        let js_func = Closure::once_into_js(move || {
            if let Err(e) = handler() {
                console::error_1(&e);
            }
            JsValue::undefined()
        });

        Reflect::set(&self.extension, &"setup".into(), &js_func)?;

        Ok(())
    }
}
