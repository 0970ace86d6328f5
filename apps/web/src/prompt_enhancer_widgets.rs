//! Gemini 提示词增强节点的前端部件
//!
//! - 模型类型切换时同步反向提示词预设
//! - api_key 掩码显示
//! - 提示词文本框自适应高度

use std::{cell::Cell, rc::Rc};

use js_sys::{Function, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue, prelude::Closure};
use web_sys::{HtmlInputElement, HtmlTextAreaElement, console, window};

use comfy_app::{Node, NodeType, WidgetValue};
use prompt_core::{
    Error as CoreError, FieldHost, HandlerList, NegativePresetSync, SyncOutcome,
    preset_sync::NEGATIVE_FIELD,
    widget::{auto_grow_rows, mask_secret},
};

const API_KEY_FIELD: &str = "api_key";
const API_KEY_INPUT: &str = "api_key_input";
const API_KEY_TOGGLE: &str = "api_key_toggle";
const API_KEY_PLACEHOLDER: &str = "API key";
/// 切换按钮上显示的掩码长度
const API_KEY_PREVIEW_CHARS: usize = 8;

const AUTO_GROW_FIELDS: [&str; 2] = ["text", NEGATIVE_FIELD];
const MIN_ROWS: usize = 3;
const MAX_ROWS: usize = 16;
const CHAR_WIDTH_PX: i32 = 7;
const LINE_HEIGHT_PX: usize = 18;

/// 节点输入框读写
struct NodeFields<'a> {
    node: &'a Node,
}

impl<'a> NodeFields<'a> {
    fn new(node: &'a Node) -> Self {
        Self { node }
    }
}

impl FieldHost for NodeFields<'_> {
    fn field_value(&self, name: &str) -> prompt_core::Result<String> {
        let value = self
            .node
            .widget_value(name)
            .map_err(|e| CoreError::UnknownField(format!("{name}, {e:?}")))?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn set_field_value(&mut self, name: &str, value: &str) -> prompt_core::Result<()> {
        self.node
            .set_widget_value(name, &WidgetValue::from(value))
            .map_err(|e| CoreError::InvalidParameter(format!("{name}, {e:?}")))?;

        // value setter 不触发 input 事件
        if let Ok(Some(textarea)) = textarea_of(self.node, name) {
            resize_textarea(&textarea);
        }
        Ok(())
    }
}

pub struct PromptEnhancerWidgets {}

impl PromptEnhancerWidgets {
    pub const NODE_NAME: &'static str = "GeminiPromptEnhancer";

    /// 注册节点创建钩子
    pub fn on_node_created(node_type: &NodeType) -> Result<(), JsValue> {
        node_type.prototype()?.on_node_created(|node| {
            Self::setup(&node);
            Ok(())
        })
    }

    /// 工作流加载完成, 部件值已恢复
    pub fn on_loaded(node: &Node) -> Result<(), JsValue> {
        let api_key = node.widget_value(API_KEY_FIELD)?;
        let api_key = api_key.as_str().unwrap_or_default();

        if let Some(input) = node
            .widget_input_element(API_KEY_INPUT)?
            .and_then(|v| v.dyn_into::<HtmlInputElement>().ok())
        {
            input.set_value(api_key);
            let visible = input.type_() == "text";
            Reflect::set(
                &node.widget(API_KEY_TOGGLE)?.into(),
                &"label".into(),
                &toggle_label(api_key, visible).into(),
            )?;
        }

        for name in AUTO_GROW_FIELDS {
            if let Some(textarea) = textarea_of(node, name)? {
                resize_textarea(&textarea);
            }
        }
        node.set_dirty_canvas()
    }

    /// 新建节点时初始化各部件, 单个部件失败不影响其他部件
    fn setup(node: &Node) {
        let steps: [(&str, fn(&Node) -> Result<(), JsValue>); 4] = [
            ("sync negative preset", Self::sync_on_created),
            ("chain model_type callback", Self::chain_model_type_callback),
            ("mask api_key", Self::mask_api_key),
            ("auto grow textareas", Self::auto_grow_textareas),
        ];

        for (name, step) in steps {
            if let Err(e) = step(node) {
                console::error_2(&format!("🔗 {} {name} failed", Self::NODE_NAME).into(), &e);
            }
        }

        if let Err(e) = node.fit_size() {
            console::error_1(&e);
        }
    }

    /// 按当前模型类型填充预设
    fn sync_on_created(node: &Node) -> Result<(), JsValue> {
        let outcome = NegativePresetSync::default()
            .on_created(&mut NodeFields::new(node))
            .map_err(to_js_error)?;
        log_outcome(&outcome);
        Ok(())
    }

    /// 模型类型下拉框回调
    ///
    /// 先执行部件原有的回调, 再同步反向提示词
    fn chain_model_type_callback(node: &Node) -> Result<(), JsValue> {
        let sync = NegativePresetSync::default();
        let field = sync.model_type_field().to_string();

        let mut handlers: HandlerList<'static, WidgetValue, JsValue> = HandlerList::new();

        if let Some(previous) = node.widget_callback(&field)? {
            let widget = node.widget(&field)?;
            let this = node.get_inner();
            handlers.push(move |value: &WidgetValue| {
                previous
                    .call3(&widget, &value.to_js(), &JsValue::NULL, &this)
                    .map(|_| ())
            });
        }

        let host = node.clone();
        handlers.push(move |value: &WidgetValue| {
            let model_type = value.as_str().unwrap_or_default();
            let outcome = sync
                .on_model_type_changed(&mut NodeFields::new(&host), model_type)
                .map_err(to_js_error)?;
            log_outcome(&outcome);
            host.set_dirty_canvas()
        });

        node.set_widget_callback(&field, move |value| handlers.dispatch(&value))
    }

    /// 隐藏原始的 api_key 文本框, 用密码输入框代替显示
    ///
    /// 原部件仍保存真实值, 随工作流序列化和提交
    fn mask_api_key(node: &Node) -> Result<(), JsValue> {
        let document = window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("document not found"))?;

        let api_key = node.widget_value(API_KEY_FIELD)?;
        let api_key = api_key.as_str().unwrap_or_default().to_string();

        let input = document
            .create_element("input")?
            .dyn_into::<HtmlInputElement>()?;
        input.set_type("password");
        input.set_placeholder(API_KEY_PLACEHOLDER);
        input.set_autocomplete("off");
        input.set_value(&api_key);
        input.style().set_property("width", "100%")?;

        // 输入同步到原部件
        let source = input.clone();
        let host = node.clone();
        let on_input = Closure::wrap(Box::new(move || {
            let value = WidgetValue::from(source.value());
            if let Err(e) = host.set_widget_value(API_KEY_FIELD, &value) {
                console::error_1(&e);
            }
        }) as Box<dyn Fn()>);
        input.add_event_listener_with_callback("input", on_input.as_ref().unchecked_ref())?;
        on_input.forget();

        node.hide_widget(API_KEY_FIELD)?;

        let dom_widget =
            node.add_dom_widget(API_KEY_INPUT, "password", &input, Object::new().into())?;
        Reflect::set(&dom_widget, &"serialize".into(), &JsValue::FALSE)?;
        node.move_widget_after(API_KEY_INPUT, API_KEY_FIELD)?;

        // 显示/隐藏切换
        let visible = Rc::new(Cell::new(false));
        let target = input.clone();
        let on_toggle = Closure::wrap(Box::new(move |widget: JsValue| {
            let next = !visible.get();
            visible.set(next);
            target.set_type(if next { "text" } else { "password" });

            let label = toggle_label(&target.value(), next);
            if let Err(e) = Reflect::set(&widget, &"label".into(), &label.into()) {
                console::error_1(&e);
            }
        }) as Box<dyn Fn(JsValue)>);

        let callback: &Function = on_toggle.as_ref().unchecked_ref();
        let toggle = node.add_widget(
            "button",
            API_KEY_TOGGLE,
            JsValue::NULL,
            Some(callback),
            Object::new().into(),
        )?;
        on_toggle.forget();

        Reflect::set(&toggle, &"label".into(), &toggle_label(&api_key, false).into())?;
        Reflect::set(&toggle, &"serialize".into(), &JsValue::FALSE)?;
        node.move_widget_after(API_KEY_TOGGLE, API_KEY_INPUT)?;

        Ok(())
    }

    /// 提示词文本框随内容增高
    fn auto_grow_textareas(node: &Node) -> Result<(), JsValue> {
        for name in AUTO_GROW_FIELDS {
            let Some(textarea) = textarea_of(node, name)? else {
                continue;
            };

            let source = textarea.clone();
            let on_input =
                Closure::wrap(Box::new(move || resize_textarea(&source)) as Box<dyn Fn()>);
            textarea.add_event_listener_with_callback("input", on_input.as_ref().unchecked_ref())?;
            on_input.forget();

            resize_textarea(&textarea);
        }
        Ok(())
    }
}

fn textarea_of(node: &Node, name: &str) -> Result<Option<HtmlTextAreaElement>, JsValue> {
    Ok(node
        .widget_input_element(name)?
        .and_then(|v| v.dyn_into::<HtmlTextAreaElement>().ok()))
}

fn resize_textarea(textarea: &HtmlTextAreaElement) {
    // 尚未布局时宽度为 0
    let cols = match textarea.client_width() {
        width if width > 0 => (width / CHAR_WIDTH_PX) as usize,
        _ => textarea.cols() as usize,
    };

    let rows = auto_grow_rows(&textarea.value(), cols, MIN_ROWS, MAX_ROWS);
    textarea.set_rows(rows as u32);
    if let Err(e) = textarea
        .style()
        .set_property("min-height", &format!("{}px", rows * LINE_HEIGHT_PX))
    {
        console::error_1(&e);
    }
}

fn toggle_label(api_key: &str, visible: bool) -> String {
    if visible {
        return "🔓 hide api key".to_string();
    }

    let preview: String = api_key.chars().take(API_KEY_PREVIEW_CHARS).collect();
    if preview.is_empty() {
        "🔒 show api key".to_string()
    } else {
        format!("🔒 show api key {}", mask_secret(&preview, false))
    }
}

fn log_outcome(outcome: &SyncOutcome) {
    if let SyncOutcome::Applied { model_type, .. } = outcome {
        console::log_1(&format!("🔗 negative preset applied for {model_type}").into());
    }
}

fn to_js_error(e: CoreError) -> JsValue {
    JsValue::from_str(&e.to_string())
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use js_sys::Array;
    use prompt_core::{
        ModelType,
        presets::{SDXL_NEGATIVE, negative_preset},
    };
    use wasm_bindgen_test::wasm_bindgen_test;

    use super::*;

    fn mock_node(model_type: &str, negative: &str) -> Result<Node, JsValue> {
        let node = Object::new();
        let widgets = Array::new();
        for (name, value) in [("model_type", model_type), (NEGATIVE_FIELD, negative)] {
            let widget = Object::new();
            Reflect::set(&widget, &"name".into(), &name.into())?;
            Reflect::set(&widget, &"value".into(), &value.into())?;
            widgets.push(&widget);
        }
        Reflect::set(&node, &"widgets".into(), &widgets)?;
        Reflect::set(
            &node,
            &"setDirtyCanvas".into(),
            &Function::new_no_args("this.dirty = true;"),
        )?;
        Ok(Node::new(node))
    }

    #[wasm_bindgen_test]
    fn test_sync_on_created_fills_empty_negative() -> Result<(), JsValue> {
        let node = mock_node("SDXL", "")?;
        PromptEnhancerWidgets::sync_on_created(&node)?;

        assert_eq!(node.widget_value(NEGATIVE_FIELD)?, WidgetValue::from(SDXL_NEGATIVE));
        Ok(())
    }

    #[wasm_bindgen_test]
    fn test_model_type_callback_keeps_user_text() -> Result<(), JsValue> {
        let node = mock_node("SDXL", "my own negative")?;
        PromptEnhancerWidgets::chain_model_type_callback(&node)?;

        let callback = node
            .widget_callback("model_type")?
            .ok_or_else(|| JsValue::from_str("callback not set"))?;
        callback.call1(&JsValue::NULL, &"Flux".into())?;

        assert_eq!(
            node.widget_value(NEGATIVE_FIELD)?,
            WidgetValue::from("my own negative")
        );
        Ok(())
    }

    #[wasm_bindgen_test]
    fn test_model_type_callback_follows_preset() -> Result<(), JsValue> {
        let node = mock_node("SDXL", SDXL_NEGATIVE)?;
        PromptEnhancerWidgets::chain_model_type_callback(&node)?;

        let callback = node
            .widget_callback("model_type")?
            .ok_or_else(|| JsValue::from_str("callback not set"))?;
        callback.call1(&JsValue::NULL, &ModelType::Sd15.to_string().into())?;

        let expected = negative_preset(ModelType::Sd15).unwrap_or_default();
        assert_eq!(node.widget_value(NEGATIVE_FIELD)?, WidgetValue::from(expected));
        Ok(())
    }
}
