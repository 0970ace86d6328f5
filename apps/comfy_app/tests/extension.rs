#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_test::wasm_bindgen_test;
use web_sys::console;

use comfy_app::{Extension, LGraphNode, Node, WidgetValue};

/// 构造一个带有 widgets 的节点对象
fn mock_node() -> Result<Object, JsValue> {
    let node = Object::new();
    Reflect::set(&node, &"comfyClass".into(), &"GeminiPromptEnhancer".into())?;

    let widgets = Array::new();
    for (name, value) in [("model_type", "SDXL"), ("negative_text", "")] {
        let widget = Object::new();
        Reflect::set(&widget, &"name".into(), &name.into())?;
        Reflect::set(&widget, &"type".into(), &"text".into())?;
        Reflect::set(&widget, &"value".into(), &value.into())?;
        widgets.push(&widget);
    }
    Reflect::set(&node, &"widgets".into(), &widgets)?;
    Ok(node)
}

#[wasm_bindgen_test]
fn test_extension_hook() -> Result<(), JsValue> {
    let mut extension = Extension::new("test.hook.types");

    extension.init(|| {
        console::log_1(&"🚀 JS init called!".into());
        Ok(())
    })?;

    extension.before_register_node_def(|_node_type, node_data, _app| {
        console::log_1(&node_data.name()?.into());
        Ok(JsValue::undefined())
    })?;

    extension.loaded_graph_node(|node, _app| {
        console::log_1(&node.comfy_class()?.into());
        Ok(JsValue::undefined())
    })?;

    extension.setup(|| Ok(()))?;

    for hook in ["init", "beforeRegisterNodeDef", "loadedGraphNode", "setup"] {
        assert!(extension.has_hook(hook), "missing hook {hook}");
    }
    Ok(())
}

#[wasm_bindgen_test]
fn test_widget_value_by_name() -> Result<(), JsValue> {
    let node = Node::new(mock_node()?);

    assert_eq!(node.widget_value("model_type")?, WidgetValue::from("SDXL"));
    assert_eq!(node.get_widget_by_name("model_type")?.r#type, "text");

    node.set_widget_value("negative_text", &WidgetValue::from("blurry"))?;
    assert_eq!(node.widget_value("negative_text")?, WidgetValue::from("blurry"));

    assert!(node.widget("missing").is_err());
    assert!(node.widget_callback("model_type")?.is_none());
    Ok(())
}

#[wasm_bindgen_test]
fn test_widget_callback_receives_value() -> Result<(), JsValue> {
    let node = Node::new(mock_node()?);
    let inner = node.get_inner();

    node.set_widget_callback("model_type", move |value| {
        let widgets = Reflect::get(&inner, &"widgets".into())?.dyn_into::<Array>()?;
        Reflect::set(&widgets.get(1), &"value".into(), &value.to_js())?;
        Ok(())
    })?;

    let callback = node
        .widget_callback("model_type")?
        .ok_or_else(|| JsValue::from_str("callback not set"))?;
    callback.call1(&JsValue::NULL, &"Flux".into())?;

    assert_eq!(node.widget_value("negative_text")?, WidgetValue::from("Flux"));
    Ok(())
}

#[wasm_bindgen_test]
fn test_on_node_created_chains_previous() -> Result<(), JsValue> {
    let prototype = Object::new();
    let previous = Function::new_no_args("this.previous_called = true;");
    Reflect::set(&prototype, &"onNodeCreated".into(), &previous)?;

    LGraphNode::new(prototype.clone().into()).on_node_created(|node| {
        Reflect::set(&node.get_inner(), &"rust_called".into(), &JsValue::TRUE)?;
        Ok(())
    })?;

    let on_node_created =
        Reflect::get(&prototype, &"onNodeCreated".into())?.dyn_into::<Function>()?;
    let instance = Object::new();
    on_node_created.call0(&instance)?;

    assert_eq!(Reflect::get(&instance, &"previous_called".into())?, JsValue::TRUE);
    assert_eq!(Reflect::get(&instance, &"rust_called".into())?, JsValue::TRUE);
    Ok(())
}
