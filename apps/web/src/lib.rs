use wasm_bindgen::{JsValue, prelude::wasm_bindgen};
use web_sys::console;

use comfy_app::{ComfyApp, Extension};

mod prompt_enhancer_widgets;
use prompt_enhancer_widgets::PromptEnhancerWidgets;

/// 扩展名称, 需要唯一
const EXTENSION_NAME: &str = "ComfyUI-GeminiPromptEnhancer";

#[wasm_bindgen(start)]
fn run() -> Result<(), JsValue> {
    let mut extension = Extension::new(EXTENSION_NAME);

    extension.init(|| {
        console::log_1(&format!("🚀 {EXTENSION_NAME} init").into());
        Ok(())
    })?;

    extension.before_register_node_def(|node_type, node_data, _app| {
        if node_data.name()? == PromptEnhancerWidgets::NODE_NAME {
            let _ = PromptEnhancerWidgets::on_node_created(&node_type).map_err(|e| {
                console::log_1(&format!("🔗 更新 GeminiPromptEnhancer UI 失败， err: {:#?}", e).into());
                e
            });
        }

        Ok(JsValue::undefined())
    })?;

    extension.loaded_graph_node(|node, _app| {
        if node.comfy_class().is_ok_and(|v| v == PromptEnhancerWidgets::NODE_NAME) {
            let _ = PromptEnhancerWidgets::on_loaded(&node).map_err(|e| {
                console::log_1(&format!("🔗 恢复 GeminiPromptEnhancer UI 失败， err: {:#?}", e).into());
                e
            });
        }

        Ok(JsValue::undefined())
    })?;

    extension.setup(|| {
        console::log_1(&format!("⚙️  {EXTENSION_NAME} setup").into());
        Ok(())
    })?;

    let app = ComfyApp::new()?;
    app.register_extension(&extension)?;

    Ok(())
}
