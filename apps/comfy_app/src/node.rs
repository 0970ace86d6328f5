//! Node

use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::{
    JsCast, JsValue,
    prelude::{Closure, wasm_bindgen},
};
use web_sys::HtmlElement;

use crate::{Widget, WidgetValue};

#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct Node {
    inner: Object,
}

#[wasm_bindgen]
impl Node {
    #[wasm_bindgen(constructor)]
    pub fn new(inner: Object) -> Self {
        Self { inner }
    }

    /// 获取inner对象
    pub fn get_inner(&self) -> Object {
        self.inner.clone()
    }
}

/*
{
"title":"Gemini Prompt Enhancer",
"comfyClass":"GeminiPromptEnhancer",
"widgets":[
    {"name":"api_key","options":{"placeholder":"API key"},"label":"api_key","type":"text","y":0},
    {"name":"model","options":{"values":["gemini-2.0-flash","gemini-1.5-flash"]},"type":"combo","y":0},
    {"name":"text","options":{},"type":"customtext","inputEl":{},"y":0},
    {"name":"negative_text","options":{},"type":"customtext","inputEl":{},"y":0},
    {"name":"model_type","options":{"values":["SDXL","Flux","Pony"]},"type":"combo","y":0}
],
"serialize_widgets":true,
"_size":{"0":400,"1":520}
}
*/

#[wasm_bindgen]
impl Node {
    /// 节点类名, 与 NODE_CLASS_MAPPINGS 中的名称一致
    #[wasm_bindgen(getter)]
    pub fn comfy_class(&self) -> Result<String, JsValue> {
        Reflect::get(&self.inner, &"comfyClass".into())
            .and_then(|v| v.as_string().ok_or(JsValue::NULL))
    }

    /// 获取小部件列表
    #[wasm_bindgen(getter)]
    pub fn widgets(&self) -> Result<Array, JsValue> {
        Reflect::get(&self.inner, &"widgets".into())?.dyn_into::<Array>()
    }

    /// 重绘画布
    pub fn set_dirty_canvas(&self) -> Result<(), JsValue> {
        let set_dirty_fn =
            Reflect::get(&self.inner, &"setDirtyCanvas".into())?.dyn_into::<Function>()?;
        set_dirty_fn.call2(&self.inner, &JsValue::TRUE, &JsValue::TRUE)?;
        Ok(())
    }

    /// 按部件重新计算节点尺寸, 只增不减宽度
    pub fn fit_size(&self) -> Result<(), JsValue> {
        let compute_size_fn =
            Reflect::get(&self.inner, &"computeSize".into())?.dyn_into::<Function>()?;
        let computed = compute_size_fn.call0(&self.inner)?.dyn_into::<Array>()?;

        let current = Reflect::get(&self.inner, &"size".into())?;
        if let Ok(current) = current.dyn_into::<Array>() {
            let width = current.get(0).as_f64().unwrap_or(0.0);
            let computed_width = computed.get(0).as_f64().unwrap_or(0.0);
            computed.set(0, JsValue::from_f64(width.max(computed_width)));
        }

        let set_size_fn = Reflect::get(&self.inner, &"setSize".into())?.dyn_into::<Function>()?;
        set_size_fn.call1(&self.inner, &computed)?;
        Ok(())
    }
}

/// 小部件便捷接口
impl Node {
    // export const getWidgetByName = (node, name) => node.widgets.find((w) => w.name === name);
    pub fn get_widget_by_name(&self, name: &str) -> Result<Widget, JsValue> {
        Widget::from_js(self.widget(name)?.into())
    }

    /// 按名称获取小部件的 js 对象
    pub fn widget(&self, name: &str) -> Result<Object, JsValue> {
        self.widgets()?
            .iter()
            .find(|w| {
                Reflect::get(w, &"name".into())
                    .ok()
                    .and_then(|v| v.as_string())
                    .is_some_and(|v| v == name)
            })
            .ok_or_else(|| JsValue::from_str(&format!("widget not found: {name}")))?
            .dyn_into::<Object>()
    }

    /// 读取小部件的值
    pub fn widget_value(&self, name: &str) -> Result<WidgetValue, JsValue> {
        let widget = self.widget(name)?;
        WidgetValue::from_js(Reflect::get(&widget, &"value".into())?)
    }

    /// 写入小部件的值
    ///
    /// 多行文本框的 value setter 会同步到 inputEl, 不会触发 callback
    pub fn set_widget_value(&self, name: &str, value: &WidgetValue) -> Result<(), JsValue> {
        let widget = self.widget(name)?;
        Reflect::set(&widget, &"value".into(), &value.to_js())?;
        Ok(())
    }

    /// 小部件当前的回调函数
    pub fn widget_callback(&self, name: &str) -> Result<Option<Function>, JsValue> {
        let widget = self.widget(name)?;
        let callback = Reflect::get(&widget, &"callback".into())?;
        Ok(callback.dyn_into::<Function>().ok())
    }

    /// 替换小部件的回调函数
    ///
    /// widget.callback = (value, canvas, node, pos, e) => {}
    pub fn set_widget_callback<F>(&self, name: &str, handler: F) -> Result<(), JsValue>
    where
        F: Fn(WidgetValue) -> Result<(), JsValue> + 'static,
    {
        let widget = self.widget(name)?;

        let handler = Closure::wrap(Box::new(move |value: JsValue| {
            let value = WidgetValue::from_js(value)?;
            handler(value)
        }) as Box<dyn Fn(JsValue) -> Result<(), JsValue>>);

        Reflect::set(&widget, &"callback".into(), &handler.as_ref().clone())?;

        // 保持闭包生命周期
        handler.forget();

        Ok(())
    }

    /// 小部件对应的 DOM 元素
    ///
    /// 多行文本框为 inputEl, addDOMWidget 创建的部件为 element
    pub fn widget_input_element(&self, name: &str) -> Result<Option<HtmlElement>, JsValue> {
        let widget = self.widget(name)?;
        for key in ["inputEl", "element"] {
            let element = Reflect::get(&widget, &key.into())?;
            if let Ok(element) = element.dyn_into::<HtmlElement>() {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    /// 将小部件移动到 anchor 之后
    pub fn move_widget_after(&self, name: &str, anchor: &str) -> Result<(), JsValue> {
        let widget = self.widget(name)?;
        let anchor = self.widget(anchor)?;

        let reordered = Array::new();
        for w in self.widgets()?.iter() {
            if Object::is(&w, &widget) {
                continue;
            }
            reordered.push(&w);
            if Object::is(&w, &anchor) {
                reordered.push(&widget);
            }
        }

        Reflect::set(&self.inner, &"widgets".into(), &reordered)?;
        Ok(())
    }

    /// 隐藏小部件, 值仍然随工作流保存
    pub fn hide_widget(&self, name: &str) -> Result<(), JsValue> {
        let widget = self.widget(name)?;

        let origin_type = Reflect::get(&widget, &"type".into())?;
        Reflect::set(&widget, &"origType".into(), &origin_type)?;
        Reflect::set(&widget, &"type".into(), &"hidden".into())?;

        let compute_size = Function::new_no_args("return [0, -4];");
        Reflect::set(&widget, &"computeSize".into(), &compute_size)?;

        if let Some(input_el) = self.widget_input_element(name)? {
            input_el.style().set_property("display", "none")?;
        }
        Ok(())
    }
}

impl Node {
    /// 添加小部件
    ///
    /// addWidget(type, name2, value, callback, options2)
    pub fn add_widget(
        &self,
        r#type: &str,
        name: &str,
        value: JsValue,
        callback: Option<&Function>,
        options: JsValue,
    ) -> Result<Object, JsValue> {
        let add_widget_fn =
            Reflect::get(&self.inner, &"addWidget".into())?.dyn_into::<Function>()?;

        let callback: JsValue = callback.map(|f| f.clone().into()).unwrap_or(JsValue::NULL);
        let args = Array::of5(
            &JsValue::from_str(r#type),
            &JsValue::from_str(name),
            &value,
            &callback,
            &options,
        );
        add_widget_fn.apply(&self.inner, &args)?.dyn_into::<Object>()
    }

    /// 添加 DOM 小部件
    ///
    /// addDOMWidget(name, type, element, options)
    pub fn add_dom_widget(
        &self,
        name: &str,
        r#type: &str,
        element: &HtmlElement,
        options: JsValue,
    ) -> Result<Object, JsValue> {
        let add_dom_widget_fn =
            Reflect::get(&self.inner, &"addDOMWidget".into())?.dyn_into::<Function>()?;

        let args = Array::of4(
            &JsValue::from_str(name),
            &JsValue::from_str(r#type),
            element,
            &options,
        );
        add_dom_widget_fn.apply(&self.inner, &args)?.dyn_into::<Object>()
    }
}

impl From<Node> for Object {
    fn from(node: Node) -> Self {
        node.get_inner()
    }
}
