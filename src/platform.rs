// chrome.windows / chrome.tabs bindings behind a trait the popup manager can be tested against

use crate::error::WindowError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

/// Subset of `chrome.windows.Window` the manager looks at
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: Option<i32>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub top: Option<i32>,
    pub left: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

impl WindowInfo {
    pub fn is_popup(&self) -> bool {
        self.kind.as_deref() == Some(WindowOptions::POPUP)
    }
}

/// `chrome.windows.CreateData`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowOptions {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub width: i32,
    pub height: i32,
    pub left: i32,
    pub top: i32,
}

impl WindowOptions {
    pub const POPUP: &'static str = "popup";
}

#[async_trait(?Send)]
pub trait WindowPlatform {
    async fn get_all_windows(&self) -> Result<Vec<WindowInfo>, WindowError>;
    async fn get_last_focused_window(&self) -> Result<WindowInfo, WindowError>;
    async fn focus_window(&self, id: i32) -> Result<(), WindowError>;
    async fn open_window(&self, options: WindowOptions) -> Result<WindowInfo, WindowError>;
    async fn close_window(&self, id: i32) -> Result<(), WindowError>;
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "windows"], js_name = getAll)]
    fn windows_get_all(query: JsValue) -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "windows"], js_name = getLastFocused)]
    fn windows_get_last_focused() -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "windows"], js_name = update)]
    fn windows_update(id: i32, info: JsValue) -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "windows"], js_name = create)]
    fn windows_create(options: JsValue) -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "windows"], js_name = remove)]
    fn windows_remove(id: i32) -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "windows", "onRemoved"], js_name = addListener)]
    fn windows_on_removed(callback: &Closure<dyn FnMut(i32)>);

    #[wasm_bindgen(js_namespace = ["chrome", "tabs"], js_name = create)]
    fn tabs_create(options: JsValue) -> js_sys::Promise;
}

fn platform_error(e: JsValue) -> WindowError {
    WindowError::Platform(format!("{:?}", e))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, WindowError> {
    serde_wasm_bindgen::to_value(value).map_err(|e| WindowError::Decode(e.to_string()))
}

fn from_js<T: for<'de> Deserialize<'de>>(value: JsValue) -> Result<T, WindowError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| WindowError::Decode(e.to_string()))
}

/// `chrome.windows` in the background service worker
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromePlatform;

#[async_trait(?Send)]
impl WindowPlatform for ChromePlatform {
    async fn get_all_windows(&self) -> Result<Vec<WindowInfo>, WindowError> {
        let windows = JsFuture::from(windows_get_all(js_sys::Object::new().into()))
            .await
            .map_err(platform_error)?;
        from_js(windows)
    }

    async fn get_last_focused_window(&self) -> Result<WindowInfo, WindowError> {
        let window = JsFuture::from(windows_get_last_focused())
            .await
            .map_err(platform_error)?;
        from_js(window)
    }

    async fn focus_window(&self, id: i32) -> Result<(), WindowError> {
        let info = js_sys::Object::new();
        js_sys::Reflect::set(&info, &"focused".into(), &JsValue::TRUE).map_err(platform_error)?;
        JsFuture::from(windows_update(id, info.into()))
            .await
            .map_err(platform_error)?;
        Ok(())
    }

    async fn open_window(&self, options: WindowOptions) -> Result<WindowInfo, WindowError> {
        let window = JsFuture::from(windows_create(to_js(&options)?))
            .await
            .map_err(platform_error)?;
        from_js(window)
    }

    async fn close_window(&self, id: i32) -> Result<(), WindowError> {
        JsFuture::from(windows_remove(id))
            .await
            .map_err(platform_error)?;
        Ok(())
    }
}

/// Subscribe to `chrome.windows.onRemoved` for the lifetime of the worker
pub fn on_window_removed(callback: impl FnMut(i32) + 'static) {
    let closure = Closure::wrap(Box::new(callback) as Box<dyn FnMut(i32)>);
    windows_on_removed(&closure);
    closure.forget();
}

/// Open a regular browser tab, e.g. the block explorer
pub async fn open_tab(url: &str) -> Result<(), WindowError> {
    let options = js_sys::Object::new();
    js_sys::Reflect::set(&options, &"url".into(), &url.into()).map_err(platform_error)?;
    JsFuture::from(tabs_create(options.into()))
        .await
        .map_err(platform_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_info_from_chrome_json() {
        let json = r#"{"id":7,"type":"popup","top":10,"left":20,"width":380,"height":620,"focused":true,"incognito":false}"#;
        let window: WindowInfo = serde_json::from_str(json).unwrap();

        assert_eq!(window.id, Some(7));
        assert!(window.is_popup());
        assert_eq!(window.width, Some(380));
    }

    #[test]
    fn test_window_options_use_chrome_field_names() {
        let options = WindowOptions {
            url: "index.html#/notification/unlock".to_string(),
            kind: WindowOptions::POPUP.to_string(),
            width: 380,
            height: 620,
            left: 0,
            top: 0,
        };
        let json = serde_json::to_value(&options).unwrap();

        assert_eq!(json["type"], "popup");
        assert_eq!(json["url"], "index.html#/notification/unlock");
    }
}
