/// TON Wallet - browser extension popup and background worker
/// Built with Rust + WASM + Yew

mod background;
mod bridge;
mod config;
mod error;
mod events;
mod format;
mod mnemonic;
mod platform;
mod popup;
mod route;
mod sdk;
mod send;
mod storage;
pub mod ui;

use background::Background;
use bridge::{GlooDelay, Request};
use platform::ChromePlatform;
use sdk::GlobalSdk;
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

type ServiceWorker = Background<ChromePlatform, GlobalSdk, GlooDelay>;

thread_local! {
    static BACKGROUND: Rc<ServiceWorker> =
        Rc::new(Background::new(ChromePlatform, GlobalSdk, GlooDelay));
}

fn service_worker() -> Rc<ServiceWorker> {
    BACKGROUND.with(Rc::clone)
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::app::App>::new().render();
}

// Wire the background worker to chrome.windows and event broadcasting
#[wasm_bindgen]
pub fn init_background() {
    let worker = service_worker();

    worker
        .events()
        .subscribe(|event| bridge::broadcast(&event.to_message()));

    let removed = Rc::clone(&worker);
    platform::on_window_removed(move |window_id| {
        removed.popups().handle_removed(window_id);
    });

    log::info!("Wallet background initialized");
}

// Called by the background's runtime.onMessage glue; resolves to the reply
#[wasm_bindgen]
pub async fn handle_background_message(message: JsValue) -> Result<JsValue, JsValue> {
    let request: Request = serde_wasm_bindgen::from_value(message)?;
    let worker = service_worker();
    let reply = worker.dispatch(request).await;
    Ok(reply.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

#[wasm_bindgen]
pub async fn open_connect_dapp_popup(
    id: u32,
    origin: String,
    logo: Option<String>,
) -> Result<i32, JsValue> {
    let worker = service_worker();
    worker
        .popups()
        .open_connect_dapp(id, &origin, logo.as_deref())
        .await
        .map_err(js_error)
}

#[wasm_bindgen]
pub async fn open_unlock_popup(id: Option<u32>) -> Result<i32, JsValue> {
    let worker = service_worker();
    worker.popups().open_unlock(id).await.map_err(js_error)
}

#[wasm_bindgen]
pub async fn open_switch_network_popup(
    id: u32,
    origin: String,
    network: String,
    logo: Option<String>,
) -> Result<i32, JsValue> {
    let worker = service_worker();
    worker
        .popups()
        .open_switch_network(id, &origin, &network, logo.as_deref())
        .await
        .map_err(js_error)
}

#[wasm_bindgen]
pub async fn open_send_transaction_popup(
    id: u32,
    origin: String,
    to: String,
    value_nano: String,
    data: Option<String>,
) -> Result<i32, JsValue> {
    let worker = service_worker();
    worker
        .popups()
        .open_send_transaction(id, &origin, &to, &value_nano, data.as_deref())
        .await
        .map_err(js_error)
}
