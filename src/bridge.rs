// Popup -> background messaging: `ask` waits for one reply within a timeout,
// `send` fires and forgets.

use crate::error::BridgeError;
use async_trait::async_trait;
use futures::future::{self, Either, FutureExt, LocalBoxFuture};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use uuid::Uuid;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    pub fn new(method: &str, params: impl Serialize) -> Result<Request, BridgeError> {
        Ok(Request {
            id: Uuid::new_v4().to_string(),
            method: method.to_string(),
            params: serde_json::to_value(params)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    #[serde(default)]
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    pub fn ok(id: String, result: Value) -> Reply {
        Reply { id, result, error: None }
    }

    pub fn error(id: String, message: impl Into<String>) -> Reply {
        Reply {
            id,
            result: Value::Null,
            error: Some(message.into()),
        }
    }
}

/// Carries one request to the background and yields its single reply
#[async_trait(?Send)]
pub trait Transport {
    async fn request(&self, request: &Request) -> Result<Reply, BridgeError>;
    fn post(&self, request: Request);
}

/// Timer used to bound `ask`
pub trait Delay {
    fn delay(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

pub struct MessageBridge<T: Transport, D: Delay> {
    transport: T,
    delay: D,
    in_flight: Cell<bool>,
}

struct InFlight<'a>(&'a Cell<bool>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<T: Transport, D: Delay> MessageBridge<T, D> {
    pub fn new(transport: T, delay: D) -> Self {
        MessageBridge {
            transport,
            delay,
            in_flight: Cell::new(false),
        }
    }

    /// Send `method` and wait up to `timeout` for the reply
    ///
    /// Only one request may be outstanding per bridge; replies are matched
    /// to it by id.
    pub async fn ask<R: DeserializeOwned>(
        &self,
        method: &str,
        params: impl Serialize,
        timeout: Duration,
    ) -> Result<R, BridgeError> {
        if self.in_flight.replace(true) {
            return Err(BridgeError::Busy(method.to_string()));
        }
        let _guard = InFlight(&self.in_flight);

        let request = Request::new(method, params)?;
        log::debug!("ask {} ({})", request.method, request.id);

        let reply = self.transport.request(&request);
        let timer = self.delay.delay(timeout);
        let reply = match future::select(reply, timer).await {
            Either::Left((reply, _)) => reply?,
            Either::Right(((), _)) => {
                return Err(BridgeError::Timeout {
                    method: request.method.clone(),
                    timeout_ms: timeout.as_millis(),
                });
            }
        };

        if reply.id != request.id {
            log::warn!("Dropping stale reply {} for {}", reply.id, request.method);
            return Err(BridgeError::Mismatch {
                expected: request.id,
                actual: reply.id,
            });
        }
        if let Some(message) = reply.error {
            return Err(BridgeError::Remote(message));
        }
        Ok(serde_json::from_value(reply.result)?)
    }

    /// Fire-and-forget notification
    pub fn send(&self, method: &str, params: impl Serialize) -> Result<(), BridgeError> {
        let request = Request::new(method, params)?;
        log::debug!("send {}", request.method);
        self.transport.post(request);
        Ok(())
    }
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = sendMessage)]
    fn runtime_send_message(message: JsValue) -> js_sys::Promise;
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, BridgeError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| BridgeError::Transport(e.to_string()))
}

/// Broadcast a JSON message to the other extension contexts
pub fn broadcast(message: &Value) {
    match to_js(message) {
        Ok(js) => {
            spawn_local(async move {
                // Rejects when no context is listening
                if let Err(e) = JsFuture::from(runtime_send_message(js)).await {
                    log::debug!("Broadcast not delivered: {:?}", e);
                }
            });
        }
        Err(e) => log::error!("Failed to encode broadcast: {}", e),
    }
}

/// `chrome.runtime.sendMessage`, answered by the background's `onMessage`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeTransport;

#[async_trait(?Send)]
impl Transport for ChromeTransport {
    async fn request(&self, request: &Request) -> Result<Reply, BridgeError> {
        let reply = JsFuture::from(runtime_send_message(to_js(request)?))
            .await
            .map_err(|e| BridgeError::Transport(format!("{:?}", e)))?;
        serde_wasm_bindgen::from_value(reply).map_err(|e| BridgeError::Transport(e.to_string()))
    }

    fn post(&self, request: Request) {
        match to_js(&request) {
            Ok(message) => {
                spawn_local(async move {
                    if let Err(e) = JsFuture::from(runtime_send_message(message)).await {
                        log::warn!("Background did not take {}: {:?}", request.method, e);
                    }
                });
            }
            Err(e) => log::error!("Failed to encode {}: {}", request.method, e),
        }
    }
}

/// `setTimeout`-backed delay
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooDelay;

impl Delay for GlooDelay {
    fn delay(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        gloo_timers::future::sleep(duration).boxed_local()
    }
}

pub type PopupBridge = MessageBridge<ChromeTransport, GlooDelay>;

thread_local! {
    static POPUP_BRIDGE: Rc<PopupBridge> = Rc::new(MessageBridge::new(ChromeTransport, GlooDelay));
}

/// The popup's single bridge to the background
pub fn popup_bridge() -> Rc<PopupBridge> {
    POPUP_BRIDGE.with(Rc::clone)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::CONFIRM_TIMEOUT;
    use futures::executor::block_on;
    use std::cell::RefCell;

    /// Delay that fires at once or never
    pub(crate) struct TestDelay {
        pub fires: bool,
    }

    impl Delay for TestDelay {
        fn delay(&self, _: Duration) -> LocalBoxFuture<'static, ()> {
            if self.fires {
                future::ready(()).boxed_local()
            } else {
                future::pending().boxed_local()
            }
        }
    }

    enum Behaviour {
        Echo(Value),
        Silent,
        WrongId,
        Fail(&'static str),
    }

    struct FakeTransport {
        behaviour: Behaviour,
        posted: RefCell<Vec<Request>>,
    }

    impl FakeTransport {
        fn new(behaviour: Behaviour) -> Self {
            FakeTransport {
                behaviour,
                posted: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl Transport for FakeTransport {
        async fn request(&self, request: &Request) -> Result<Reply, BridgeError> {
            match &self.behaviour {
                Behaviour::Echo(result) => Ok(Reply::ok(request.id.clone(), result.clone())),
                Behaviour::Silent => future::pending().await,
                Behaviour::WrongId => Ok(Reply::ok("other".to_string(), Value::Null)),
                Behaviour::Fail(message) => Ok(Reply::error(request.id.clone(), *message)),
            }
        }

        fn post(&self, request: Request) {
            self.posted.borrow_mut().push(request);
        }
    }

    fn bridge(behaviour: Behaviour, timer_fires: bool) -> MessageBridge<FakeTransport, TestDelay> {
        MessageBridge::new(FakeTransport::new(behaviour), TestDelay { fires: timer_fires })
    }

    #[test]
    fn test_ask_returns_reply() {
        let bridge = bridge(Behaviour::Echo(serde_json::json!(41)), false);
        let seqno: u32 = block_on(bridge.ask("sendTransaction", (), Duration::from_secs(1))).unwrap();
        assert_eq!(seqno, 41);
    }

    #[test]
    fn test_ask_unit_reply() {
        let bridge = bridge(Behaviour::Echo(Value::Null), false);
        let result: Result<(), _> = block_on(bridge.ask("confirmSeqNo", 5, Duration::from_secs(60)));
        assert!(result.is_ok());
    }

    #[test]
    fn test_silent_background_times_out() {
        let bridge = bridge(Behaviour::Silent, true);
        let result: Result<(), _> = block_on(bridge.ask("confirmSeqNo", 5, CONFIRM_TIMEOUT));

        match result {
            Err(BridgeError::Timeout { method, timeout_ms }) => {
                assert_eq!(method, "confirmSeqNo");
                assert_eq!(timeout_ms, 60_000);
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        // The slot is free again after a timeout
        assert!(!bridge.in_flight.get());
    }

    #[test]
    fn test_mismatched_reply_rejected() {
        let bridge = bridge(Behaviour::WrongId, false);
        let result: Result<(), _> = block_on(bridge.ask("getOperation", (), Duration::from_secs(1)));
        assert!(matches!(result, Err(BridgeError::Mismatch { .. })));
    }

    #[test]
    fn test_remote_error_surfaces() {
        let bridge = bridge(Behaviour::Fail("unknown method `x`"), false);
        let result: Result<(), _> = block_on(bridge.ask("x", (), Duration::from_secs(1)));
        assert!(matches!(result, Err(BridgeError::Remote(message)) if message.contains("unknown")));
    }

    #[test]
    fn test_concurrent_ask_is_busy() {
        let bridge = bridge(Behaviour::Echo(Value::Null), false);
        bridge.in_flight.set(true);

        let result: Result<(), _> = block_on(bridge.ask("getOperation", (), Duration::from_secs(1)));
        assert!(matches!(result, Err(BridgeError::Busy(_))));
    }

    #[test]
    fn test_send_posts_request() {
        let bridge = bridge(Behaviour::Silent, false);
        bridge
            .send("storeOperation", serde_json::json!({ "kind": "send", "value": "{}" }))
            .unwrap();

        let posted = bridge.transport.posted.borrow();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].method, "storeOperation");
        assert_eq!(posted[0].params["kind"], "send");
    }

    #[test]
    fn test_request_ids_are_unique() {
        let a = Request::new("getOperation", ()).unwrap();
        let b = Request::new("getOperation", ()).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.params, Value::Null);
    }
}
