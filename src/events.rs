/// Background events and a single-threaded emitter for them
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundEvent {
    /// The user dismissed the tracked notification popup
    ClosedPopUp { window_id: i32 },
    /// The user answered a dApp request in the popup
    DappResponse { id: u32, approved: bool },
}

impl BackgroundEvent {
    pub fn method(&self) -> &'static str {
        match self {
            BackgroundEvent::ClosedPopUp { .. } => "closedPopUp",
            BackgroundEvent::DappResponse { .. } => "dappResponse",
        }
    }

    /// `{method, params}` message broadcast to other extension contexts
    pub fn to_message(&self) -> Value {
        let params = match self {
            BackgroundEvent::ClosedPopUp { window_id } => json!(window_id),
            BackgroundEvent::DappResponse { id, approved } => {
                json!({ "id": id, "approved": approved })
            }
        };
        json!({ "method": self.method(), "params": params })
    }
}

type Listener = Rc<dyn Fn(&BackgroundEvent)>;

#[derive(Default)]
pub struct EventEmitter {
    listeners: RefCell<Vec<Listener>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&BackgroundEvent) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn emit(&self, event: &BackgroundEvent) {
        log::debug!("emit {}", event.method());
        // Listeners may subscribe while being called
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_emit_reaches_every_listener() {
        let emitter = EventEmitter::new();
        let hits = Rc::new(Cell::new(0));

        for _ in 0..2 {
            let hits = hits.clone();
            emitter.subscribe(move |_| hits.set(hits.get() + 1));
        }
        emitter.emit(&BackgroundEvent::ClosedPopUp { window_id: 5 });

        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_event_message_shape() {
        let message = BackgroundEvent::ClosedPopUp { window_id: 5 }.to_message();
        assert_eq!(message, json!({ "method": "closedPopUp", "params": 5 }));

        let message = BackgroundEvent::DappResponse { id: 3, approved: true }.to_message();
        assert_eq!(message["method"], "dappResponse");
        assert_eq!(message["params"]["approved"], true);
    }
}
