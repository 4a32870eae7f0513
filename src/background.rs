// Background service worker: answers bridge requests, owns the popup
// manager and the pending operation slot.

use crate::bridge::{Delay, Reply, Request};
use crate::config::{CONFIRM_POLL_ATTEMPTS, CONFIRM_POLL_INTERVAL};
use crate::error::BackgroundError;
use crate::events::{BackgroundEvent, EventEmitter};
use crate::mnemonic::{Mnemonic, validate_mnemonic};
use crate::platform::WindowPlatform;
use crate::popup::PopupManager;
use crate::send::{PendingOperation, Transfer};
use crate::sdk::Sdk;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Deserialize)]
struct DappDecision {
    id: u32,
    approved: bool,
}

/// Unlock attempt; `id` is the dApp request waiting on it, if any
#[derive(Deserialize)]
struct UnlockParams {
    password: String,
    #[serde(default)]
    id: Option<u32>,
}

pub struct Background<P: WindowPlatform, S: Sdk, D: Delay> {
    popups: PopupManager<P>,
    sdk: S,
    delay: D,
    events: Rc<EventEmitter>,
    pending: RefCell<Option<PendingOperation>>,
}

impl<P: WindowPlatform, S: Sdk, D: Delay> Background<P, S, D> {
    pub fn new(platform: P, sdk: S, delay: D) -> Self {
        let events = Rc::new(EventEmitter::new());
        Background {
            popups: PopupManager::new(platform, events.clone()),
            sdk,
            delay,
            events,
            pending: RefCell::new(None),
        }
    }

    pub fn popups(&self) -> &PopupManager<P> {
        &self.popups
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    pub fn pending_operation(&self) -> Option<PendingOperation> {
        self.pending.borrow().clone()
    }

    /// Serve one bridge request; failures become error replies
    pub async fn dispatch(&self, request: Request) -> Reply {
        log::debug!("dispatch {} ({})", request.method, request.id);
        match self.handle(&request.method, request.params).await {
            Ok(result) => Reply::ok(request.id, result),
            Err(e) => {
                log::warn!("{} failed: {}", request.method, e);
                Reply::error(request.id, e.to_string())
            }
        }
    }

    async fn handle(&self, method: &str, params: Value) -> Result<Value, BackgroundError> {
        match method {
            "storeOperation" => {
                let operation: Option<PendingOperation> = decode(params)?;
                self.pending.replace(operation);
                Ok(Value::Null)
            }
            "getOperation" => Ok(serde_json::to_value(self.pending_operation())?),
            "estimateFee" => {
                let transfer: Transfer = decode(params)?;
                let fee = self.sdk.estimate_fee(&transfer).await?;
                Ok(serde_json::to_value(fee)?)
            }
            "sendTransaction" => {
                let transfer: Transfer = decode(params)?;
                let seqno = self.sdk.send_transfer(&transfer).await?;
                log::info!("Transfer sent with seqno {}", seqno);
                Ok(Value::from(seqno))
            }
            "confirmSeqNo" => {
                let seqno: u32 = decode(params)?;
                self.confirm_seqno(seqno).await?;
                Ok(Value::Null)
            }
            "importWallet" => {
                let words: Vec<String> = decode(params)?;
                validate_mnemonic(&words)?;
                let address = self.sdk.import_wallet(&words).await?;
                log::info!("Wallet imported");
                Ok(Value::String(address))
            }
            "unlockWallet" => {
                let unlock: UnlockParams = decode(params)?;
                let phrase = self.sdk.unlock_wallet(&unlock.password).await?;
                // A wrong password decrypts to garbage
                Mnemonic::parse(&phrase)?;
                log::info!("Wallet unlocked");
                if let Some(id) = unlock.id {
                    self.events
                        .emit(&BackgroundEvent::DappResponse { id, approved: true });
                }
                Ok(Value::Null)
            }
            "closePopUp" => {
                let id: Option<i32> = decode(params)?;
                self.popups.close(id.or(self.popups.popup_id())).await;
                Ok(Value::Null)
            }
            "resolveDappRequest" => {
                let decision: DappDecision = decode(params)?;
                self.events.emit(&BackgroundEvent::DappResponse {
                    id: decision.id,
                    approved: decision.approved,
                });
                Ok(Value::Null)
            }
            other => Err(BackgroundError::UnknownMethod(other.to_string())),
        }
    }

    /// Wait until the wallet seqno moves past `seqno`
    async fn confirm_seqno(&self, seqno: u32) -> Result<(), BackgroundError> {
        for attempt in 1..=CONFIRM_POLL_ATTEMPTS {
            let current = self.sdk.wallet_seqno().await?;
            if current > seqno {
                log::info!("Seqno {} confirmed after {} polls", seqno, attempt);
                return Ok(());
            }
            if attempt < CONFIRM_POLL_ATTEMPTS {
                self.delay.delay(CONFIRM_POLL_INTERVAL).await;
            }
        }
        Err(BackgroundError::Unconfirmed(seqno))
    }
}

fn decode<T: DeserializeOwned>(params: Value) -> Result<T, BackgroundError> {
    Ok(serde_json::from_value(params)?)
}
