/// Wallet settings kept in chrome.storage.local

use crate::config::Network;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

pub const NETWORK_KEY: &str = "network";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = get)]
    fn storage_get(keys: JsValue) -> js_sys::Promise;

    #[wasm_bindgen(js_namespace = ["chrome", "storage", "local"], js_name = set)]
    fn storage_set(items: JsValue) -> js_sys::Promise;
}

/// Account snapshot the background keeps per network
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    #[serde(default)]
    pub active_wallet: Option<String>,
    /// Last known balance, in TON
    #[serde(default)]
    pub balance: Option<String>,
}

impl AccountState {
    /// Snapshot after a wallet became active; its balance is not known yet
    pub fn with_wallet(mut self, address: impl Into<String>) -> Self {
        self.active_wallet = Some(address.into());
        self.balance = None;
        self
    }
}

/// Storage key of the account snapshot, e.g. `mainnet_account`
pub fn account_key(network: Network) -> String {
    format!("{}_account", network)
}

async fn get_value(key: &str) -> Result<JsValue, String> {
    let keys = js_sys::Array::new();
    keys.push(&key.into());

    let result = JsFuture::from(storage_get(keys.into()))
        .await
        .map_err(|e| format!("Failed to read storage: {:?}", e))?;
    js_sys::Reflect::get(&result, &key.into()).map_err(|e| format!("Failed to read {}: {:?}", key, e))
}

/// Selected network; defaults to mainnet when unset
pub async fn load_network() -> Result<Network, String> {
    let value = get_value(NETWORK_KEY).await?;
    if value.is_null() || value.is_undefined() {
        return Ok(Network::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| format!("Failed to parse network: {:?}", e))
}

pub async fn load_account(network: Network) -> Result<AccountState, String> {
    let value = get_value(&account_key(network)).await?;
    if value.is_null() || value.is_undefined() {
        return Ok(AccountState::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| format!("Failed to parse account: {:?}", e))
}

pub async fn save_account(network: Network, state: &AccountState) -> Result<(), String> {
    let value = state
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| format!("Failed to serialize account: {:?}", e))?;

    let items = js_sys::Object::new();
    js_sys::Reflect::set(&items, &account_key(network).into(), &value)
        .map_err(|e| format!("Failed to build storage item: {:?}", e))?;

    JsFuture::from(storage_set(items.into()))
        .await
        .map_err(|e| format!("Failed to write storage: {:?}", e))?;
    log::debug!("Saved account for {}", network);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_key() {
        assert_eq!(account_key(Network::Mainnet), "mainnet_account");
        assert_eq!(account_key(Network::Testnet), "testnet_account");
    }

    #[test]
    fn test_account_state_ignores_unknown_fields() {
        let json = r#"{"activeWallet":"EQabc","wallets":[{"name":"Account 1"}]}"#;
        let state: AccountState = serde_json::from_str(json).unwrap();

        assert_eq!(state.active_wallet.as_deref(), Some("EQabc"));
        assert_eq!(state.balance, None);
    }

    #[test]
    fn test_with_wallet_resets_balance() {
        let stale = AccountState {
            active_wallet: Some("EQold".to_string()),
            balance: Some("3".to_string()),
        };

        let state = stale.with_wallet("EQnew");

        assert_eq!(state.active_wallet.as_deref(), Some("EQnew"));
        assert_eq!(state.balance, None);
    }

    #[test]
    fn test_serialization() {
        let state = AccountState {
            active_wallet: Some("EQabc".to_string()),
            balance: Some("12.5".to_string()),
        };

        let json = serde_json::to_string(&state).unwrap();
        let deserialized: AccountState = serde_json::from_str(&json).unwrap();

        assert!(json.contains("activeWallet"));
        assert_eq!(deserialized, state);
    }
}
