// Wallet SDK seam. The background's JS glue exposes the TON SDK as a
// `tonSdk` global; everything chain-specific stays behind it.

use crate::error::SdkError;
use crate::format::format_ton;
use crate::send::Transfer;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Network fee estimate, in nanotons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeEstimate {
    pub fwd_fee: u64,
    pub in_fwd_fee: u64,
    pub storage_fee: u64,
    pub gas_fee: u64,
}

impl FeeEstimate {
    pub fn total_nano(&self) -> u64 {
        self.fwd_fee + self.in_fwd_fee + self.storage_fee + self.gas_fee
    }

    pub fn total_ton(&self) -> f64 {
        self.total_nano() as f64 / 1_000_000_000.0
    }

    /// "Total fee: ~0.0055 TON"
    pub fn describe(&self) -> String {
        format!("Total fee: ~{} TON", format_ton(self.total_ton()))
    }
}

#[async_trait(?Send)]
pub trait Sdk {
    async fn estimate_fee(&self, transfer: &Transfer) -> Result<FeeEstimate, SdkError>;
    /// Sign and submit; returns the seqno the transfer was sent with
    async fn send_transfer(&self, transfer: &Transfer) -> Result<u32, SdkError>;
    async fn wallet_seqno(&self) -> Result<u32, SdkError>;
    /// Store the wallet and return its address
    async fn import_wallet(&self, words: &[String]) -> Result<String, SdkError>;
    /// Decrypt the stored mnemonic with `password`
    async fn unlock_wallet(&self, password: &str) -> Result<String, SdkError>;
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = tonSdk, js_name = estimateFee)]
    async fn sdk_estimate_fee(transfer: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = tonSdk, js_name = sendTransfer)]
    async fn sdk_send_transfer(transfer: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = tonSdk, js_name = walletSeqno)]
    async fn sdk_wallet_seqno() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = tonSdk, js_name = importWallet)]
    async fn sdk_import_wallet(words: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = tonSdk, js_name = unlockWallet)]
    async fn sdk_unlock_wallet(password: JsValue) -> Result<JsValue, JsValue>;
}

fn call_error(call: &'static str) -> impl Fn(JsValue) -> SdkError {
    move |e| SdkError::Call {
        call,
        message: e.as_string().unwrap_or_else(|| format!("{:?}", e)),
    }
}

fn to_js<T: Serialize + ?Sized>(call: &'static str, value: &T) -> Result<JsValue, SdkError> {
    serde_wasm_bindgen::to_value(value).map_err(|_| SdkError::Decode(call))
}

fn seqno_from_js(call: &'static str, value: JsValue) -> Result<u32, SdkError> {
    value
        .as_f64()
        .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32)
        .ok_or(SdkError::Decode(call))
}

/// Calls into the `tonSdk` global of the background page
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalSdk;

#[async_trait(?Send)]
impl Sdk for GlobalSdk {
    async fn estimate_fee(&self, transfer: &Transfer) -> Result<FeeEstimate, SdkError> {
        let fee = sdk_estimate_fee(to_js("estimateFee", transfer)?)
            .await
            .map_err(call_error("estimateFee"))?;
        serde_wasm_bindgen::from_value(fee).map_err(|_| SdkError::Decode("estimateFee"))
    }

    async fn send_transfer(&self, transfer: &Transfer) -> Result<u32, SdkError> {
        let seqno = sdk_send_transfer(to_js("sendTransfer", transfer)?)
            .await
            .map_err(call_error("sendTransfer"))?;
        seqno_from_js("sendTransfer", seqno)
    }

    async fn wallet_seqno(&self) -> Result<u32, SdkError> {
        let seqno = sdk_wallet_seqno().await.map_err(call_error("walletSeqno"))?;
        seqno_from_js("walletSeqno", seqno)
    }

    async fn import_wallet(&self, words: &[String]) -> Result<String, SdkError> {
        let address = sdk_import_wallet(to_js("importWallet", words)?)
            .await
            .map_err(call_error("importWallet"))?;
        address.as_string().ok_or(SdkError::Decode("importWallet"))
    }

    async fn unlock_wallet(&self, password: &str) -> Result<String, SdkError> {
        let phrase = sdk_unlock_wallet(JsValue::from_str(password))
            .await
            .map_err(call_error("unlockWallet"))?;
        phrase.as_string().ok_or(SdkError::Decode("unlockWallet"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_total() {
        let fee = FeeEstimate {
            fwd_fee: 1_000_000,
            in_fwd_fee: 500_000,
            storage_fee: 1,
            gas_fee: 3_999_999,
        };
        assert_eq!(fee.total_nano(), 5_500_000);
        assert_eq!(fee.describe(), "Total fee: ~0.0055 TON");
    }
}
