/// Error types for the wallet extension
use thiserror::Error;

/// Failures of the browser windowing API
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WindowError {
    #[error("windows API call failed: {0}")]
    Platform(String),
    #[error("platform returned a window without an id")]
    MissingId,
    #[error("malformed window data: {0}")]
    Decode(String),
}

/// Failures of the popup <-> background message bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("no reply to `{method}` within {timeout_ms} ms")]
    Timeout { method: String, timeout_ms: u128 },
    #[error("`{0}` refused: another request is still waiting for its reply")]
    Busy(String),
    #[error("reply id {actual} does not match request id {expected}")]
    Mismatch { expected: String, actual: String },
    #[error("background rejected the request: {0}")]
    Remote(String),
    #[error("messaging transport failed: {0}")]
    Transport(String),
    #[error("bridge payload could not be (de)serialized: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Failures decoding or advancing the send flow
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlowError {
    #[error("invalid seqno `{0}`")]
    InvalidSeqno(String),
    #[error("invalid dApp request id `{0}`")]
    InvalidRequestId(String),
    #[error("invalid wallet address `{0}`")]
    InvalidAddress(String),
    #[error("invalid amount `{0}`")]
    InvalidAmount(String),
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
    #[error("unsupported pending operation: {0}")]
    InvalidOperation(String),
    #[error("unknown route `{0}`")]
    UnknownRoute(String),
}

/// Mnemonic rejection reasons shown on the import screen
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MnemonicError {
    #[error("Mnemonic must have 24 words, got {0}")]
    WordCount(usize),
    #[error("Unknown mnemonic word `{0}`")]
    UnknownWord(String),
    #[error("Mnemonic is not valid")]
    Checksum,
}

/// Failures reported by the wallet SDK glue
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SdkError {
    #[error("wallet SDK call `{call}` failed: {message}")]
    Call { call: &'static str, message: String },
    #[error("wallet SDK returned malformed data for `{0}`")]
    Decode(&'static str),
}

/// Errors raised while serving a bridge request in the background
#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("unknown method `{0}`")]
    UnknownMethod(String),
    #[error("invalid params: {0}")]
    InvalidParams(#[from] serde_json::Error),
    #[error(transparent)]
    Sdk(#[from] SdkError),
    #[error(transparent)]
    Mnemonic(#[from] MnemonicError),
    #[error("seqno {0} was not confirmed in time")]
    Unconfirmed(u32),
}
