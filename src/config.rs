/// Compiled-in defaults: popup geometry, explorers and timeouts
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Fixed size of the notification popup
pub const POPUP_WIDTH: i32 = 380;
pub const POPUP_HEIGHT: i32 = 620;

/// How long the pending screen waits for `confirmSeqNo`
pub const CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);

/// Default bound for other popup -> background requests
pub const DEFAULT_ASK_TIMEOUT: Duration = Duration::from_secs(30);

/// Background polling of the wallet seqno while confirming
pub const CONFIRM_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// The background must give up before the popup stops listening
pub const CONFIRM_POLL_BUDGET: Duration = Duration::from_secs(CONFIRM_TIMEOUT.as_secs() - 5);

/// Polls within the budget; no sleep follows the last one
pub const CONFIRM_POLL_ATTEMPTS: u32 =
    (CONFIRM_POLL_BUDGET.as_secs() / CONFIRM_POLL_INTERVAL.as_secs()) as u32 + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }

    pub fn config(&self) -> NetworkConfig {
        match self {
            Network::Mainnet => NetworkConfig {
                network: *self,
                scan_url: "https://tonscan.org",
            },
            Network::Testnet => NetworkConfig {
                network: *self,
                scan_url: "https://testnet.tonscan.org",
            },
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    pub network: Network,
    pub scan_url: &'static str,
}

impl NetworkConfig {
    /// Block explorer page for a wallet address
    pub fn explorer_address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.scan_url, address)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Network::default().config()
    }
}
