/// Send flow state machine and its query-string encoding
///
/// The flow moves through four phases:
///
/// ```text
/// Input --submit--> Confirm --sent(seqno)--> Pending --confirmed--> Success
///   ^                  |
///   +------edit--------+
/// ```
///
/// The popup keeps the current phase in its URL (`#/send?...`) and mirrors it
/// to the background's pending operation slot so a relaunched popup resumes
/// where the user left off.
use crate::error::FlowError;
use crate::format::to_nano;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::form_urlencoded;

/// Kind tag of pending operations written by the send flow
pub const SEND_OPERATION: &str = "send";

// User-friendly (base64url, 48 chars) or raw (`wc:hex`) TON address
static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9_+/-]{48}|-?\d+:[0-9a-fA-F]{64})$").expect("valid address regex")
});

/// A transaction requested by a dApp rather than typed by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DappRequest {
    pub id: u32,
    pub origin: String,
}

/// User-editable fields of the send form
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SendState {
    pub address: String,
    pub amount: String,
    pub max: bool,
    pub comment: String,
    pub request: Option<DappRequest>,
}

impl SendState {
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Free-text amount; always drops the max flag
    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = amount.into();
        self.max = false;
        self
    }

    /// "Max" button: send the whole balance
    pub fn with_max(mut self, balance: impl Into<String>) -> Self {
        self.amount = balance.into();
        self.max = true;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Check the fields needed to build a transfer
    pub fn validate(&self) -> Result<(), FlowError> {
        if !ADDRESS_RE.is_match(self.address.trim()) {
            return Err(FlowError::InvalidAddress(self.address.clone()));
        }
        match to_nano(&self.amount)? {
            0 => Err(FlowError::InvalidAmount(self.amount.clone())),
            _ => Ok(()),
        }
    }

    /// Transfer payload handed to the background
    pub fn transfer(&self) -> Transfer {
        Transfer {
            address: self.address.trim().to_string(),
            amount: self.amount.trim().to_string(),
            max: self.max,
            comment: if self.comment.is_empty() { None } else { Some(self.comment.clone()) },
        }
    }

    fn write_pairs(&self, pairs: &mut Vec<(&'static str, String)>) {
        pairs.push(("address", self.address.clone()));
        pairs.push(("amount", self.amount.clone()));
        pairs.push(("max", if self.max { "1" } else { "0" }.to_string()));
        pairs.push(("comment", self.comment.clone()));
        if let Some(request) = &self.request {
            pairs.push(("id", request.id.to_string()));
            pairs.push(("origin", request.origin.clone()));
        }
    }
}

/// What the background needs to estimate or send a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub address: String,
    pub amount: String,
    pub max: bool,
    pub comment: Option<String>,
}

/// The in-flight step stored in the background's single slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendFlow {
    Input(SendState),
    Confirm(SendState),
    Pending { seqno: u32 },
    Success { seqno: u32 },
}

impl Default for SendFlow {
    fn default() -> Self {
        SendFlow::Input(SendState::default())
    }
}

impl SendFlow {
    pub fn phase(&self) -> &'static str {
        match self {
            SendFlow::Input(_) => "input",
            SendFlow::Confirm(_) => "confirm",
            SendFlow::Pending { .. } => "pending",
            SendFlow::Success { .. } => "success",
        }
    }

    /// Input -> Confirm
    pub fn submit(self) -> Result<SendFlow, FlowError> {
        match self {
            SendFlow::Input(state) => {
                state.validate()?;
                Ok(SendFlow::Confirm(state))
            }
            other => Err(other.invalid("submit")),
        }
    }

    /// Confirm -> Input
    pub fn edit(self) -> Result<SendFlow, FlowError> {
        match self {
            SendFlow::Confirm(state) => Ok(SendFlow::Input(state)),
            other => Err(other.invalid("edit")),
        }
    }

    /// Confirm -> Pending, once the transfer has been handed to the network
    pub fn sent(self, seqno: u32) -> Result<SendFlow, FlowError> {
        match self {
            SendFlow::Confirm(_) => Ok(SendFlow::Pending { seqno }),
            other => Err(other.invalid("send")),
        }
    }

    /// Pending -> Success
    pub fn confirmed(self) -> Result<SendFlow, FlowError> {
        match self {
            SendFlow::Pending { seqno } => Ok(SendFlow::Success { seqno }),
            other => Err(other.invalid("confirm")),
        }
    }

    fn invalid(&self, action: &'static str) -> FlowError {
        FlowError::InvalidTransition {
            action,
            phase: self.phase(),
        }
    }

    /// Key/value pairs in the order they appear in the query string
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        match self {
            SendFlow::Input(state) => state.write_pairs(&mut pairs),
            SendFlow::Confirm(state) => {
                state.write_pairs(&mut pairs);
                pairs.push(("submit", "1".to_string()));
            }
            SendFlow::Pending { seqno } => pairs.push(("seqno", seqno.to_string())),
            SendFlow::Success { seqno } => pairs.push(("confirm", seqno.to_string())),
        }
        pairs
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<SendFlow, FlowError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut state = SendState::default();
        let mut submit = false;
        let mut seqno = None;
        let mut confirm = None;
        let mut id = None;
        let mut origin = None;

        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "address" => state.address = value,
                "amount" => state.amount = value,
                "max" => state.max = value == "1",
                "comment" => state.comment = value,
                "submit" => submit = value == "1",
                "seqno" => seqno = Some(value),
                "confirm" => confirm = Some(value),
                "id" => id = Some(value),
                "origin" => origin = Some(value),
                _ => {}
            }
        }

        if let Some(id) = id {
            let id = id.parse().map_err(|_| FlowError::InvalidRequestId(id))?;
            state.request = Some(DappRequest {
                id,
                origin: origin.unwrap_or_default(),
            });
        }

        if let Some(confirm) = confirm {
            return Ok(SendFlow::Success { seqno: parse_seqno(confirm)? });
        }
        if let Some(seqno) = seqno {
            return Ok(SendFlow::Pending { seqno: parse_seqno(seqno)? });
        }
        if submit {
            return Ok(SendFlow::Confirm(state));
        }
        Ok(SendFlow::Input(state))
    }

    /// Percent-encoded query string, without the leading `?`
    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.to_pairs() {
            serializer.append_pair(key, &value);
        }
        serializer.finish()
    }

    pub fn from_query(query: &str) -> Result<SendFlow, FlowError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        SendFlow::from_pairs(form_urlencoded::parse(query.as_bytes()))
    }

    /// Slot contents to mirror to the background; `None` clears it
    pub fn pending_operation(&self) -> Option<PendingOperation> {
        if let SendFlow::Success { .. } = self {
            return None;
        }
        let params: serde_json::Map<String, serde_json::Value> = self
            .to_pairs()
            .into_iter()
            .map(|(key, value)| (key.to_string(), serde_json::Value::String(value)))
            .collect();
        Some(PendingOperation {
            kind: SEND_OPERATION.to_string(),
            value: serde_json::Value::Object(params).to_string(),
        })
    }

    /// Rebuild a flow from a stored pending operation
    pub fn from_pending_operation(operation: &PendingOperation) -> Result<SendFlow, FlowError> {
        if operation.kind != SEND_OPERATION {
            return Err(FlowError::InvalidOperation(operation.kind.clone()));
        }
        let params: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&operation.value)
                .map_err(|e| FlowError::InvalidOperation(e.to_string()))?;

        let pairs = params
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(value) => Some((key, value)),
                _ => None,
            });
        SendFlow::from_pairs(pairs)
    }
}

fn parse_seqno(value: String) -> Result<u32, FlowError> {
    value.parse().map_err(|_| FlowError::InvalidSeqno(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "EQD4FPq-PRDieyQKkizFTRtSDyucUIqrj0v_zXJmqaDp6_0t";

    fn filled_state() -> SendState {
        SendState::default()
            .with_address(ADDRESS)
            .with_amount("1.25")
            .with_comment("thanks & see you at 50% off? #1")
    }

    #[test]
    fn test_phase_from_query() {
        assert_eq!(SendFlow::from_query("").unwrap(), SendFlow::Input(SendState::default()));
        assert!(matches!(
            SendFlow::from_query("address=a&amount=1&submit=1").unwrap(),
            SendFlow::Confirm(_)
        ));
        assert_eq!(SendFlow::from_query("seqno=7").unwrap(), SendFlow::Pending { seqno: 7 });
        assert_eq!(
            SendFlow::from_query("?seqno=7&confirm=7").unwrap(),
            SendFlow::Success { seqno: 7 }
        );
    }

    #[test]
    fn test_query_round_trip_preserves_encoded_text() {
        let flow = SendFlow::Confirm(filled_state());
        let query = flow.to_query();

        assert!(!query.contains(' '));
        assert!(!query.contains("&see"));
        assert!(query.ends_with("submit=1"));
        assert_eq!(SendFlow::from_query(&query).unwrap(), flow);
    }

    #[test]
    fn test_dapp_request_round_trip() {
        let mut state = filled_state();
        state.request = Some(DappRequest {
            id: 42,
            origin: "https://dapp.example/?a=b".to_string(),
        });
        let flow = SendFlow::Input(state);

        assert_eq!(SendFlow::from_query(&flow.to_query()).unwrap(), flow);
    }

    #[test]
    fn test_amount_and_max_move_together() {
        let state = SendState::default().with_max("10.5");
        assert!(state.max);
        assert_eq!(state.amount, "10.5");

        let state = state.with_amount("3");
        assert!(!state.max);
        assert_eq!(state.amount, "3");

        let query = SendFlow::Input(SendState::default().with_max("7")).to_query();
        assert!(query.contains("max=1"));
    }

    #[test]
    fn test_transitions() {
        let flow = SendFlow::Input(filled_state());
        let flow = flow.submit().unwrap();
        assert_eq!(flow.phase(), "confirm");

        let edited = flow.clone().edit().unwrap();
        assert_eq!(edited, SendFlow::Input(filled_state()));

        let flow = flow.sent(12).unwrap();
        assert_eq!(flow, SendFlow::Pending { seqno: 12 });

        let flow = flow.confirmed().unwrap();
        assert_eq!(flow, SendFlow::Success { seqno: 12 });
    }

    #[test]
    fn test_invalid_transitions() {
        assert_eq!(
            SendFlow::Pending { seqno: 1 }.submit(),
            Err(FlowError::InvalidTransition { action: "submit", phase: "pending" })
        );
        assert!(SendFlow::Input(filled_state()).confirmed().is_err());
        assert!(SendFlow::Success { seqno: 1 }.edit().is_err());
    }

    #[test]
    fn test_submit_validates_fields() {
        let bad_address = SendFlow::Input(filled_state().with_address("nope"));
        assert_eq!(bad_address.submit(), Err(FlowError::InvalidAddress("nope".to_string())));

        let zero = SendFlow::Input(filled_state().with_amount("0"));
        assert_eq!(zero.submit(), Err(FlowError::InvalidAmount("0".to_string())));

        let raw = format!("0:{}", "ab".repeat(32));
        assert!(SendFlow::Input(filled_state().with_address(raw)).submit().is_ok());
    }

    #[test]
    fn test_invalid_seqno() {
        assert_eq!(
            SendFlow::from_query("seqno=soon"),
            Err(FlowError::InvalidSeqno("soon".to_string()))
        );
        assert!(SendFlow::from_query("id=x&origin=y").is_err());
    }

    #[test]
    fn test_pending_operation_resumes_flow() {
        let flows = [
            SendFlow::Input(filled_state()),
            SendFlow::Confirm(filled_state()),
            SendFlow::Pending { seqno: 99 },
        ];
        for flow in flows {
            let operation = flow.pending_operation().unwrap();
            assert_eq!(operation.kind, SEND_OPERATION);
            assert_eq!(SendFlow::from_pending_operation(&operation).unwrap(), flow);
        }
    }

    #[test]
    fn test_success_clears_pending_operation() {
        assert_eq!(SendFlow::Success { seqno: 3 }.pending_operation(), None);
    }

    #[test]
    fn test_foreign_pending_operation_rejected() {
        let operation = PendingOperation {
            kind: "swap".to_string(),
            value: "{}".to_string(),
        };
        assert!(SendFlow::from_pending_operation(&operation).is_err());
    }

    #[test]
    fn test_transfer_drops_empty_comment() {
        let transfer = filled_state().with_comment("").transfer();
        assert_eq!(transfer.comment, None);
        assert_eq!(transfer.address, ADDRESS);
    }
}
