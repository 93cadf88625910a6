//! JSON-lines wire format.
//!
//! One request object per line:
//!
//! ```text
//! {"op":"register","name":"com","owner":"0x..","soa":{..},"signers":["0x.."],"committee":true}
//! {"op":"resolve","name":"example.com","record_type":"A"}
//! ```
//!
//! One response object per line:
//!
//! ```text
//! {"ok":true,"result":["93.184.216.34"]}
//! {"ok":false,"error":{"kind":"UnknownToken","message":"unknown token: example.net"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use qns_registry::prelude::*;

/// A command plus the witnesses it was submitted with.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Accounts that signed the command.
    #[serde(default)]
    pub signers: Vec<Account>,
    /// Whether the governance quorum approved it.
    #[serde(default)]
    pub committee: bool,
    #[serde(flatten)]
    pub command: Command,
}

impl Envelope {
    pub fn authorizer(&self) -> StaticAuthorizer {
        StaticAuthorizer::signed_by(self.signers.iter().copied()).with_quorum(self.committee)
    }
}

/// Every operation of the name service.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Symbol,
    Decimals,
    TotalSupply,
    OwnerOf { token_id: String },
    PropertiesOf { token_id: String },
    BalanceOf { owner: Account },
    Tokens,
    TokensOf { owner: Account },
    Roots,
    Transfer {
        to: Account,
        token_id: String,
        #[serde(default)]
        data: Option<String>,
    },
    SetPriceTable { prices: Vec<i64> },
    GetPrice { length: usize },
    IsAvailable { name: String },
    Register(RegisterRequest),
    Renew {
        name: String,
        #[serde(default = "one_year")]
        years: u64,
    },
    SetAdmin { name: String, admin: Option<Account> },
    UpdateSoa { name: String, soa: SoaFields },
    SetRecord {
        name: String,
        record_type: RecordType,
        id: u8,
        data: String,
    },
    AddRecord {
        name: String,
        record_type: RecordType,
        data: String,
    },
    GetRecords { name: String, record_type: RecordType },
    GetRecord {
        name: String,
        record_type: RecordType,
        id: u8,
    },
    GetAllRecords { name: String },
    DeleteRecord {
        name: String,
        record_type: RecordType,
        id: u8,
    },
    DeleteRecords { name: String, record_type: RecordType },
    Resolve { name: String, record_type: RecordType },
    /// Prometheus text dump of the node's counters.
    Metrics,
}

fn one_year() -> u64 {
    1
}

impl Command {
    /// Metric label for the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Symbol => "symbol",
            Self::Decimals => "decimals",
            Self::TotalSupply => "total_supply",
            Self::OwnerOf { .. } => "owner_of",
            Self::PropertiesOf { .. } => "properties_of",
            Self::BalanceOf { .. } => "balance_of",
            Self::Tokens => "tokens",
            Self::TokensOf { .. } => "tokens_of",
            Self::Roots => "roots",
            Self::Transfer { .. } => "transfer",
            Self::SetPriceTable { .. } => "set_price_table",
            Self::GetPrice { .. } => "get_price",
            Self::IsAvailable { .. } => "is_available",
            Self::Register(_) => "register",
            Self::Renew { .. } => "renew",
            Self::SetAdmin { .. } => "set_admin",
            Self::UpdateSoa { .. } => "update_soa",
            Self::SetRecord { .. } => "set_record",
            Self::AddRecord { .. } => "add_record",
            Self::GetRecords { .. } => "get_records",
            Self::GetRecord { .. } => "get_record",
            Self::GetAllRecords { .. } => "get_all_records",
            Self::DeleteRecord { .. } => "delete_record",
            Self::DeleteRecords { .. } => "delete_records",
            Self::Resolve { .. } => "resolve",
            Self::Metrics => "metrics",
        }
    }
}

/// Reply to one command line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RegistryErrorPayload>,
    /// Events committed by the command, in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<RegistryEvent>,
}

impl Response {
    pub fn success(result: Value, events: Vec<RegistryEvent>) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
            events,
        }
    }

    pub fn failure(error: RegistryErrorPayload) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error),
            events: Vec::new(),
        }
    }

    /// Metric outcome label: `ok` or the error kind.
    pub fn outcome(&self) -> String {
        match &self.error {
            None => "ok".to_string(),
            Some(payload) => format!("{:?}", payload.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_register_envelope() {
        let line = r#"{
            "op": "register",
            "name": "example.com",
            "owner": "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a",
            "soa": {"email": "admin.example.com", "refresh": 1, "retry": 2, "expire": 3, "ttl": 4},
            "signers": ["0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a"]
        }"#;
        let envelope: Envelope = serde_json::from_str(line).unwrap();
        assert!(!envelope.committee);
        assert_eq!(envelope.signers.len(), 1);
        match envelope.command {
            Command::Register(request) => {
                assert_eq!(request.name, "example.com");
                assert_eq!(request.period_secs, ONE_YEAR_SECS);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_renew_defaults_to_one_year() {
        let envelope: Envelope =
            serde_json::from_str(r#"{"op":"renew","name":"example.com"}"#).unwrap();
        assert!(matches!(envelope.command, Command::Renew { years: 1, .. }));
        assert_eq!(envelope.command.name(), "renew");
    }

    #[test]
    fn test_failure_serialization() {
        let err = RegistryError::UnknownToken {
            name: "example.net".to_string(),
        };
        let response = Response::failure(RegistryErrorPayload::from(&err));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"]["kind"], "UnknownToken");
        assert!(json.get("result").is_none());
        assert_eq!(response.outcome(), "UnknownToken");
    }
}
