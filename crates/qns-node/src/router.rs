//! Command dispatch onto [`NameServiceApi`].

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use qns_registry::prelude::*;
use qns_telemetry::{gather_metrics, record_operation, record_resolution, OperationTimer};

use crate::commands::{Command, Envelope, Response};

/// Logs every event and keeps a copy for the command's response.
#[derive(Debug, Clone, Default)]
pub struct NodeSink {
    pub recorder: RecordingSink,
    log: TracingSink,
}

impl NotificationSink for NodeSink {
    fn emit(&self, event: RegistryEvent) {
        self.log.emit(event.clone());
        self.recorder.emit(event);
    }
}

/// Executes commands one at a time against the service.
pub struct CommandRouter<S> {
    service: S,
    events: RecordingSink,
}

impl<S: NameServiceApi> CommandRouter<S> {
    /// `events` must share its log with the service's sink.
    pub fn new(service: S, events: RecordingSink) -> Self {
        Self { service, events }
    }

    /// Parse and execute one JSON line.
    pub fn handle_line(&mut self, line: &str) -> Response {
        match serde_json::from_str::<Envelope>(line) {
            Ok(envelope) => self.handle(envelope),
            Err(e) => {
                warn!(error = %e, "[qns-node] Malformed command");
                let response = Response::failure(RegistryErrorPayload {
                    kind: ErrorKind::InvalidFormat,
                    message: format!("malformed command: {e}"),
                });
                record_operation("malformed", &response.outcome());
                response
            }
        }
    }

    pub fn handle(&mut self, envelope: Envelope) -> Response {
        let operation = envelope.command.name();
        let _timer = OperationTimer::start(operation);
        // Failed commands commit nothing, so the log only ever holds this
        // command's events.
        self.events.take();

        let response = match self.dispatch(envelope) {
            Ok(result) => Response::success(result, self.events.take()),
            Err(err) => {
                debug!(operation, error = %err, "[qns-node] Command failed");
                Response::failure(RegistryErrorPayload::from(&err))
            }
        };

        let outcome = response.outcome();
        record_operation(operation, &outcome);
        if operation == "resolve" {
            record_resolution(&outcome);
        }
        response
    }

    fn dispatch(&mut self, envelope: Envelope) -> Result<Value, RegistryError> {
        let auth = envelope.authorizer();
        let service = &mut self.service;
        match envelope.command {
            Command::Symbol => to_value(service.symbol()),
            Command::Decimals => to_value(service.decimals()),
            Command::TotalSupply => to_value(service.total_supply()?),
            Command::OwnerOf { token_id } => to_value(service.owner_of(&token_id)?),
            Command::PropertiesOf { token_id } => to_value(service.properties_of(&token_id)?),
            Command::BalanceOf { owner } => to_value(service.balance_of(&owner)?),
            Command::Tokens => to_value(service.tokens()?),
            Command::TokensOf { owner } => to_value(service.tokens_of(&owner)?),
            Command::Roots => to_value(service.roots()?),
            Command::Transfer { to, token_id, data } => {
                let data = data.as_deref().map(str::as_bytes);
                to_value(service.transfer(&auth, to, &token_id, data)?)
            }
            Command::SetPriceTable { prices } => to_value(service.set_price_table(&auth, prices)?),
            Command::GetPrice { length } => to_value(service.get_price(length)?),
            Command::IsAvailable { name } => to_value(service.is_available(&name)?),
            Command::Register(request) => to_value(service.register(&auth, request)?),
            Command::Renew { name, years } => to_value(service.renew(&auth, &name, years)?),
            Command::SetAdmin { name, admin } => to_value(service.set_admin(&auth, &name, admin)?),
            Command::UpdateSoa { name, soa } => to_value(service.update_soa(&auth, &name, soa)?),
            Command::SetRecord {
                name,
                record_type,
                id,
                data,
            } => to_value(service.set_record(&auth, &name, record_type, id, &data)?),
            Command::AddRecord {
                name,
                record_type,
                data,
            } => to_value(service.add_record(&auth, &name, record_type, &data)?),
            Command::GetRecords { name, record_type } => {
                to_value(service.get_records(&name, record_type)?)
            }
            Command::GetRecord {
                name,
                record_type,
                id,
            } => to_value(service.get_record(&name, record_type, id)?),
            Command::GetAllRecords { name } => to_value(service.get_all_records(&name)?),
            Command::DeleteRecord {
                name,
                record_type,
                id,
            } => to_value(service.delete_record(&auth, &name, record_type, id)?),
            Command::DeleteRecords { name, record_type } => {
                to_value(service.delete_records(&auth, &name, record_type)?)
            }
            Command::Resolve { name, record_type } => to_value(service.resolve(&name, record_type)?),
            Command::Metrics => {
                let text = gather_metrics().map_err(|e| RegistryError::Corrupted {
                    reason: e.to_string(),
                })?;
                to_value(text)
            }
        }
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value, RegistryError> {
    serde_json::to_value(value).map_err(|e| RegistryError::Serialization {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const START: u64 = 1_700_000_000_000;
    const OWNER: &str = "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a";

    type TestService =
        NameService<InMemoryKVStore, MeteredFeeMeter, ManualClock, NodeSink, NoopTransferHook>;

    fn make_router() -> CommandRouter<TestService> {
        let sink = NodeSink::default();
        let events = sink.recorder.clone();
        let deps = NameServiceDependencies {
            kv_store: InMemoryKVStore::new(),
            fee_meter: MeteredFeeMeter::unlimited(),
            clock: ManualClock::new(START),
            sink,
            hook: NoopTransferHook,
        };
        let service = NameService::new(deps, RegistryConfig::default()).unwrap();
        CommandRouter::new(service, events)
    }

    fn send(router: &mut CommandRouter<TestService>, command: Value) -> Response {
        router.handle_line(&command.to_string())
    }

    fn register(name: &str, committee: bool) -> Value {
        json!({
            "op": "register",
            "name": name,
            "owner": OWNER,
            "soa": {"email": "admin.example.com", "refresh": 3600, "retry": 600, "expire": 86400, "ttl": 300},
            "signers": [OWNER],
            "committee": committee,
        })
    }

    #[test]
    fn test_register_and_resolve_session() {
        let mut router = make_router();

        let response = send(&mut router, register("com", true));
        assert!(response.ok);
        assert_eq!(response.result, Some(json!(true)));
        assert_eq!(response.events.len(), 1);

        assert!(send(&mut router, register("example.com", false)).ok);
        let added = send(
            &mut router,
            json!({
                "op": "add_record",
                "name": "example.com",
                "record_type": "A",
                "data": "93.184.216.34",
                "signers": [OWNER],
            }),
        );
        assert_eq!(added.result, Some(json!(0)));
        assert!(added.events.is_empty());

        let resolved = send(
            &mut router,
            json!({"op": "resolve", "name": "example.com.", "record_type": "A"}),
        );
        assert_eq!(resolved.result, Some(json!(["93.184.216.34"])));

        let supply = send(&mut router, json!({"op": "total_supply"}));
        assert_eq!(supply.result, Some(json!(2)));
    }

    #[test]
    fn test_errors_carry_kind() {
        let mut router = make_router();
        let response = send(&mut router, register("com", false));
        assert!(!response.ok);
        assert_eq!(response.error.unwrap().kind, ErrorKind::NotAuthorized);

        let response = send(
            &mut router,
            json!({"op": "owner_of", "token_id": "example.com"}),
        );
        assert_eq!(response.error.unwrap().kind, ErrorKind::UnknownToken);
    }

    #[test]
    fn test_malformed_lines() {
        let mut router = make_router();
        for line in ["not json", r#"{"op":"launch"}"#, r#"{"op":"renew"}"#] {
            let response = router.handle_line(line);
            assert!(!response.ok, "{line}");
            assert_eq!(response.error.unwrap().kind, ErrorKind::InvalidFormat);
        }
    }

    #[test]
    fn test_metrics_command() {
        qns_telemetry::register_metrics().unwrap();
        let mut router = make_router();
        send(&mut router, json!({"op": "symbol"}));
        let response = send(&mut router, json!({"op": "metrics"}));
        let text = response.result.unwrap();
        assert!(text
            .as_str()
            .unwrap()
            .contains("qns_registry_operations_total"));
    }
}
