//! # Resolver
//!
//! Record lookup that follows CNAME records. Each hop spends one unit of
//! the redirect budget; a lookup that would need a negative budget fails.

use tracing::debug;

use super::ledger::Ledger;
use crate::domain::errors::RegistryError;
use crate::domain::grammar::normalize;
use crate::domain::records::RecordType;
use crate::ports::outbound::KeyValueStore;

impl<KV: KeyValueStore> Ledger<'_, KV> {
    /// Data of every `record_type` record answering for `name`.
    ///
    /// A CNAME on `name` redirects the query to its target unless the query
    /// itself asks for CNAME records.
    pub fn resolve(
        &self,
        name: &str,
        record_type: RecordType,
        budget: i32,
        now: u64,
    ) -> Result<Vec<String>, RegistryError> {
        let name = normalize(name);
        if budget < 0 {
            return Err(RegistryError::TooManyRedirections {
                name: name.to_string(),
            });
        }

        let mut matches = Vec::new();
        let mut cname = None;
        for record in self.get_all_records(name, now)? {
            if record.record_type == record_type {
                matches.push(record.data.clone());
            }
            if record.record_type == RecordType::CNAME {
                cname = Some(record.data);
            }
        }

        match cname {
            Some(target) if record_type != RecordType::CNAME => {
                debug!(name, target = %target, budget, "[qns] Following CNAME");
                self.resolve(&target, record_type, budget - 1, now)
            }
            _ => Ok(matches),
        }
    }
}
