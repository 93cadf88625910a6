use crate::events::RegistryEvent;
use crate::ports::outbound::NotificationSink;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Keeps every published event. Clones share the log.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<RegistryEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events published so far.
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events.lock().clone()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<RegistryEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl NotificationSink for RecordingSink {
    fn emit(&self, event: RegistryEvent) {
        self.events.lock().push(event);
    }
}

/// Writes events to the `tracing` pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn emit(&self, event: RegistryEvent) {
        match &event {
            RegistryEvent::Transfer {
                from, to, token_id, ..
            } => {
                info!(token_id = %token_id, from = ?from, to = ?to, "[qns] Transfer");
            }
            RegistryEvent::AdminChanged {
                name,
                old_admin,
                new_admin,
            } => {
                info!(name = %name, old = ?old_admin, new = ?new_admin, "[qns] Admin changed");
            }
        }
    }
}
