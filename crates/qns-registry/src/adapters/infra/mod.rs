//! Process-local collaborators: clock, witnesses, fee burning, event
//! delivery and transfer callbacks.

mod authorizer;
mod clock;
mod events;
mod fees;
mod hooks;

pub use authorizer::StaticAuthorizer;
pub use clock::{ManualClock, SystemClock};
pub use events::{RecordingSink, TracingSink};
pub use fees::MeteredFeeMeter;
pub use hooks::{NoopTransferHook, RejectingTransferHook};
