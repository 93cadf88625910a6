//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Ports (Inbound)**: `NameServiceApi`
//! - **Driven Ports (Outbound)**: `KeyValueStore`, `Authorizer`, `FeeMeter`,
//!   `NotificationSink`, `Clock`, `TransferHook`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
