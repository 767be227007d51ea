//! TokenSettle Settlement
//!
//! Interbank settlement on top of the token ledger: domestic and cross-border
//! settlements composed from one debit and one credit, a participant
//! registry, and the dispatcher that maps named invocations onto them.

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod registry;

pub use config::{AuthConfig, NodeConfig};
pub use dispatcher::{Dispatcher, Function};
pub use engine::SettlementEngine;
pub use registry::{OrgRecord, Registry};
