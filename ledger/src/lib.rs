//! TokenSettle Ledger
//!
//! Balance accounting engine for a multi-currency token ledger. Operations
//! read balances through the host store adapter, validate, and write new
//! balances back; the host commits or discards each invocation as a whole.

pub mod keys;
pub mod store;
pub mod balance;
pub mod auth;
pub mod token;
pub mod memory;

pub use keys::{balance_key, org_key};
pub use store::{IdentitySource, LedgerStore};
pub use balance::{AccountBalance, BalanceChange, BalanceChangeType, BalanceSheet};
pub use auth::{AuthorizationGate, CallerIdentity, RolePolicy};
pub use token::TokenLedger;
pub use memory::{Invocation, MemoryLedger};
