//! TokenSettle Common Types
//!
//! This crate contains shared types used across the TokenSettle ledger,
//! including identifiers, integer monetary types, the settlement domain
//! model and the error taxonomy.

pub mod identifiers;
pub mod monetary;
pub mod settlement;
pub mod error;

pub use identifiers::*;
pub use monetary::*;
pub use settlement::*;
pub use error::*;
