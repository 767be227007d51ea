//! Ledger store adapter contract.
//!
//! The host platform owns the store. One invocation's reads and writes are
//! committed together or discarded together; the engine never sees writes
//! from concurrent invocations and has no rollback of its own.

use tokensettle_common::Result;

/// Invocation-scoped key-value access to the host ledger.
pub trait LedgerStore {
    /// Read a key. `None` if the key was never written.
    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a key. Visible to other invocations only after the host commits.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<()>;
}

/// Access to the caller identity resolved by the host before invocation.
pub trait IdentitySource {
    /// Serialized identity of the invoking client.
    fn caller_identity(&self) -> Result<Vec<u8>>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for &mut S {
    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get_state(key)
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        (**self).put_state(key, value)
    }
}

impl<I: IdentitySource + ?Sized> IdentitySource for &mut I {
    fn caller_identity(&self) -> Result<Vec<u8>> {
        (**self).caller_identity()
    }
}
