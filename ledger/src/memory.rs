//! In-memory host ledger with optimistic concurrency control.
//!
//! Mirrors the contract of the production host: every key carries a version,
//! an invocation records the version of each key it reads and buffers its
//! writes, and the commit is validated against the read-set afterwards. A
//! stale read discards the whole write-set. Reads never observe the
//! invocation's own buffered writes.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tokensettle_common::{Amount, Currency, LedgerError, Result};

use crate::keys::parse_balance_key;
use crate::store::{IdentitySource, LedgerStore};

/// A committed value and the version that wrote it.
#[derive(Debug, Clone)]
struct VersionedValue {
    value: Vec<u8>,
    version: u64,
}

/// Versioned key-value ledger shared by concurrent invocations.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<HashMap<String, VersionedValue>>,
}

/// One invocation's read-set and pending write-set.
pub struct Invocation<'l> {
    ledger: &'l MemoryLedger,
    id: Uuid,
    identity: Vec<u8>,
    /// Version observed at first read; 0 when the key was absent.
    read_set: HashMap<String, u64>,
    write_set: BTreeMap<String, Vec<u8>>,
}

impl<'l> Invocation<'l> {
    /// Invocation identifier, for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Keys written so far.
    pub fn pending_writes(&self) -> usize {
        self.write_set.len()
    }
}

impl LedgerStore for Invocation<'_> {
    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        let state = self.ledger.state.lock();
        let entry = state.get(key);
        let version = entry.map(|v| v.version).unwrap_or(0);
        self.read_set.entry(key.to_string()).or_insert(version);
        Ok(entry.map(|v| v.value.clone()))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.write_set.insert(key.to_string(), value);
        Ok(())
    }
}

impl IdentitySource for Invocation<'_> {
    fn caller_identity(&self) -> Result<Vec<u8>> {
        Ok(self.identity.clone())
    }
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an invocation on behalf of a caller.
    pub fn begin(&self, identity: impl Into<Vec<u8>>) -> Invocation<'_> {
        let invocation = Invocation {
            ledger: self,
            id: Uuid::new_v4(),
            identity: identity.into(),
            read_set: HashMap::new(),
            write_set: BTreeMap::new(),
        };
        debug!(invocation_id = %invocation.id, "Invocation started");
        invocation
    }

    /// Validate the read-set and apply the write-set atomically.
    ///
    /// Returns the number of keys written.
    pub fn commit(&self, invocation: Invocation<'_>) -> Result<usize> {
        let mut state = self.state.lock();

        for (key, seen) in &invocation.read_set {
            let current = state.get(key).map(|v| v.version).unwrap_or(0);
            if current != *seen {
                warn!(
                    invocation_id = %invocation.id,
                    key = %key,
                    seen = seen,
                    current = current,
                    "Read conflict, invocation discarded"
                );
                return Err(LedgerError::Conflict(key.clone()));
            }
        }

        let written = invocation.write_set.len();
        for (key, value) in invocation.write_set {
            let version = state.get(&key).map(|v| v.version).unwrap_or(0) + 1;
            state.insert(key, VersionedValue { value, version });
        }

        info!(invocation_id = %invocation.id, writes = written, "Invocation committed");
        Ok(written)
    }

    /// Drop an invocation's writes.
    pub fn discard(&self, invocation: Invocation<'_>) {
        debug!(
            invocation_id = %invocation.id,
            writes = invocation.write_set.len(),
            "Invocation discarded"
        );
    }

    /// Run an operation as one invocation: commit on success, discard on error.
    pub fn execute<T, F>(&self, identity: impl Into<Vec<u8>>, op: F) -> Result<T>
    where
        F: FnOnce(&mut Invocation<'_>) -> Result<T>,
    {
        let mut invocation = self.begin(identity);
        match op(&mut invocation) {
            Ok(value) => {
                self.commit(invocation)?;
                Ok(value)
            }
            Err(e) => {
                self.discard(invocation);
                Err(e)
            }
        }
    }

    /// Read committed state outside any invocation.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.state.lock().get(key).map(|v| v.value.clone())
    }

    /// Committed version of a key; 0 if never written.
    pub fn version(&self, key: &str) -> u64 {
        self.state.lock().get(key).map(|v| v.version).unwrap_or(0)
    }

    /// Copy of all committed key-value pairs, ordered by key.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.state
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect()
    }

    /// Sum of all committed balances in a currency.
    pub fn total_supply(&self, currency: &Currency) -> Result<u128> {
        let state = self.state.lock();
        let mut total: u128 = 0;
        for (key, entry) in state.iter() {
            match parse_balance_key(key) {
                Some((c, _)) if &c == currency => {
                    let amount = Amount::decode(key, &entry.value)?;
                    total += u128::from(amount.units());
                }
                _ => {}
            }
        }
        Ok(total)
    }
}
