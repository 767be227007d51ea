//! Account balance records and the invocation-local balance sheet.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use tokensettle_common::{AccountId, Amount, Currency, LedgerError, Result};

use crate::keys::balance_key;
use crate::store::LedgerStore;

/// Balance of one (currency, account) record as read in this invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub currency: Currency,
    pub account: AccountId,
    /// Ledger key of the record.
    pub key: String,
    /// Current amount; zero when the record does not exist.
    pub amount: Amount,
    /// Whether the record has ever been written.
    pub existed: bool,
}

/// Balance change produced by one primitive mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    /// Ledger key affected.
    pub key: String,
    /// Change type.
    pub change_type: BalanceChangeType,
    /// Amount changed.
    pub amount: Amount,
    /// Balance before change.
    pub balance_before: Amount,
    /// Balance after change.
    pub balance_after: Amount,
}

/// Type of balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceChangeType {
    /// Credit (increase).
    Credit,
    /// Debit (decrease).
    Debit,
}

/// Balance reads and writes for a single invocation.
///
/// The host does not guarantee that a read returns a write issued earlier in
/// the same invocation, so the sheet keeps every balance it has written and
/// answers later reads of that key from memory. Debiting and crediting the
/// same key in one invocation therefore composes correctly.
pub struct BalanceSheet<'s, S: LedgerStore + ?Sized> {
    store: &'s mut S,
    pending: HashMap<String, Amount>,
}

impl<'s, S: LedgerStore + ?Sized> BalanceSheet<'s, S> {
    /// Open a sheet over the invocation's store.
    pub fn new(store: &'s mut S) -> Self {
        Self {
            store,
            pending: HashMap::new(),
        }
    }

    /// Read a balance record, `None` if it was never written.
    pub fn read(&mut self, currency: &Currency, account: &AccountId) -> Result<Option<AccountBalance>> {
        let key = balance_key(currency, account);

        let amount = match self.pending.get(&key) {
            Some(amount) => Some(*amount),
            None => match self.store.get_state(&key)? {
                Some(bytes) => Some(Amount::decode(&key, &bytes)?),
                None => None,
            },
        };

        debug!(key = %key, amount = ?amount.map(|a| a.units()), "Balance read");

        Ok(amount.map(|amount| AccountBalance {
            currency: currency.clone(),
            account: account.clone(),
            key,
            amount,
            existed: true,
        }))
    }

    /// Read an account that is about to be debited. It must exist.
    pub fn read_debit_source(
        &mut self,
        currency: &Currency,
        account: &AccountId,
    ) -> Result<AccountBalance> {
        self.read(currency, account)?.ok_or_else(|| {
            LedgerError::NotFound(format!("Account {} not found for currency {}", account, currency))
        })
    }

    /// Read an account that is about to be credited. Absent means zero.
    pub fn read_credit_target(
        &mut self,
        currency: &Currency,
        account: &AccountId,
    ) -> Result<AccountBalance> {
        Ok(self
            .read(currency, account)?
            .unwrap_or_else(|| AccountBalance {
                currency: currency.clone(),
                account: account.clone(),
                key: balance_key(currency, account),
                amount: Amount::ZERO,
                existed: false,
            }))
    }

    /// Write a new amount for a previously read record.
    pub fn write(&mut self, balance: &AccountBalance, amount: Amount) -> Result<()> {
        self.store.put_state(&balance.key, amount.encode())?;
        self.pending.insert(balance.key.clone(), amount);
        debug!(key = %balance.key, amount = %amount, "Balance written");
        Ok(())
    }

    /// Number of distinct keys written through this sheet.
    pub fn written_keys(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Store without read-your-writes, like the production host.
    #[derive(Default)]
    struct SnapshotStore {
        committed: BTreeMap<String, Vec<u8>>,
        writes: BTreeMap<String, Vec<u8>>,
    }

    impl LedgerStore for SnapshotStore {
        fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.committed.get(key).cloned())
        }

        fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
            self.writes.insert(key.to_string(), value);
            Ok(())
        }
    }

    fn rwf() -> Currency {
        Currency::new("RWF").unwrap()
    }

    fn a1() -> AccountId {
        AccountId::new("A1").unwrap()
    }

    #[test]
    fn test_absent_record_asymmetry() {
        let mut store = SnapshotStore::default();
        let mut sheet = BalanceSheet::new(&mut store);

        let err = sheet.read_debit_source(&rwf(), &a1()).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");

        let target = sheet.read_credit_target(&rwf(), &a1()).unwrap();
        assert_eq!(target.amount, Amount::ZERO);
        assert!(!target.existed);
    }

    #[test]
    fn test_zero_record_is_a_valid_debit_source() {
        let mut store = SnapshotStore::default();
        store.committed.insert("balance:RWF:A1".into(), b"0".to_vec());
        let mut sheet = BalanceSheet::new(&mut store);

        let source = sheet.read_debit_source(&rwf(), &a1()).unwrap();
        assert!(source.existed);
        assert_eq!(source.amount, Amount::ZERO);
    }

    #[test]
    fn test_reads_see_pending_writes() {
        let mut store = SnapshotStore::default();
        store.committed.insert("balance:RWF:A1".into(), b"600".to_vec());
        let mut sheet = BalanceSheet::new(&mut store);

        let balance = sheet.read_debit_source(&rwf(), &a1()).unwrap();
        sheet.write(&balance, Amount::new(500)).unwrap();

        let again = sheet.read_credit_target(&rwf(), &a1()).unwrap();
        assert_eq!(again.amount, Amount::new(500));
        assert_eq!(sheet.written_keys(), 1);
        assert_eq!(store.writes.get("balance:RWF:A1").unwrap(), b"500");
    }

    #[test]
    fn test_corrupt_record_is_store_failure() {
        let mut store = SnapshotStore::default();
        store.committed.insert("balance:RWF:A1".into(), b"-3".to_vec());
        let mut sheet = BalanceSheet::new(&mut store);

        let err = sheet.read_credit_target(&rwf(), &a1()).unwrap_err();
        assert_eq!(err.error_code(), "STORE_FAILURE");
    }
}
