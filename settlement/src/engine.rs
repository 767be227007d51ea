//! Settlement engine.
//!
//! A settlement is exactly one debit and one credit issued through the same
//! balance sheet within one invocation. The engine never rolls back on its
//! own: any error after the debit write is returned to the host, which
//! discards the whole invocation.

use tracing::{debug, info, instrument};

use tokensettle_common::{
    AccountId, Amount, Currency, ExchangeRate, Result, SettlementKind, SettlementReceipt,
    SettlementRecord, SettlementStage,
};
use tokensettle_ledger::token::{credit, debit};
use tokensettle_ledger::{BalanceSheet, LedgerStore};

/// Executes domestic and cross-border settlements.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettlementEngine;

impl SettlementEngine {
    pub fn new() -> Self {
        Self
    }

    /// Move `amount` between two accounts in one currency.
    #[instrument(skip_all, fields(currency = %currency, sender = %sender, receiver = %receiver, amount = %amount))]
    pub fn settle_domestic<C>(
        &self,
        ctx: &mut C,
        currency: &Currency,
        sender: &AccountId,
        receiver: &AccountId,
        amount: Amount,
    ) -> Result<SettlementReceipt>
    where
        C: LedgerStore + ?Sized,
    {
        let record =
            SettlementRecord::domestic(currency.clone(), sender.clone(), receiver.clone(), amount);
        self.execute(ctx, record)
    }

    /// Debit `amount` of `from_currency` from the sender and credit
    /// `amount * rate` of `to_currency` to the receiver.
    ///
    /// Equal currencies are accepted and the rate still applies.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip_all, fields(
        from_currency = %from_currency,
        to_currency = %to_currency,
        sender = %sender,
        receiver = %receiver,
        amount = %amount,
        rate = %rate
    ))]
    pub fn settle_cross_border<C>(
        &self,
        ctx: &mut C,
        from_currency: &Currency,
        to_currency: &Currency,
        sender: &AccountId,
        receiver: &AccountId,
        amount: Amount,
        rate: ExchangeRate,
    ) -> Result<SettlementReceipt>
    where
        C: LedgerStore + ?Sized,
    {
        let record = SettlementRecord::cross_border(
            from_currency.clone(),
            to_currency.clone(),
            sender.clone(),
            receiver.clone(),
            amount,
            rate,
        );
        if record.is_same_currency() {
            debug!("Cross-border settlement within a single currency");
        }
        self.execute(ctx, record)
    }

    fn execute<C>(&self, ctx: &mut C, mut record: SettlementRecord) -> Result<SettlementReceipt>
    where
        C: LedgerStore + ?Sized,
    {
        let mut sheet = BalanceSheet::new(ctx);

        // Sender existence and funds are checked by the debit itself, before
        // anything is written.
        record.transition_to(SettlementStage::Debit)?;
        let debited = debit(
            &mut sheet,
            &record.from_currency,
            &record.from_account,
            record.amount,
        )?;
        debug!(key = %debited.key, balance = %debited.balance_after, "Sender debited");

        let credited_amount = match record.kind {
            SettlementKind::Domestic => record.amount,
            SettlementKind::CrossBorder => {
                record.transition_to(SettlementStage::Convert)?;
                let converted = record.exchange_rate.convert(record.amount)?;
                debug!(converted = %converted, "Amount converted");
                converted
            }
        };

        record.transition_to(SettlementStage::Credit)?;
        let credited = credit(
            &mut sheet,
            &record.to_currency,
            &record.to_account,
            credited_amount,
        )?;
        debug!(key = %credited.key, balance = %credited.balance_after, "Receiver credited");

        record.transition_to(SettlementStage::Commit)?;
        info!(
            kind = %record.kind,
            credited = %credited_amount,
            writes = sheet.written_keys(),
            "Settlement complete"
        );

        Ok(SettlementReceipt {
            record,
            credited: credited_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tokensettle_common::LedgerError;
    use tokensettle_ledger::{CallerIdentity, Invocation, MemoryLedger, RolePolicy, TokenLedger};

    fn cb() -> Vec<u8> {
        CallerIdentity::new("BNRMSP", "cn=governor")
            .with_attribute("role", "centralbank")
            .to_bytes()
    }

    fn bank() -> Vec<u8> {
        CallerIdentity::new("BankAMSP", "cn=settlement").to_bytes()
    }

    fn c(code: &str) -> Currency {
        Currency::new(code).unwrap()
    }

    fn a(id: &str) -> AccountId {
        AccountId::new(id).unwrap()
    }

    fn fund(ledger: &MemoryLedger, currency: &str, account: &str, amount: u64) {
        let tokens = TokenLedger::new(RolePolicy::default());
        ledger
            .execute(cb(), |inv| {
                tokens.mint(inv, &c(currency), &a(account), Amount::new(amount))
            })
            .unwrap();
    }

    fn balance(ledger: &MemoryLedger, currency: &str, account: &str) -> Option<u64> {
        ledger
            .get(&format!("balance:{}:{}", currency, account))
            .map(|bytes| String::from_utf8(bytes).unwrap().parse().unwrap())
    }

    fn cross_border(
        ledger: &MemoryLedger,
        from: &str,
        to: &str,
        sender: &str,
        receiver: &str,
        amount: u64,
        rate: u64,
    ) -> Result<SettlementReceipt> {
        let engine = SettlementEngine::new();
        ledger.execute(bank(), |inv| {
            engine.settle_cross_border(
                inv,
                &c(from),
                &c(to),
                &a(sender),
                &a(receiver),
                Amount::new(amount),
                ExchangeRate::new(rate)?,
            )
        })
    }

    /// Passes a fixed number of writes through, then fails every later one.
    struct FailingPuts<'a, 'l> {
        inner: &'a mut Invocation<'l>,
        puts_allowed: usize,
    }

    impl LedgerStore for FailingPuts<'_, '_> {
        fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
            self.inner.get_state(key)
        }

        fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
            if self.puts_allowed == 0 {
                return Err(LedgerError::StoreFailure(format!("Failed to update {}", key)));
            }
            self.puts_allowed -= 1;
            self.inner.put_state(key, value)
        }
    }

    #[test]
    fn test_domestic_settlement() {
        let ledger = MemoryLedger::new();
        fund(&ledger, "RWF", "A1", 1000);

        let engine = SettlementEngine::new();
        let receipt = ledger
            .execute(bank(), |inv| {
                engine.settle_domestic(inv, &c("RWF"), &a("A1"), &a("A2"), Amount::new(250))
            })
            .unwrap();

        assert_eq!(receipt.record.stage, SettlementStage::Commit);
        assert_eq!(receipt.credited, Amount::new(250));
        assert_eq!(
            receipt.message(),
            "Domestic settlement of 250 RWF from A1 to A2 complete"
        );
        assert_eq!(balance(&ledger, "RWF", "A1"), Some(750));
        assert_eq!(balance(&ledger, "RWF", "A2"), Some(250));
    }

    #[test]
    fn test_cross_border_scenario() {
        let ledger = MemoryLedger::new();
        fund(&ledger, "RWF", "A1", 600);

        let receipt = cross_border(&ledger, "RWF", "KES", "A1", "B1", 100, 5).unwrap();
        assert_eq!(receipt.credited, Amount::new(500));
        assert_eq!(
            receipt.message(),
            "Cross-border settlement complete: 100 RWF debited from A1 and 500 KES credited to B1"
        );
        assert_eq!(balance(&ledger, "RWF", "A1"), Some(500));
        assert_eq!(balance(&ledger, "KES", "B1"), Some(500));
        assert_eq!(balance(&ledger, "RWF", "B1"), None);
    }

    #[test]
    fn test_unknown_sender_writes_nothing() {
        let ledger = MemoryLedger::new();
        let err = cross_border(&ledger, "RWF", "KES", "ghost", "B1", 1, 1).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(ledger.snapshot().is_empty());
    }

    #[test]
    fn test_insufficient_funds_leaves_balances() {
        let ledger = MemoryLedger::new();
        fund(&ledger, "RWF", "A1", 50);

        let engine = SettlementEngine::new();
        let err = ledger
            .execute(bank(), |inv| {
                engine.settle_domestic(inv, &c("RWF"), &a("A1"), &a("A2"), Amount::new(51))
            })
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::InsufficientFunds { required: 51, available: 50 }
        ));
        assert_eq!(balance(&ledger, "RWF", "A1"), Some(50));
        assert_eq!(balance(&ledger, "RWF", "A2"), None);
    }

    #[test]
    fn test_same_account_same_currency_applies_rate() {
        let ledger = MemoryLedger::new();
        fund(&ledger, "RWF", "A1", 100);

        // Debit 10, credit 30 on the same record.
        cross_border(&ledger, "RWF", "RWF", "A1", "A1", 10, 3).unwrap();
        assert_eq!(balance(&ledger, "RWF", "A1"), Some(120));
    }

    #[test]
    fn test_domestic_self_settlement_is_neutral() {
        let ledger = MemoryLedger::new();
        fund(&ledger, "RWF", "A1", 100);

        let engine = SettlementEngine::new();
        ledger
            .execute(bank(), |inv| {
                engine.settle_domestic(inv, &c("RWF"), &a("A1"), &a("A1"), Amount::new(40))
            })
            .unwrap();
        assert_eq!(balance(&ledger, "RWF", "A1"), Some(100));
    }

    #[test]
    fn test_conversion_overflow_discards_debit() {
        let ledger = MemoryLedger::new();
        fund(&ledger, "RWF", "A1", 10);

        let err = cross_border(&ledger, "RWF", "KES", "A1", "B1", 10, u64::MAX).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
        assert_eq!(balance(&ledger, "RWF", "A1"), Some(10));
        assert_eq!(balance(&ledger, "KES", "B1"), None);
    }

    #[test]
    fn test_failed_credit_write_is_discarded_by_host() {
        let ledger = MemoryLedger::new();
        fund(&ledger, "RWF", "A1", 600);

        let engine = SettlementEngine::new();
        let result = ledger.execute(bank(), |inv| {
            let outcome = {
                let mut store = FailingPuts {
                    inner: &mut *inv,
                    puts_allowed: 1,
                };
                engine.settle_cross_border(
                    &mut store,
                    &c("RWF"),
                    &c("KES"),
                    &a("A1"),
                    &a("B1"),
                    Amount::new(100),
                    ExchangeRate::new(5)?,
                )
            };
            // The debit was issued before the credit failed.
            assert_eq!(inv.pending_writes(), 1);
            outcome
        });

        assert_eq!(result.unwrap_err().error_code(), "STORE_FAILURE");
        assert_eq!(balance(&ledger, "RWF", "A1"), Some(600));
        assert_eq!(balance(&ledger, "KES", "B1"), None);
    }

    proptest! {
        #[test]
        fn prop_cross_border_credits_exact_product(
            funded in 0u64..1_000_000,
            amount in 0u64..1_000_000,
            rate in 1u64..10_000,
        ) {
            let ledger = MemoryLedger::new();
            fund(&ledger, "RWF", "A1", funded);

            let result = cross_border(&ledger, "RWF", "KES", "A1", "B1", amount, rate);
            if amount <= funded {
                let receipt = result.unwrap();
                prop_assert_eq!(receipt.credited.units(), amount * rate);
                prop_assert_eq!(balance(&ledger, "RWF", "A1"), Some(funded - amount));
                prop_assert_eq!(balance(&ledger, "KES", "B1"), Some(amount * rate));
            } else {
                prop_assert!(result.is_err());
                prop_assert_eq!(balance(&ledger, "RWF", "A1"), Some(funded));
                prop_assert_eq!(balance(&ledger, "KES", "B1"), None);
            }
        }

        #[test]
        fn prop_domestic_conserves_supply(
            funded in 0u64..1_000_000,
            amount in 0u64..1_000_000,
            receiver in prop::sample::select(vec!["A1", "A2", "A3"]),
        ) {
            let ledger = MemoryLedger::new();
            fund(&ledger, "RWF", "A1", funded);

            let engine = SettlementEngine::new();
            let _ = ledger.execute(bank(), |inv| {
                engine.settle_domestic(inv, &c("RWF"), &a("A1"), &a(receiver), Amount::new(amount))
            });
            prop_assert_eq!(ledger.total_supply(&c("RWF")).unwrap(), u128::from(funded));
        }
    }
}
