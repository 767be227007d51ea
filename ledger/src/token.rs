//! Token ledger: mint, burn, transfer and balance queries.
//!
//! Each public operation is one invocation's unit of work. Any error return
//! leaves the host to discard the writes already issued.

use tracing::{info, instrument};

use tokensettle_common::{AccountId, Amount, Currency, LedgerError, Result};

use crate::auth::{require_central_bank, AuthorizationGate, RolePolicy};
use crate::balance::{BalanceChange, BalanceChangeType, BalanceSheet};
use crate::store::{IdentitySource, LedgerStore};

/// Debit an existing account. Fails with `NotFound` if the record was never
/// written and with `InsufficientFunds` if `amount` exceeds the balance.
pub fn debit<S: LedgerStore + ?Sized>(
    sheet: &mut BalanceSheet<'_, S>,
    currency: &Currency,
    account: &AccountId,
    amount: Amount,
) -> Result<BalanceChange> {
    let source = sheet.read_debit_source(currency, account)?;
    let after = source.amount.checked_sub(amount)?;
    sheet.write(&source, after)?;

    Ok(BalanceChange {
        key: source.key,
        change_type: BalanceChangeType::Debit,
        amount,
        balance_before: source.amount,
        balance_after: after,
    })
}

/// Credit an account, creating the record if absent.
pub fn credit<S: LedgerStore + ?Sized>(
    sheet: &mut BalanceSheet<'_, S>,
    currency: &Currency,
    account: &AccountId,
    amount: Amount,
) -> Result<BalanceChange> {
    let target = sheet.read_credit_target(currency, account)?;
    let after = target.amount.checked_add(amount)?;
    sheet.write(&target, after)?;

    Ok(BalanceChange {
        key: target.key,
        change_type: BalanceChangeType::Credit,
        amount,
        balance_before: target.amount,
        balance_after: after,
    })
}

/// Single-currency token operations.
#[derive(Debug, Clone, Default)]
pub struct TokenLedger<G = RolePolicy> {
    gate: G,
}

impl<G: AuthorizationGate> TokenLedger<G> {
    /// Create a token ledger guarded by an authorization gate.
    pub fn new(gate: G) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    /// Create `amount` new units in an account. Central bank only.
    #[instrument(skip_all, fields(currency = %currency, account = %account, amount = %amount))]
    pub fn mint<C>(
        &self,
        ctx: &mut C,
        currency: &Currency,
        account: &AccountId,
        amount: Amount,
    ) -> Result<String>
    where
        C: LedgerStore + IdentitySource + ?Sized,
    {
        require_central_bank(&self.gate, &*ctx, "mint tokens")?;

        let mut sheet = BalanceSheet::new(ctx);
        let change = credit(&mut sheet, currency, account, amount)?;

        info!(
            key = %change.key,
            balance_after = %change.balance_after,
            "Tokens minted"
        );

        Ok(format!(
            "Minted {} {} tokens for account {}",
            amount, currency, account
        ))
    }

    /// Destroy `amount` units from an existing account. Central bank only.
    #[instrument(skip_all, fields(currency = %currency, account = %account, amount = %amount))]
    pub fn burn<C>(
        &self,
        ctx: &mut C,
        currency: &Currency,
        account: &AccountId,
        amount: Amount,
    ) -> Result<String>
    where
        C: LedgerStore + IdentitySource + ?Sized,
    {
        require_central_bank(&self.gate, &*ctx, "burn tokens")?;

        let mut sheet = BalanceSheet::new(ctx);
        let change = debit(&mut sheet, currency, account, amount)?;

        info!(
            key = %change.key,
            balance_after = %change.balance_after,
            "Tokens burned"
        );

        Ok(format!(
            "Burned {} {} tokens from account {}",
            amount, currency, account
        ))
    }

    /// Move units between two accounts in one currency.
    ///
    /// No authorization is applied: binding the sender account to the caller
    /// identity is the responsibility of the platform in front of the ledger.
    #[instrument(skip_all, fields(currency = %currency, sender = %sender, receiver = %receiver, amount = %amount))]
    pub fn transfer<C>(
        &self,
        ctx: &mut C,
        currency: &Currency,
        sender: &AccountId,
        receiver: &AccountId,
        amount: Amount,
    ) -> Result<String>
    where
        C: LedgerStore + ?Sized,
    {
        let mut sheet = BalanceSheet::new(ctx);
        let debited = debit(&mut sheet, currency, sender, amount)?;
        let credited = credit(&mut sheet, currency, receiver, amount)?;

        info!(
            sender_balance = %debited.balance_after,
            receiver_balance = %credited.balance_after,
            "Tokens transferred"
        );

        Ok(format!(
            "Transferred {} {} tokens from {} to {}",
            amount, currency, sender, receiver
        ))
    }

    /// Read a balance. `NotFound` if the record was never written.
    pub fn query_balance<C>(
        &self,
        ctx: &mut C,
        currency: &Currency,
        account: &AccountId,
    ) -> Result<Amount>
    where
        C: LedgerStore + ?Sized,
    {
        let mut sheet = BalanceSheet::new(ctx);
        sheet
            .read(currency, account)?
            .map(|balance| balance.amount)
            .ok_or_else(|| {
                LedgerError::NotFound(format!(
                    "Account {} not found for currency {}",
                    account, currency
                ))
            })
    }
}
