//! Settlement domain model and per-invocation stage machine.

use crate::{AccountId, Amount, Currency, ExchangeRate, LedgerError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementKind {
    /// Single-currency transfer between two accounts.
    Domestic,
    /// Two-currency conversion at a caller-supplied integer rate.
    CrossBorder,
}

impl fmt::Display for SettlementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementKind::Domestic => write!(f, "Domestic"),
            SettlementKind::CrossBorder => write!(f, "CrossBorder"),
        }
    }
}

/// Stage of a settlement within one invocation.
///
/// Nothing is persisted between stages; the stage only orders the work and
/// guards against running a step twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStage {
    /// Arguments parsed, sender balance not yet checked.
    Validate,
    /// Sender debited.
    Debit,
    /// Amount converted into the destination currency.
    Convert,
    /// Receiver credited.
    Credit,
    /// Both writes issued; the host commits them together.
    Commit,
}

impl SettlementStage {
    /// Get valid next stages for a settlement kind.
    pub fn valid_transitions(&self, kind: SettlementKind) -> &'static [SettlementStage] {
        match (self, kind) {
            (SettlementStage::Validate, _) => &[SettlementStage::Debit],
            (SettlementStage::Debit, SettlementKind::Domestic) => &[SettlementStage::Credit],
            (SettlementStage::Debit, SettlementKind::CrossBorder) => &[SettlementStage::Convert],
            (SettlementStage::Convert, SettlementKind::CrossBorder) => &[SettlementStage::Credit],
            (SettlementStage::Convert, SettlementKind::Domestic) => &[],
            (SettlementStage::Credit, _) => &[SettlementStage::Commit],
            (SettlementStage::Commit, _) => &[],
        }
    }

    /// Check if transition to given stage is valid.
    pub fn can_transition_to(&self, kind: SettlementKind, next: SettlementStage) -> bool {
        self.valid_transitions(kind).contains(&next)
    }

    pub fn is_final(&self) -> bool {
        matches!(self, SettlementStage::Commit)
    }
}

/// A settlement request: exactly one debit and one credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub from_account: AccountId,
    pub to_account: AccountId,
    pub from_currency: Currency,
    pub to_currency: Currency,
    /// Amount in source currency units.
    pub amount: Amount,
    /// Integer multiplier; always 1 for domestic settlements.
    pub exchange_rate: ExchangeRate,
    pub kind: SettlementKind,
    /// Current stage.
    pub stage: SettlementStage,
}

impl SettlementRecord {
    /// Create a domestic settlement.
    pub fn domestic(
        currency: Currency,
        from_account: AccountId,
        to_account: AccountId,
        amount: Amount,
    ) -> Self {
        Self {
            from_account,
            to_account,
            from_currency: currency.clone(),
            to_currency: currency,
            amount,
            exchange_rate: ExchangeRate::ONE,
            kind: SettlementKind::Domestic,
            stage: SettlementStage::Validate,
        }
    }

    /// Create a cross-border settlement.
    pub fn cross_border(
        from_currency: Currency,
        to_currency: Currency,
        from_account: AccountId,
        to_account: AccountId,
        amount: Amount,
        exchange_rate: ExchangeRate,
    ) -> Self {
        Self {
            from_account,
            to_account,
            from_currency,
            to_currency,
            amount,
            exchange_rate,
            kind: SettlementKind::CrossBorder,
            stage: SettlementStage::Validate,
        }
    }

    /// Advance to the next stage.
    pub fn transition_to(&mut self, next: SettlementStage) -> Result<(), InvalidTransition> {
        if !self.stage.can_transition_to(self.kind, next) {
            return Err(InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        Ok(())
    }

    /// Check whether source and destination currencies are equal.
    pub fn is_same_currency(&self) -> bool {
        self.from_currency == self.to_currency
    }
}

/// Outcome of a completed settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub record: SettlementRecord,
    /// Amount credited in destination currency units.
    pub credited: Amount,
}

impl SettlementReceipt {
    /// Human-readable response payload.
    pub fn message(&self) -> String {
        let r = &self.record;
        match r.kind {
            SettlementKind::Domestic => format!(
                "Domestic settlement of {} {} from {} to {} complete",
                r.amount, r.from_currency, r.from_account, r.to_account
            ),
            SettlementKind::CrossBorder => format!(
                "Cross-border settlement complete: {} {} debited from {} and {} {} credited to {}",
                r.amount,
                r.from_currency,
                r.from_account,
                self.credited,
                r.to_currency,
                r.to_account
            ),
        }
    }
}

/// Error when attempting an invalid stage transition.
#[derive(Debug, Clone)]
pub struct InvalidTransition {
    pub from: SettlementStage,
    pub to: SettlementStage,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid stage transition from {:?} to {:?}",
            self.from, self.to
        )
    }
}

impl std::error::Error for InvalidTransition {}

impl From<InvalidTransition> for LedgerError {
    fn from(e: InvalidTransition) -> Self {
        LedgerError::Internal(e.to_string())
    }
}
