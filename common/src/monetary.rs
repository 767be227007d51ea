//! Integer monetary types.
//!
//! Amounts are whole numbers of a currency's smallest unit. All arithmetic is
//! checked; nothing here wraps, rounds or touches floating point.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{LedgerError, Result};

/// A non-negative amount in a currency's smallest unit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Create an amount from raw units.
    pub const fn new(units: u64) -> Self {
        Self(units)
    }

    /// Parse a caller-supplied decimal string.
    pub fn parse(field: &str, value: &str) -> Result<Self> {
        value.parse::<u64>().map(Self).map_err(|_| {
            LedgerError::invalid_field(field, format!("{} must be a non-negative integer", field))
        })
    }

    /// Decode a value read from the ledger store.
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self> {
        std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Self)
            .ok_or_else(|| LedgerError::StoreFailure(format!("Corrupt balance record at {}", key)))
    }

    /// Encode for the ledger store as decimal ASCII.
    pub fn encode(&self) -> Vec<u8> {
        self.0.to_string().into_bytes()
    }

    /// Get the raw units.
    pub fn units(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Add, rejecting overflow.
    pub fn checked_add(self, other: Amount) -> Result<Amount> {
        self.0
            .checked_add(other.0)
            .map(Amount)
            .ok_or_else(|| LedgerError::invalid_field("amount", "Balance would overflow"))
    }

    /// Subtract, failing with insufficient funds when `other` exceeds `self`.
    pub fn checked_sub(self, other: Amount) -> Result<Amount> {
        self.0
            .checked_sub(other.0)
            .map(Amount)
            .ok_or(LedgerError::InsufficientFunds {
                required: other.0,
                available: self.0,
            })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Amount {
    fn from(units: u64) -> Self {
        Self(units)
    }
}

impl FromStr for Amount {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse("amount", s)
    }
}

/// Integer fixed-point exchange rate.
///
/// The scale is a convention between caller and ledger and is never stored.
/// A converted amount is exactly `amount * rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRate(u64);

impl ExchangeRate {
    /// Identity rate.
    pub const ONE: ExchangeRate = ExchangeRate(1);

    /// Create a rate, rejecting zero.
    pub fn new(factor: u64) -> Result<Self> {
        if factor == 0 {
            return Err(LedgerError::invalid_field(
                "exchangeRate",
                "Exchange rate must be positive",
            ));
        }
        Ok(Self(factor))
    }

    /// Parse a caller-supplied decimal string.
    pub fn parse(value: &str) -> Result<Self> {
        let factor = value.parse::<u64>().map_err(|_| {
            LedgerError::invalid_field("exchangeRate", "Exchange rate must be an integer")
        })?;
        Self::new(factor)
    }

    pub fn factor(&self) -> u64 {
        self.0
    }

    /// Convert a source amount into the destination currency.
    pub fn convert(&self, amount: Amount) -> Result<Amount> {
        amount
            .units()
            .checked_mul(self.0)
            .map(Amount::new)
            .ok_or_else(|| {
                LedgerError::invalid_field("exchangeRate", "Converted amount would overflow")
            })
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
