//! Identifier types for ledger entities.
//!
//! Every identifier is validated on construction so it can be embedded in a
//! ledger key without ambiguity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{LedgerError, Result};

/// Separator between the components of a ledger key.
pub const KEY_SEPARATOR: char = ':';

/// Maximum length of a currency code in bytes.
pub const MAX_CURRENCY_LEN: usize = 16;

/// Maximum length of an account or organization identifier in bytes.
pub const MAX_ID_LEN: usize = 256;

fn validate(field: &str, value: &str, max_len: usize) -> Result<()> {
    if value.is_empty() {
        return Err(LedgerError::invalid_field(
            field,
            format!("{} must not be empty", field),
        ));
    }
    if value.len() > max_len {
        return Err(LedgerError::invalid_field(
            field,
            format!("{} exceeds {} bytes", field, max_len),
        ));
    }
    if value.contains(KEY_SEPARATOR) {
        return Err(LedgerError::invalid_field(
            field,
            format!("{} must not contain '{}'", field, KEY_SEPARATOR),
        ));
    }
    Ok(())
}

/// Currency code, e.g. "RWF" or "KES".
///
/// Case is preserved: the code is used verbatim in ledger keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Parse and validate a currency code.
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        validate("currency", &code, MAX_CURRENCY_LEN)?;
        Ok(Self(code))
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = LedgerError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.0
    }
}

/// Opaque account reference as defined by the platform identity layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Parse and validate an account identifier.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate("account", &id, MAX_ID_LEN)?;
        Ok(Self(id))
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for AccountId {
    type Error = LedgerError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<AccountId> for String {
    fn from(a: AccountId) -> Self {
        a.0
    }
}

/// Identifier of a registered organization (bank or operator).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrgId(String);

impl OrgId {
    /// Parse and validate an organization identifier.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        validate("orgID", &id, MAX_ID_LEN)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for OrgId {
    type Error = LedgerError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<OrgId> for String {
    fn from(o: OrgId) -> Self {
        o.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_preserves_case() {
        let currency = Currency::new("RWF").unwrap();
        assert_eq!(currency.code(), "RWF");
        assert_ne!(Currency::new("rwf").unwrap(), currency);
    }

    #[test]
    fn test_separator_rejected() {
        assert!(Currency::new("RW:F").is_err());
        assert!(AccountId::new("bank:1").is_err());
        assert!(OrgId::new("org:1").is_err());
    }

    #[test]
    fn test_empty_and_oversized_rejected() {
        assert!(Currency::new("").is_err());
        assert!(AccountId::new("").is_err());
        assert!(Currency::new("X".repeat(MAX_CURRENCY_LEN + 1)).is_err());
        assert!(AccountId::new("a".repeat(MAX_ID_LEN)).is_ok());
        assert!(AccountId::new("a".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_error_names_field() {
        match AccountId::new("a:b") {
            Err(LedgerError::InvalidArgument { field, .. }) => {
                assert_eq!(field.as_deref(), Some("account"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_serde_validates() {
        let ok: Currency = serde_json::from_str("\"KES\"").unwrap();
        assert_eq!(ok.code(), "KES");
        assert!(serde_json::from_str::<AccountId>("\"a:b\"").is_err());
    }
}
