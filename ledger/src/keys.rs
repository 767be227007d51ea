//! Ledger key scheme.
//!
//! Keys are `<namespace>:<field>:<field>`. Identifier types reject the
//! separator on construction, so composition is injective.

use tokensettle_common::{AccountId, Currency, OrgId, KEY_SEPARATOR};

/// Namespace for account balance records.
pub const BALANCE_NAMESPACE: &str = "balance";

/// Namespace for organization records.
pub const ORG_NAMESPACE: &str = "org";

/// Key of the balance record for an account in a currency.
pub fn balance_key(currency: &Currency, account: &AccountId) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        BALANCE_NAMESPACE,
        currency,
        account,
        sep = KEY_SEPARATOR
    )
}

/// Key of an organization record.
pub fn org_key(org_id: &OrgId) -> String {
    format!("{}{}{}", ORG_NAMESPACE, KEY_SEPARATOR, org_id)
}

/// Split a balance key back into its currency and account.
pub fn parse_balance_key(key: &str) -> Option<(Currency, AccountId)> {
    let mut parts = key.splitn(3, KEY_SEPARATOR);
    if parts.next()? != BALANCE_NAMESPACE {
        return None;
    }
    let currency = Currency::new(parts.next()?).ok()?;
    let account = AccountId::new(parts.next()?).ok()?;
    Some((currency, account))
}
