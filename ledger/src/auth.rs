//! Authorization gate for central-bank-only operations.
//!
//! The host identity layer asserts the caller identity as a JSON document
//! carrying the issuing MSP and certificate attributes. Anything that cannot
//! be parsed or does not carry the expected attribute is denied.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use tokensettle_common::{LedgerError, Result};

use crate::store::IdentitySource;

/// Predicate over the caller identity.
pub trait AuthorizationGate {
    /// Whether the identity belongs to the central bank.
    fn is_central_bank(&self, identity: &[u8]) -> bool;
}

/// Caller identity as asserted by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    /// Membership service provider that issued the certificate.
    pub msp_id: String,
    /// Certificate subject.
    #[serde(default)]
    pub subject: String,
    /// Certificate attributes.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl CallerIdentity {
    pub fn new(msp_id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            msp_id: msp_id.into(),
            subject: subject.into(),
            attributes: HashMap::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Parse serialized identity bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| LedgerError::Unauthorized(format!("Unreadable caller identity: {}", e)))
    }

    /// Serialize for presentation to the ledger.
    pub fn to_bytes(&self) -> Vec<u8> {
        // A struct of strings always serializes.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Grants the central-bank role to identities carrying a configured
/// attribute value, optionally restricted to one MSP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    pub role_attribute: String,
    pub central_bank_role: String,
    pub central_bank_msp: Option<String>,
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self {
            role_attribute: "role".to_string(),
            central_bank_role: "centralbank".to_string(),
            central_bank_msp: None,
        }
    }
}

impl RolePolicy {
    pub fn new(
        role_attribute: impl Into<String>,
        central_bank_role: impl Into<String>,
        central_bank_msp: Option<String>,
    ) -> Self {
        Self {
            role_attribute: role_attribute.into(),
            central_bank_role: central_bank_role.into(),
            central_bank_msp,
        }
    }
}

impl AuthorizationGate for RolePolicy {
    fn is_central_bank(&self, identity: &[u8]) -> bool {
        let identity = match CallerIdentity::parse(identity) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "Caller identity rejected");
                return false;
            }
        };

        if let Some(msp) = &self.central_bank_msp {
            if &identity.msp_id != msp {
                return false;
            }
        }

        identity.attribute(&self.role_attribute) == Some(self.central_bank_role.as_str())
    }
}

/// Fail with `Unauthorized` unless the caller passes the gate.
pub fn require_central_bank<G, I>(gate: &G, ctx: &I, operation: &str) -> Result<()>
where
    G: AuthorizationGate + ?Sized,
    I: IdentitySource + ?Sized,
{
    let identity = ctx.caller_identity().map_err(|e| {
        warn!(operation = operation, error = %e, "Failed to get caller identity");
        LedgerError::Unauthorized("Failed to get caller identity".to_string())
    })?;

    if !gate.is_central_bank(&identity) {
        warn!(operation = operation, "Caller is not central bank");
        return Err(LedgerError::Unauthorized(format!(
            "Only central bank identities can {}",
            operation
        )));
    }
    Ok(())
}
