//! Participant organization registry.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use tokensettle_common::{LedgerError, OrgId, Result};
use tokensettle_ledger::{org_key, LedgerStore};

/// Organization record stored under `org:<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgRecord {
    #[serde(rename = "orgID")]
    pub org_id: OrgId,
    #[serde(rename = "orgName")]
    pub org_name: String,
}

/// Keyed store of participant organizations. Re-registering overwrites.
#[derive(Debug, Clone, Copy, Default)]
pub struct Registry;

impl Registry {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip_all, fields(org_id = %org_id))]
    pub fn register_org<C>(&self, ctx: &mut C, org_id: &OrgId, org_name: &str) -> Result<String>
    where
        C: LedgerStore + ?Sized,
    {
        if org_name.trim().is_empty() {
            return Err(LedgerError::invalid_field(
                "orgName",
                "Organization name cannot be empty",
            ));
        }

        let record = OrgRecord {
            org_id: org_id.clone(),
            org_name: org_name.to_string(),
        };
        let bytes = serde_json::to_vec(&record)
            .map_err(|e| LedgerError::StoreFailure(format!("Failed to marshal org info: {}", e)))?;
        ctx.put_state(&org_key(org_id), bytes)?;

        info!(org_name = %org_name, "Organization registered");
        Ok(format!("Organization {} registered", org_name))
    }

    pub fn query_org<C>(&self, ctx: &mut C, org_id: &OrgId) -> Result<OrgRecord>
    where
        C: LedgerStore + ?Sized,
    {
        let key = org_key(org_id);
        let bytes = ctx
            .get_state(&key)?
            .ok_or_else(|| LedgerError::NotFound(format!("Organization {} not found", org_id)))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| LedgerError::StoreFailure(format!("Corrupt record at {}: {}", key, e)))
    }
}
