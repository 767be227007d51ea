//! Node configuration.

use tokensettle_ledger::{CallerIdentity, RolePolicy};

/// Authorization gate configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Certificate attribute carrying the caller's role.
    pub role_attribute: String,
    /// Attribute value that marks a central bank identity.
    pub central_bank_role: String,
    /// Restrict the central bank role to one MSP.
    pub central_bank_msp: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let policy = RolePolicy::default();
        Self {
            role_attribute: policy.role_attribute,
            central_bank_role: policy.central_bank_role,
            central_bank_msp: policy.central_bank_msp,
        }
    }
}

impl AuthConfig {
    /// Build the gate this configuration describes.
    pub fn policy(&self) -> RolePolicy {
        RolePolicy::new(
            self.role_attribute.clone(),
            self.central_bank_role.clone(),
            self.central_bank_msp.clone(),
        )
    }
}

/// Main node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Authorization configuration.
    pub auth: AuthConfig,
    /// Caller identity JSON presented with every invocation.
    pub caller_identity: String,
    /// Log level.
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones.
    pub log_json: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            auth: AuthConfig::default(),
            caller_identity: r#"{"mspId":"Org1MSP","subject":"client"}"#.to_string(),
            log_level: "info".to_string(),
            log_json: true,
        }
    }
}

impl NodeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(attribute) = lookup("TOKENSETTLE_ROLE_ATTRIBUTE") {
            config.auth.role_attribute = attribute;
        }

        if let Some(role) = lookup("TOKENSETTLE_CENTRAL_BANK_ROLE") {
            config.auth.central_bank_role = role;
        }

        if let Some(msp) = lookup("TOKENSETTLE_CENTRAL_BANK_MSP") {
            config.auth.central_bank_msp = Some(msp).filter(|m| !m.is_empty());
        }

        if let Some(identity) = lookup("TOKENSETTLE_CALLER_IDENTITY") {
            config.caller_identity = identity;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        if let Some(json) = lookup("TOKENSETTLE_LOG_JSON") {
            if let Ok(json) = json.parse() {
                config.log_json = json;
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.auth.role_attribute.is_empty() {
            return Err("Role attribute cannot be empty".to_string());
        }

        if self.auth.central_bank_role.is_empty() {
            return Err("Central bank role cannot be empty".to_string());
        }

        if self.log_level.is_empty() {
            return Err("Log level cannot be empty".to_string());
        }

        CallerIdentity::parse(self.caller_identity.as_bytes())
            .map_err(|e| format!("Invalid caller identity: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokensettle_ledger::AuthorizationGate;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.policy(), RolePolicy::default());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = NodeConfig::default();
        config.auth.role_attribute = String::new();
        assert!(config.validate().is_err());

        let mut config = NodeConfig::default();
        config.caller_identity = "not json".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = NodeConfig::from_lookup(lookup(&[
            ("TOKENSETTLE_ROLE_ATTRIBUTE", "hf.Affiliation"),
            ("TOKENSETTLE_CENTRAL_BANK_ROLE", "bnr"),
            ("TOKENSETTLE_CENTRAL_BANK_MSP", "BNRMSP"),
            ("LOG_LEVEL", "debug"),
            ("TOKENSETTLE_LOG_JSON", "false"),
        ]));
        assert_eq!(config.auth.role_attribute, "hf.Affiliation");
        assert_eq!(config.auth.central_bank_msp.as_deref(), Some("BNRMSP"));
        assert_eq!(config.log_level, "debug");
        assert!(!config.log_json);

        let governor = CallerIdentity::new("BNRMSP", "cn=governor")
            .with_attribute("hf.Affiliation", "bnr")
            .to_bytes();
        assert!(config.auth.policy().is_central_bank(&governor));
    }

    #[test]
    fn test_unparseable_flag_keeps_default() {
        let config = NodeConfig::from_lookup(lookup(&[
            ("TOKENSETTLE_LOG_JSON", "maybe"),
            ("TOKENSETTLE_CENTRAL_BANK_MSP", ""),
        ]));
        assert!(config.log_json);
        assert!(config.auth.central_bank_msp.is_none());
    }
}
