//! Engine configuration, loadable from JSON.

use accord_types::SigningDomain;
use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        COORDINATOR_DOMAIN_NAME, DEFAULT_BUDGET_WINDOW_SECS, DEFAULT_TIMELOCK_DELAY_SECS,
        DOMAIN_VERSION, EXECUTOR_DOMAIN_NAME,
    },
    errors::{AccordError, Result},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinatorConfig {
    pub domain: SigningDomain,
}

impl CoordinatorConfig {
    /// Default coordinator domain for `verifying_contract` on `chain_id`.
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            domain: SigningDomain::new(
                COORDINATOR_DOMAIN_NAME,
                DOMAIN_VERSION,
                chain_id,
                verifying_contract,
            ),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| AccordError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_domain(&self.domain)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorConfig {
    pub domain: SigningDomain,
    pub admin: Address,
    pub guardian: Address,
    #[serde(default)]
    pub initial_policy_root: B256,
    #[serde(default = "default_timelock_delay")]
    pub timelock_delay_secs: u64,
    #[serde(default = "default_budget_window")]
    pub budget_window_secs: u64,
}

fn default_timelock_delay() -> u64 {
    DEFAULT_TIMELOCK_DELAY_SECS
}

fn default_budget_window() -> u64 {
    DEFAULT_BUDGET_WINDOW_SECS
}

impl ExecutorConfig {
    pub fn new(
        chain_id: u64,
        verifying_contract: Address,
        admin: Address,
        guardian: Address,
        initial_policy_root: B256,
    ) -> Self {
        Self {
            domain: SigningDomain::new(
                EXECUTOR_DOMAIN_NAME,
                DOMAIN_VERSION,
                chain_id,
                verifying_contract,
            ),
            admin,
            guardian,
            initial_policy_root,
            timelock_delay_secs: DEFAULT_TIMELOCK_DELAY_SECS,
            budget_window_secs: DEFAULT_BUDGET_WINDOW_SECS,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| AccordError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_domain(&self.domain)?;
        if self.admin == Address::ZERO {
            return Err(AccordError::InvalidConfig("admin must be set".into()));
        }
        if self.guardian == Address::ZERO {
            return Err(AccordError::InvalidConfig("guardian must be set".into()));
        }
        if self.timelock_delay_secs == 0 {
            return Err(AccordError::InvalidConfig(
                "timelock delay must be non-zero".into(),
            ));
        }
        if self.budget_window_secs == 0 {
            return Err(AccordError::InvalidConfig(
                "budget window must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn validate_domain(domain: &SigningDomain) -> Result<()> {
    if domain.name().is_empty() || domain.version().is_empty() {
        return Err(AccordError::InvalidConfig(
            "domain name and version must be non-empty".into(),
        ));
    }
    if domain.verifying_contract() == Address::ZERO {
        return Err(AccordError::InvalidConfig(
            "verifying contract must be set".into(),
        ));
    }
    Ok(())
}
