//! Typed view over the merged config document.
//!
//! Every section is optional in YAML; absent keys take the defaults below.

use anyhow::{bail, Context, Result};
use ap2_schemas::{amount_to_micros, RiskScore, ShopperProfile};
use serde::{Deserialize, Serialize};

use crate::LoadedConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub shopper: ShopperProfile,
    pub merchant: MerchantSection,
    pub catalog: CatalogSection,
    pub payment: PaymentSection,
    pub risk: RiskSection,
    pub registry: RegistrySection,
    pub audit: AuditSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchantSection {
    pub id: String,
}

impl Default for MerchantSection {
    fn default() -> Self {
        Self {
            id: "merchant:amazon-uae".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    pub path: String,
    pub shortlist_size: usize,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            path: "data/products.json".to_string(),
            shortlist_size: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentSection {
    pub rail: String,
}

impl Default for PaymentSection {
    fn default() -> Self {
        Self {
            rail: "Aani".to_string(),
        }
    }
}

/// Amount bands (in currency units) and the score at which payment is blocked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSection {
    pub medium_at: f64,
    pub high_at: f64,
    pub block_at: RiskScore,
}

impl Default for RiskSection {
    fn default() -> Self {
        Self {
            medium_at: 1_000.0,
            high_at: 5_000.0,
            block_at: RiskScore::High,
        }
    }
}

impl RiskSection {
    pub fn medium_at_micros(&self) -> Result<i64> {
        amount_to_micros(self.medium_at).context("risk.medium_at")
    }

    pub fn high_at_micros(&self) -> Result<i64> {
        amount_to_micros(self.high_at).context("risk.high_at")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    /// Total registration attempts (first try included) on unreachable registry.
    pub attempts: u32,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self { attempts: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSection {
    pub hash_chain: bool,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self { hash_chain: true }
    }
}

impl DemoConfig {
    pub fn from_loaded(loaded: &LoadedConfig) -> Result<Self> {
        let cfg: DemoConfig = serde_json::from_value(loaded.config_json.clone())
            .context("config does not match the demo schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the flow cannot run with. Messages name the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.shopper.name.trim().is_empty() {
            bail!("CONFIG_INVALID shopper.name must not be empty");
        }
        if self.merchant.id.trim().is_empty() {
            bail!("CONFIG_INVALID merchant.id must not be empty");
        }
        if self.catalog.shortlist_size == 0 {
            bail!("CONFIG_INVALID catalog.shortlist_size must be >= 1");
        }
        if self.payment.rail.trim().is_empty() {
            bail!("CONFIG_INVALID payment.rail must not be empty");
        }
        if self.registry.attempts == 0 {
            bail!("CONFIG_INVALID registry.attempts must be >= 1");
        }
        let medium = self.risk.medium_at_micros()?;
        let high = self.risk.high_at_micros()?;
        if medium < 0 || high < 0 {
            bail!("CONFIG_INVALID risk bands must be non-negative");
        }
        if medium > high {
            bail!(
                "CONFIG_INVALID risk.medium_at ({}) must not exceed risk.high_at ({})",
                self.risk.medium_at,
                self.risk.high_at
            );
        }
        Ok(())
    }
}
