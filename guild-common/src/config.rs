use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{LedgerError, Result},
    identity::{MemberId, Role},
    Amount,
};

/// Rates and rounding used by the finance calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceConfig {
    pub general_tax_rate: f64,
    pub world_tax_rate: f64,
    /// Fee charged on every (re-)listing, as a fraction of the listed price.
    pub listing_fee_rate: f64,
    /// Accounting net income is truncated down to a multiple of this.
    pub rounding_unit: Amount,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            general_tax_rate: 0.10,
            world_tax_rate: 0.20,
            listing_fee_rate: 0.02,
            rounding_unit: 10_000.0,
        }
    }
}

/// How a settled sale is posted to the debt matrix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMode {
    /// Offset any reverse debt first, post only the excess as new debt.
    #[default]
    Netting,
    /// Always add the share to `seller -> participant`.
    Accumulate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub finance: FinanceConfig,
    /// Net positions within this tolerance count as settled during auto-balance.
    pub balance_epsilon: Amount,
    /// Member allowed to edit any cell; cannot be removed from the directory.
    pub super_admin: MemberId,
    pub settlement_mode: SettlementMode,
    pub default_role: Role,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            finance: FinanceConfig::default(),
            balance_epsilon: 1.0,
            super_admin: MemberId::from("Wolf"),
            settlement_mode: SettlementMode::default(),
            default_role: Role::Member,
        }
    }
}

impl LedgerConfig {
    /// Rejects values that would make the calculator or the balancer misbehave.
    pub fn validate(&self) -> Result<()> {
        let f = &self.finance;
        for (name, rate) in [
            ("general_tax_rate", f.general_tax_rate),
            ("world_tax_rate", f.world_tax_rate),
            ("listing_fee_rate", f.listing_fee_rate),
        ] {
            if !rate.is_finite() || !(0.0..1.0).contains(&rate) {
                return Err(LedgerError::Config(format!("{} must be in [0, 1), got {}", name, rate)));
            }
        }
        if !f.rounding_unit.is_finite() || f.rounding_unit < 1.0 {
            return Err(LedgerError::Config(format!("rounding_unit must be >= 1, got {}", f.rounding_unit)));
        }
        if !self.balance_epsilon.is_finite() || self.balance_epsilon < 0.0 {
            return Err(LedgerError::Config(format!("balance_epsilon must be >= 0, got {}", self.balance_epsilon)));
        }
        if let Err(e) = self.super_admin.validate() {
            return Err(LedgerError::Config(format!("super_admin: {}", e)));
        }
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let parsed = serde_json::from_str::<LedgerConfig>(&data)?;
        parsed.validate()?;
        Ok(parsed)
    }
}
