use guild_common::{utils::amount::coerce_amount, Amount};
use serde::{Deserialize, Serialize};

use super::{ExchangeType, FinanceCalculator};

/// One line of a crafting bill of materials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub quantity: f64,
    pub unit_price: Amount,
}

impl Material {
    pub fn new(name: impl Into<String>, quantity: f64, unit_price: Amount) -> Self {
        Self { name: name.into(), quantity, unit_price }
    }

    pub fn subtotal(&self) -> Amount {
        coerce_amount(self.quantity) * coerce_amount(self.unit_price)
    }
}

/// Listing price that recovers the production cost plus a target margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSuggestion {
    /// Price to list at, rounded up to a whole unit.
    pub price: Amount,
    pub tax: Amount,
    pub fee: Amount,
    pub profit_amount: Amount,
    /// What the exchange pays back after tax and fee (cost included).
    pub net_income: Amount,
}

pub fn total_cost(materials: &[Material]) -> Amount {
    materials.iter().map(Material::subtotal).sum()
}

impl FinanceCalculator {
    /// Solves `price * (1 - tax - fee) = cost * (1 + profit%)` for `price`.
    ///
    /// Returns `None` when there is nothing to price or the rates leave no margin.
    pub fn suggest_price(
        &self,
        total_cost: Amount,
        profit_percent: f64,
        exchange: ExchangeType,
    ) -> Option<PriceSuggestion> {
        let total_cost = coerce_amount(total_cost);
        if total_cost <= 0.0 {
            return None;
        }

        let rate = if profit_percent.is_finite() { profit_percent } else { 0.0 };
        let tax_rate = self.tax_rate(exchange);
        let fee_rate = self.config().listing_fee_rate;

        let divisor = 1.0 - tax_rate - fee_rate;
        if divisor <= 0.0 {
            return None;
        }

        let profit_amount = total_cost * (rate / 100.0);
        let net_income = total_cost + profit_amount;
        let raw_price = net_income / divisor;

        Some(PriceSuggestion {
            price: raw_price.ceil(),
            tax: (raw_price * tax_rate).round(),
            fee: (raw_price * fee_rate).round(),
            profit_amount,
            net_income,
        })
    }
}
