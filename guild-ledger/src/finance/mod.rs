//! Sale proceeds: tax, listing fees, the "tail to seller" rounding and the
//! per-participant split.

use guild_common::{
    config::FinanceConfig,
    utils::amount::coerce_amount,
    Amount,
};
use serde::{Deserialize, Serialize};

pub mod cost;

/// Exchange the item is sold on. Selects the tax tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExchangeType {
    #[serde(rename = "GENERAL")]
    General,
    /// Higher-tax world market. Also the fallback for unknown keys.
    #[default]
    #[serde(rename = "WORLD", other)]
    World,
}

impl ExchangeType {
    /// Resolves a stored key; anything unrecognised is treated as `WORLD`.
    pub fn from_key(key: &str) -> Self {
        match key.trim() {
            "GENERAL" => ExchangeType::General,
            _ => ExchangeType::World,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ExchangeType::General => "GENERAL",
            ExchangeType::World => "WORLD",
        }
    }
}

/// Everything the shell shows on a sale card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinanceBreakdown {
    pub tax: Amount,
    pub total_listing_fee: Amount,
    /// Accounting amount after truncation to the rounding unit.
    pub net_income: Amount,
    pub raw_net_income: Amount,
    /// Sub-unit profit kept by the seller, never posted to the ledger.
    pub seller_remainder: Amount,
    pub per_person_split: Amount,
}

#[derive(Debug, Clone, Default)]
pub struct FinanceCalculator {
    config: FinanceConfig,
}

impl FinanceCalculator {
    pub fn new(config: FinanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FinanceConfig {
        &self.config
    }

    pub fn tax_rate(&self, exchange: ExchangeType) -> f64 {
        match exchange {
            ExchangeType::General => self.config.general_tax_rate,
            ExchangeType::World => self.config.world_tax_rate,
        }
    }

    /// Fee for a single listing at `price`, rounded to a whole unit.
    pub fn listing_fee(&self, price: Amount) -> Amount {
        (coerce_amount(price) * self.config.listing_fee_rate).round()
    }

    /// Total listing fee over a history. Sums first, rounds once.
    ///
    /// An empty history stands for a single listing at `price`.
    pub fn total_listing_fee(&self, price: Amount, listing_history: &[Amount]) -> Amount {
        let raw: Amount = if listing_history.is_empty() {
            coerce_amount(price) * self.config.listing_fee_rate
        } else {
            listing_history
                .iter()
                .map(|p| coerce_amount(*p) * self.config.listing_fee_rate)
                .sum()
        };
        raw.round()
    }

    /// Splits `raw_net_income` into the accounting amount and the seller's tail.
    ///
    /// Losses are never truncated.
    pub fn apply_rounding(&self, raw_net_income: Amount) -> (Amount, Amount) {
        if raw_net_income > 0.0 {
            let unit = self.config.rounding_unit;
            let net = (raw_net_income / unit).floor() * unit;
            (net, raw_net_income - net)
        } else {
            (raw_net_income, 0.0)
        }
    }

    /// Floor division of the accounting amount; zero participants yields 0.
    pub fn split(net_income: Amount, participant_count: usize) -> Amount {
        if participant_count > 0 {
            (net_income / participant_count as f64).floor()
        } else {
            0.0
        }
    }

    pub fn compute(
        &self,
        price: Amount,
        exchange: ExchangeType,
        participant_count: usize,
        cost: Amount,
        listing_history: &[Amount],
    ) -> FinanceBreakdown {
        let price = coerce_amount(price);
        let cost = coerce_amount(cost);

        // 1. Tax
        let tax = price * self.tax_rate(exchange);

        // 2. Listing fees over every (re-)listing
        let total_listing_fee = self.total_listing_fee(price, listing_history);

        // 3. Raw net, may be a loss
        let raw_net_income = price - tax - total_listing_fee - cost;

        // 4. Tail to seller
        let (net_income, seller_remainder) = self.apply_rounding(raw_net_income);

        // 5. Split
        let per_person_split = Self::split(net_income, participant_count);

        FinanceBreakdown {
            tax,
            total_listing_fee,
            net_income,
            raw_net_income,
            seller_remainder,
            per_person_split,
        }
    }

    /// Same as [`compute`](Self::compute) but resolves the exchange from its stored key.
    pub fn compute_for_key(
        &self,
        price: Amount,
        exchange_key: &str,
        participant_count: usize,
        cost: Amount,
        listing_history: &[Amount],
    ) -> FinanceBreakdown {
        self.compute(price, ExchangeType::from_key(exchange_key), participant_count, cost, listing_history)
    }
}
