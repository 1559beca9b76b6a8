//! Active sales and their settled history records.

use chrono::{DateTime, Utc};
use guild_common::{
    error::{LedgerError, Result},
    utils::{amount::coerce_amount, time},
    Amount, MemberId,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::finance::{ExchangeType, FinanceBreakdown, FinanceCalculator};

/// Form data for listing a new item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub item_name: String,
    pub seller: MemberId,
    pub price: Amount,
    #[serde(default)]
    pub cost: Amount,
    #[serde(default)]
    pub exchange_type: ExchangeType,
    /// Empty means "everyone in the guild".
    #[serde(default)]
    pub participants: Vec<MemberId>,
}

/// An item currently listed on an exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub item_name: String,
    pub seller: MemberId,
    pub price: Amount,
    #[serde(default)]
    pub cost: Amount,
    #[serde(default)]
    pub exchange_type: ExchangeType,
    /// Every price the item was listed at, oldest first.
    #[serde(default)]
    pub listing_history: Vec<Amount>,
    /// Includes the seller.
    pub participants: Vec<MemberId>,
    pub created_at: DateTime<Utc>,
    pub created_by: MemberId,
}

impl Sale {
    /// Validates the form and builds the sale.
    ///
    /// Participants are deduplicated in order and the seller is always added.
    pub fn create(new: NewSale, all_members: &[MemberId], created_by: MemberId) -> Result<Self> {
        let item_name = new.item_name.trim().to_string();
        if item_name.is_empty() {
            return Err(LedgerError::InvalidInput("item name is required".to_string()));
        }
        let price = coerce_amount(new.price);
        if price <= 0.0 {
            return Err(LedgerError::InvalidInput("price is required".to_string()));
        }
        if new.seller.as_str().is_empty() {
            return Err(LedgerError::InvalidInput("seller is required".to_string()));
        }

        let source = if new.participants.is_empty() { all_members } else { &new.participants[..] };
        let mut participants: Vec<MemberId> = Vec::with_capacity(source.len() + 1);
        for m in source.iter().chain(std::iter::once(&new.seller)) {
            if !participants.contains(m) {
                participants.push(m.clone());
            }
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            item_name,
            seller: new.seller,
            price,
            cost: coerce_amount(new.cost),
            exchange_type: new.exchange_type,
            listing_history: vec![price],
            participants,
            created_at: time::now(),
            created_by,
        })
    }

    /// Commits a price edit. A changed price counts as a new listing.
    ///
    /// Returns whether a listing was appended.
    pub fn reprice(&mut self, new_price: Amount) -> bool {
        let new_price = coerce_amount(new_price);
        if new_price == self.price {
            return false;
        }
        self.price = new_price;
        self.listing_history.push(new_price);
        true
    }

    /// Drops one listing entry, e.g. one entered by mistake.
    pub fn remove_listing(&mut self, index: usize) -> bool {
        if index < self.listing_history.len() {
            self.listing_history.remove(index);
            true
        } else {
            false
        }
    }

    pub fn set_cost(&mut self, cost: Amount) {
        self.cost = coerce_amount(cost);
    }

    pub fn finance(&self, calculator: &FinanceCalculator) -> FinanceBreakdown {
        calculator.compute(
            self.price,
            self.exchange_type,
            self.participants.len(),
            self.cost,
            &self.listing_history,
        )
    }

    pub fn has_member(&self, member: &MemberId) -> bool {
        self.seller == *member || self.participants.contains(member)
    }

    pub fn settle(self, settled_by: MemberId, final_split: Amount) -> HistoryItem {
        HistoryItem {
            sale: self,
            settled_at: time::now(),
            settled_by,
            final_split,
        }
    }
}

/// A settled sale. Immutable apart from deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    #[serde(flatten)]
    pub sale: Sale,
    pub settled_at: DateTime<Utc>,
    pub settled_by: MemberId,
    pub final_split: Amount,
}

impl HistoryItem {
    pub fn id(&self) -> &str {
        &self.sale.id
    }
}
