use chrono::NaiveDate;
use guild_common::{utils::time, Amount, MemberId};
use serde::{Deserialize, Serialize};

use crate::{finance::FinanceCalculator, sale::HistoryItem};

/// Narrowing of the settled-sales list. Every bound is optional and inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryFilter {
    pub member: Option<MemberId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl HistoryFilter {
    pub fn for_member(member: MemberId) -> Self {
        Self { member: Some(member), ..Self::default() }
    }

    pub fn matches(&self, item: &HistoryItem) -> bool {
        if let Some(member) = &self.member {
            if !item.sale.has_member(member) {
                return false;
            }
        }
        let day = time::day_of(&item.settled_at);
        if self.start_date.map_or(false, |start| day < start) {
            return false;
        }
        if self.end_date.map_or(false, |end| day > end) {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, items: &'a [HistoryItem]) -> Vec<&'a HistoryItem> {
        items.iter().filter(|i| self.matches(i)).collect()
    }
}

/// What `member` earned across `items`: the recomputed per-person split of
/// each sale they participated in.
pub fn member_earnings<'a, I>(items: I, member: &MemberId, calculator: &FinanceCalculator) -> Amount
where
    I: IntoIterator<Item = &'a HistoryItem>,
{
    items
        .into_iter()
        .filter(|item| item.sale.participants.contains(member))
        .map(|item| item.sale.finance(calculator).per_person_split)
        .sum()
}
