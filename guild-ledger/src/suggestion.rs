//! "Who should sell next": ranks members by projected net position.

use std::collections::{BTreeMap, BTreeSet};

use guild_common::{Amount, MemberId};
use serde::{Deserialize, Serialize};

use crate::{finance::FinanceCalculator, matrix::DebtMatrix, sale::Sale};

/// A not-yet-settled sale as the suggestion sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSplit {
    pub seller: MemberId,
    pub participants: Vec<MemberId>,
    pub per_person_split: Amount,
}

impl PendingSplit {
    pub fn from_sale(sale: &Sale, calculator: &FinanceCalculator) -> Self {
        Self {
            seller: sale.seller.clone(),
            participants: sale.participants.clone(),
            per_person_split: sale.finance(calculator).per_person_split,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advice {
    SellNow,
    Hold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerSuggestion {
    pub member: MemberId,
    pub payable: Amount,
    pub receivable: Amount,
    /// Projected receivable minus projected payable.
    pub score: Amount,
    pub advice: Advice,
}

#[derive(Debug, Default, Clone, Copy)]
struct Projection {
    payable: Amount,
    receivable: Amount,
}

/// Ranks `members` by projected score, highest first.
///
/// Current debts between listed members plus what each pending sale would post
/// if settled now. Sales that would not pay anyone (split ≤ 0) are ignored.
/// Read-only.
pub fn seller_suggestions(
    matrix: &DebtMatrix,
    members: &[MemberId],
    pending: &[PendingSplit],
) -> Vec<SellerSuggestion> {
    let known: BTreeSet<&MemberId> = members.iter().collect();
    let mut projected: BTreeMap<&MemberId, Projection> = members.iter().map(|m| (m, Projection::default())).collect();

    for (payer, receiver, amount) in matrix.iter() {
        if payer == receiver || !known.contains(payer) || !known.contains(receiver) {
            continue;
        }
        if let Some(p) = projected.get_mut(payer) {
            p.payable += amount;
        }
        if let Some(p) = projected.get_mut(receiver) {
            p.receivable += amount;
        }
    }

    for sale in pending {
        if sale.per_person_split <= 0.0 {
            continue;
        }
        for participant in &sale.participants {
            if *participant == sale.seller {
                continue;
            }
            if let Some(p) = projected.get_mut(&sale.seller) {
                p.payable += sale.per_person_split;
            }
            if let Some(p) = projected.get_mut(participant) {
                p.receivable += sale.per_person_split;
            }
        }
    }

    let mut out: Vec<SellerSuggestion> = members
        .iter()
        .map(|m| {
            let p = projected.get(m).copied().unwrap_or_default();
            let score = p.receivable - p.payable;
            SellerSuggestion {
                member: m.clone(),
                payable: p.payable,
                receivable: p.receivable,
                score,
                advice: if score > 0.0 { Advice::SellNow } else { Advice::Hold },
            }
        })
        .collect();

    out.sort_by(|a, b| b.score.total_cmp(&a.score));
    out
}
