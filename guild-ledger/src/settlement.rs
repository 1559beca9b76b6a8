//! Posting settled sales and manual edits to the debt matrix.
//!
//! Both operations are pure: they take a snapshot and return the next one.
//! Wrapping them in a store transaction is the service's job.

use guild_common::{
    config::SettlementMode,
    error::{LedgerError, Result},
    utils::amount::coerce_amount,
    Amount, MemberId,
};
use serde::{Deserialize, Serialize};

use crate::matrix::DebtMatrix;

/// Result of a manual cell overwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub payer: MemberId,
    pub receiver: MemberId,
    pub old_amount: Amount,
    pub new_amount: Amount,
}

impl Adjustment {
    pub fn changed(&self) -> bool {
        self.old_amount != self.new_amount
    }
}

/// Posts a settled sale.
///
/// The seller collected everything, so they owe each other participant
/// `per_person_split`. A negative split (a loss) runs the other way: each
/// participant owes the seller their share of it.
///
/// Not idempotent. Posting the same sale twice doubles the debt; callers must
/// settle each sale exactly once.
pub fn record_settlement(
    matrix: &DebtMatrix,
    seller: &MemberId,
    participants: &[MemberId],
    per_person_split: Amount,
    mode: SettlementMode,
) -> DebtMatrix {
    let mut next = matrix.clone();
    if !per_person_split.is_finite() || per_person_split == 0.0 {
        return next;
    }

    for participant in participants {
        if participant == seller {
            continue;
        }
        let (payer, receiver) = if per_person_split > 0.0 {
            (seller, participant)
        } else {
            (participant, seller)
        };
        post(&mut next, payer, receiver, per_person_split.abs(), mode);
    }
    next
}

fn post(matrix: &mut DebtMatrix, payer: &MemberId, receiver: &MemberId, amount: Amount, mode: SettlementMode) {
    match mode {
        SettlementMode::Accumulate => matrix.add(payer, receiver, amount),
        SettlementMode::Netting => {
            let reverse = matrix.get(receiver, payer);
            let offset = reverse.min(amount);
            if offset > 0.0 {
                matrix.set(receiver, payer, reverse - offset);
            }
            let excess = amount - offset;
            if excess > 0.0 {
                matrix.add(payer, receiver, excess);
            }
        }
    }
}

/// Overwrites `debt[payer][receiver]` with `max(new_amount, 0)`.
///
/// Authorization is checked by the caller before this runs. A member cannot
/// owe themselves, so the diagonal is rejected.
pub fn record_manual_adjustment(
    matrix: &DebtMatrix,
    payer: &MemberId,
    receiver: &MemberId,
    new_amount: Amount,
) -> Result<(DebtMatrix, Adjustment)> {
    if payer == receiver {
        return Err(LedgerError::InvalidInput(format!("{} cannot owe themselves", payer)));
    }
    let mut next = matrix.clone();
    let new_amount = coerce_amount(new_amount);
    let old_amount = next.set(payer, receiver, new_amount);
    Ok((
        next,
        Adjustment {
            payer: payer.clone(),
            receiver: receiver.clone(),
            old_amount,
            new_amount,
        },
    ))
}
