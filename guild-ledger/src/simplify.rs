//! Auto-balance: collapse the pairwise matrix into a short list of transfers
//! that settles the same net positions.

use guild_common::{Amount, MemberId};
use serde::{Deserialize, Serialize};

use crate::matrix::{DebtLine, DebtMatrix};

/// Output of [`simplify_debts`]: the replacement matrix plus the before/after
/// views used for notices and audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simplification {
    pub matrix: DebtMatrix,
    pub before: Vec<DebtLine>,
    pub after: Vec<DebtLine>,
    /// Transfers in the order they were paired.
    pub transfers: Vec<DebtLine>,
}

#[derive(Debug, Clone)]
struct Position {
    member: MemberId,
    remaining: Amount,
}

/// Greedy largest-debtor / largest-creditor pairing.
///
/// Only debts between `members` count; the returned matrix replaces the old
/// one entirely. Positions within `epsilon` of zero are treated as settled.
/// The result has at most `debtors + creditors - 1` edges.
pub fn simplify_debts(matrix: &DebtMatrix, members: &[MemberId], epsilon: Amount) -> Simplification {
    let before = matrix.lines();
    let net = matrix.net_positions(members);

    // 1. Partition
    let mut debtors: Vec<Position> = Vec::new();
    let mut creditors: Vec<Position> = Vec::new();
    for member in members {
        let balance = net.get(member).copied().unwrap_or(0.0);
        if balance < -epsilon {
            debtors.push(Position { member: member.clone(), remaining: -balance });
        } else if balance > epsilon {
            creditors.push(Position { member: member.clone(), remaining: balance });
        }
    }

    // 2. Largest first. Stable sort keeps member order on ties.
    debtors.sort_by(|a, b| b.remaining.total_cmp(&a.remaining));
    creditors.sort_by(|a, b| b.remaining.total_cmp(&a.remaining));

    // 3. Pair
    let mut next = DebtMatrix::new();
    let mut transfers = Vec::new();
    let (mut d, mut c) = (0usize, 0usize);
    while d < debtors.len() && c < creditors.len() {
        let amount = debtors[d].remaining.min(creditors[c].remaining);

        next.add(&debtors[d].member, &creditors[c].member, amount);
        transfers.push(DebtLine {
            payer: debtors[d].member.clone(),
            receiver: creditors[c].member.clone(),
            amount,
        });

        debtors[d].remaining -= amount;
        creditors[c].remaining -= amount;

        if debtors[d].remaining <= epsilon {
            d += 1;
        }
        if creditors[c].remaining <= epsilon {
            c += 1;
        }
    }

    tracing::debug!(
        "⚖️ Simplified {} cells into {} transfers ({} debtors, {} creditors)",
        before.len(),
        transfers.len(),
        debtors.len(),
        creditors.len()
    );

    Simplification {
        after: next.lines(),
        matrix: next,
        before,
        transfers,
    }
}
