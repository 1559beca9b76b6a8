//! Human-readable messages for the shell's notification sink.
//!
//! Rendering only; delivery is not handled here.

use guild_common::utils::amount::format_amount;
use guild_common::Amount;

use crate::{
    matrix::DebtLine,
    sale::Sale,
    settlement::Adjustment,
    simplify::Simplification,
    suggestion::{Advice, SellerSuggestion},
};

pub const NO_DEBTS: &str = "no debts";

/// One `payer ➔ receiver : $amount` line per debt, or [`NO_DEBTS`].
pub fn format_debt_lines(lines: &[DebtLine]) -> String {
    let rendered: Vec<String> = lines
        .iter()
        .filter(|l| l.amount > 0.0)
        .map(|l| format!("{} ➔ {} : ${}", l.payer, l.receiver, format_amount(l.amount)))
        .collect();
    if rendered.is_empty() {
        NO_DEBTS.to_string()
    } else {
        rendered.join("\n")
    }
}

pub fn adjustment_notice(adj: &Adjustment) -> String {
    format!(
        "📝 [Ledger edit] debt of {} to {}: ${} ➔ ${}",
        adj.payer,
        adj.receiver,
        format_amount(adj.old_amount),
        format_amount(adj.new_amount)
    )
}

pub fn settlement_notice(sale: &Sale, per_person_split: Amount) -> String {
    format!(
        "💰 [Sold] {} sold {}\n💵 Split: {}/person",
        sale.seller,
        sale.item_name,
        format_amount(per_person_split)
    )
}

pub fn balance_report(executor: &str, simplification: &Simplification) -> String {
    format!(
        "⚖️ [Auto-balance report] run by {}\n📋 Before:\n```\n{}\n```\n✨ After:\n```\n{}\n```",
        executor,
        format_debt_lines(&simplification.before),
        format_debt_lines(&simplification.after)
    )
}

/// Ranking strip, e.g. `#1 vina +12 (sell)`; scores in units of 10,000.
pub fn suggestion_strip(suggestions: &[SellerSuggestion]) -> String {
    suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let tens_of_thousands = (s.score / 10_000.0).round();
            let sign = if s.advice == Advice::SellNow { "+" } else { "" };
            let label = match s.advice {
                Advice::SellNow => "sell",
                Advice::Hold => "hold",
            };
            format!("#{} {} {}{} ({})", i + 1, s.member, sign, tens_of_thousands, label)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
