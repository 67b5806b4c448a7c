// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::EPSILON;
use super::balances::Balance;
use super::matcher::SettlementTransaction;
use crate::utils::fmt_amount;

/// Plain-text settlement report, suitable for pasting into a chat.
pub fn render_summary(
    trip_name: &str,
    currency: &str,
    balances: &[Balance],
    transactions: &[SettlementTransaction],
) -> String {
    let mut lines = vec![format!("[{}] settlement", trip_name), String::new()];

    lines.push("Balances:".to_string());
    for b in balances {
        let line = if b.balance > EPSILON {
            format!("  {}: receives {} {}", b.member_name, currency, fmt_amount(&b.balance))
        } else if b.balance < -EPSILON {
            format!("  {}: pays {} {}", b.member_name, currency, fmt_amount(&-b.balance))
        } else {
            format!("  {}: settled ({} {})", b.member_name, currency, fmt_amount(&b.balance.abs()))
        };
        lines.push(line);
    }

    lines.push(String::new());
    lines.push("Suggested transfers:".to_string());
    if transactions.is_empty() {
        lines.push("  All settled, nothing to transfer.".to_string());
    }
    for t in transactions {
        lines.push(format!(
            "  {} -> {}: {} {}",
            t.from_name,
            t.to_name,
            currency,
            fmt_amount(&t.amount)
        ));
    }

    lines.join("\n")
}
