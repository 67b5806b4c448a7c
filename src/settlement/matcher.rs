// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;

use super::EPSILON;
use super::balances::Balance;
use crate::models::MemberId;

/// A suggested payment from a debtor to a creditor, in the base currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementTransaction {
    pub from_id: MemberId,
    pub from_name: String,
    pub to_id: MemberId,
    pub to_name: String,
    pub amount: Decimal,
}

struct Party<'a> {
    id: MemberId,
    name: &'a str,
    amount: Decimal,
}

/// Turn net balances into transfers with the largest-first greedy heuristic.
///
/// Debtors and creditors are each sorted by outstanding amount, descending, and
/// walked with two pointers; every step moves `min(debt, credit)`. This yields
/// at most `debtors + creditors - 1` transfers and is usually, though not
/// always, the fewest possible. Balances within [`EPSILON`] of zero are skipped.
pub fn minimize_transactions(balances: &[Balance]) -> Vec<SettlementTransaction> {
    let mut debtors = Vec::new();
    let mut creditors = Vec::new();
    for b in balances {
        if b.balance < -EPSILON {
            debtors.push(Party {
                id: b.member_id,
                name: &b.member_name,
                amount: -b.balance,
            });
        } else if b.balance > EPSILON {
            creditors.push(Party {
                id: b.member_id,
                name: &b.member_name,
                amount: b.balance,
            });
        }
    }

    // Stable sorts: equal amounts keep input order.
    debtors.sort_by(|a, b| b.amount.cmp(&a.amount));
    creditors.sort_by(|a, b| b.amount.cmp(&a.amount));

    let mut transactions = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < debtors.len() && j < creditors.len() {
        let debtor = &mut debtors[i];
        let creditor = &mut creditors[j];
        let amount = debtor.amount.min(creditor.amount);

        if amount > EPSILON {
            tracing::debug!(from = debtor.id, to = creditor.id, %amount, "settle");
            transactions.push(SettlementTransaction {
                from_id: debtor.id,
                from_name: debtor.name.to_string(),
                to_id: creditor.id,
                to_name: creditor.name.to_string(),
                amount,
            });
        }

        debtor.amount -= amount;
        creditor.amount -= amount;
        if debtor.amount < EPSILON {
            i += 1;
        }
        if creditor.amount < EPSILON {
            j += 1;
        }
    }
    transactions
}
