// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Serialize;

use super::fx::convert;
use crate::models::{Expense, Member, MemberId, RateTable, Split};

/// Net position of one member in the trip's base currency.
/// Positive means the group owes them money.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Balance {
    pub member_id: MemberId,
    pub member_name: String,
    pub total_paid: Decimal,
    pub total_owed: Decimal,
    pub balance: Decimal,
}

/// One balance per member, in the order of `members`.
///
/// Participants that are no longer members are dropped before an expense is
/// divided, and their share is not handed to anyone else. An expense left
/// without valid participants is paid but never allocated. Sums saturate at
/// the `Decimal` bounds instead of panicking.
pub fn calculate_balances(
    members: &[Member],
    expenses: &[Expense],
    base_currency: &str,
    custom_rates: Option<&RateTable>,
) -> Vec<Balance> {
    let member_ids: HashSet<MemberId> = members.iter().map(|m| m.id).collect();
    members
        .iter()
        .map(|m| member_balance(m, expenses, base_currency, custom_rates, &member_ids))
        .collect()
}

fn member_balance(
    member: &Member,
    expenses: &[Expense],
    base_currency: &str,
    custom_rates: Option<&RateTable>,
    member_ids: &HashSet<MemberId>,
) -> Balance {
    let mut total_paid = Decimal::ZERO;
    let mut total_owed = Decimal::ZERO;

    for expense in expenses {
        let amount_in_base = convert(expense.amount, &expense.currency, base_currency, custom_rates);
        if expense.payer_id == member.id {
            total_paid = total_paid.saturating_add(amount_in_base);
        }

        let valid: Vec<MemberId> = expense
            .participants
            .iter()
            .copied()
            .filter(|id| member_ids.contains(id))
            .collect();
        if valid.is_empty() || !valid.contains(&member.id) {
            continue;
        }

        match &expense.split {
            Split::Equal => {
                // valid is non-empty here
                let share = amount_in_base
                    .checked_div(Decimal::from(valid.len()))
                    .unwrap_or(amount_in_base);
                total_owed = total_owed.saturating_add(share);
            }
            Split::Custom(shares) => match shares.get(&member.id) {
                Some(share) => {
                    let share = convert(*share, &expense.currency, base_currency, custom_rates);
                    total_owed = total_owed.saturating_add(share);
                }
                None => {
                    tracing::debug!(
                        expense = expense.id,
                        member = member.id,
                        "no custom share for participant, counting zero"
                    );
                }
            },
        }
    }

    Balance {
        member_id: member.id,
        member_name: member.name.clone(),
        total_paid,
        total_owed,
        balance: total_paid.saturating_sub(total_owed),
    }
}
