// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Category, Expense};

// These read the stored base amount, which is refreshed whenever rates change.
// Sums saturate rather than panic.

pub fn total_expenses(expenses: &[Expense]) -> Decimal {
    expenses
        .iter()
        .fold(Decimal::ZERO, |acc, e| acc.saturating_add(e.amount_in_base))
}

pub fn expenses_by_category(expenses: &[Expense]) -> BTreeMap<Category, Decimal> {
    let mut out = BTreeMap::new();
    for e in expenses {
        let total = out.entry(e.category).or_insert(Decimal::ZERO);
        *total = total.saturating_add(e.amount_in_base);
    }
    out
}

pub fn expenses_by_date(expenses: &[Expense]) -> BTreeMap<NaiveDate, Decimal> {
    let mut out = BTreeMap::new();
    for e in expenses {
        let total = out.entry(e.date).or_insert(Decimal::ZERO);
        *total = total.saturating_add(e.amount_in_base);
    }
    out
}
