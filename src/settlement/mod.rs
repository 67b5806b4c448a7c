// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Settlement engine: currency normalisation, per-member balances and the
//! greedy debtor/creditor matching that turns balances into transfers.
//!
//! Everything here is pure. Callers pass a [`Trip`] snapshot (or its parts) and
//! get fresh values back; nothing is cached between calls.

pub mod balances;
pub mod fx;
pub mod matcher;
pub mod stats;
pub mod summary;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Trip;

pub use balances::{Balance, calculate_balances};
pub use fx::convert;
pub use matcher::{SettlementTransaction, minimize_transactions};
pub use summary::render_summary;

/// Amounts within one cent of zero count as settled.
pub const EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settlement {
    pub balances: Vec<Balance>,
    pub transactions: Vec<SettlementTransaction>,
}

pub fn settle(trip: &Trip) -> Settlement {
    let balances = calculate_balances(
        &trip.members,
        &trip.expenses,
        &trip.currency,
        Some(&trip.custom_rates),
    );
    let transactions = minimize_transactions(&balances);
    Settlement {
        balances,
        transactions,
    }
}
