// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;

use crate::models::RateTable;

// Units of each currency per 1 USD.
static FALLBACK_RATES: Lazy<HashMap<&'static str, Decimal>> = Lazy::new(|| {
    [
        ("USD", Decimal::new(1, 0)),
        ("HKD", Decimal::new(78, 1)),
        ("TWD", Decimal::new(32, 0)),
        ("JPY", Decimal::new(150, 0)),
        ("KRW", Decimal::new(1350, 0)),
        ("CNY", Decimal::new(72, 1)),
        ("EUR", Decimal::new(92, 2)),
        ("GBP", Decimal::new(79, 2)),
        ("THB", Decimal::new(35, 0)),
        ("SGD", Decimal::new(135, 2)),
        ("MYR", Decimal::new(47, 1)),
        ("VND", Decimal::new(24500, 0)),
    ]
    .into_iter()
    .collect()
});

const SUPPORTED: [&str; 12] = [
    "HKD", "USD", "TWD", "JPY", "KRW", "CNY", "EUR", "GBP", "THB", "SGD", "MYR", "VND",
];

pub fn supported_currencies() -> &'static [&'static str] {
    &SUPPORTED
}

/// Units of `code` per 1 USD from the built-in table.
pub fn fallback_rate(code: &str) -> Option<Decimal> {
    FALLBACK_RATES.get(code).copied()
}

fn custom_rate(code: &str, custom_rates: Option<&RateTable>) -> Option<Decimal> {
    custom_rates
        .and_then(|rates| rates.get(code))
        .copied()
        .filter(|r| r.is_sign_positive() && !r.is_zero())
}

/// Convert `amount` from `from` into `to`.
///
/// A custom rate for `from` wins and is read as "1 `from` = rate `to`", so the
/// table must have been built against `to`. Otherwise both sides go through the
/// built-in USD table. When no rate is known the amount is returned unchanged
/// (1:1) and a warning is logged, so balance computation never fails. A result
/// too large for `Decimal` degrades the same way.
pub fn convert(amount: Decimal, from: &str, to: &str, custom_rates: Option<&RateTable>) -> Decimal {
    if from == to {
        return amount;
    }
    let converted = if let Some(rate) = custom_rate(from, custom_rates) {
        amount.checked_mul(rate)
    } else {
        match (fallback_rate(from), fallback_rate(to)) {
            (Some(from_rate), Some(to_rate)) => amount
                .checked_div(from_rate)
                .and_then(|usd| usd.checked_mul(to_rate)),
            _ => {
                tracing::warn!(%from, %to, %amount, "no exchange rate known, treating as 1:1");
                return amount;
            }
        }
    };
    converted.unwrap_or_else(|| {
        tracing::warn!(%from, %to, %amount, "conversion overflowed, treating as 1:1");
        amount
    })
}

/// Whether [`convert`] has a real rate for this pair instead of degrading to 1:1.
pub fn can_convert(from: &str, to: &str, custom_rates: Option<&RateTable>) -> bool {
    from == to
        || custom_rate(from, custom_rates).is_some()
        || (fallback_rate(from).is_some() && fallback_rate(to).is_some())
}
