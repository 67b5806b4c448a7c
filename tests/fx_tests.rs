// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tripsplit::models::RateTable;
use tripsplit::settlement::fx::{can_convert, convert};

fn rates(pairs: &[(&str, Decimal)]) -> RateTable {
    pairs.iter().map(|(c, r)| (c.to_string(), *r)).collect()
}

#[test]
fn same_currency_is_identity() {
    let custom = rates(&[("EUR", dec!(2))]);
    for amt in [dec!(0), dec!(12.34), dec!(-7), dec!(1000000)] {
        assert_eq!(convert(amt, "EUR", "EUR", Some(&custom)), amt);
        assert_eq!(convert(amt, "XYZ", "XYZ", None), amt);
    }
}

#[test]
fn fallback_goes_through_usd() {
    // 92 EUR at 0.92 per USD -> 100 USD
    assert_eq!(convert(dec!(92), "EUR", "USD", None), dec!(100));
    // 780 HKD -> 100 USD -> 15000 JPY
    assert_eq!(convert(dec!(780), "HKD", "JPY", None), dec!(15000));
}

#[test]
fn custom_rate_takes_precedence() {
    // 1 JPY = 0.052 HKD
    let custom = rates(&[("JPY", dec!(0.052))]);
    assert_eq!(convert(dec!(1000), "JPY", "HKD", Some(&custom)), dec!(52));
    // Other currencies still use the built-in table
    assert_eq!(convert(dec!(92), "EUR", "USD", Some(&custom)), dec!(100));
}

#[test]
fn non_positive_custom_rate_is_ignored() {
    let custom = rates(&[("EUR", dec!(0)), ("GBP", dec!(-1))]);
    assert_eq!(convert(dec!(92), "EUR", "USD", Some(&custom)), dec!(100));
    assert_eq!(convert(dec!(79), "GBP", "USD", Some(&custom)), dec!(100));
}

#[test]
fn unknown_currency_degrades_to_one_to_one() {
    assert_eq!(convert(dec!(50), "ABC", "USD", None), dec!(50));
    assert_eq!(convert(dec!(50), "USD", "ZZZ", None), dec!(50));
    assert!(!can_convert("ABC", "USD", None));
    assert!(!can_convert("USD", "ZZZ", None));

    let custom = rates(&[("ABC", dec!(3))]);
    assert!(can_convert("ABC", "ZZZ", Some(&custom)));
    assert_eq!(convert(dec!(50), "ABC", "ZZZ", Some(&custom)), dec!(150));
}

#[test]
fn overflowing_conversion_degrades_to_one_to_one() {
    // Decimal::MAX * 24500 VND per USD does not fit
    assert_eq!(convert(Decimal::MAX, "USD", "VND", None), Decimal::MAX);
    // dividing by 0.92 EUR per USD already overflows
    assert_eq!(convert(Decimal::MAX, "EUR", "USD", None), Decimal::MAX);

    let custom = rates(&[("JPY", dec!(2))]);
    assert_eq!(convert(Decimal::MAX, "JPY", "HKD", Some(&custom)), Decimal::MAX);
    // amounts well inside the range are unaffected
    assert_eq!(convert(dec!(1000000000000000), "USD", "VND", None), dec!(24500000000000000000));
}
