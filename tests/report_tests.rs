// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tripsplit::models::{Category, Expense, Split};
use tripsplit::settlement::stats::{expenses_by_category, expenses_by_date, total_expenses};

fn expense(day: u32, category: Category, amount_in_base: Decimal) -> Expense {
    Expense {
        id: 1,
        trip_id: 1,
        description: String::new(),
        amount: amount_in_base,
        currency: "TWD".to_string(),
        amount_in_base,
        payer_id: 1,
        date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
        category,
        participants: vec![1],
        split: Split::Equal,
        created_at: String::new(),
        updated_at: String::new(),
    }
}

#[test]
fn totals_use_stored_base_amounts() {
    let ex = vec![
        expense(2, Category::Food, dec!(12.5)),
        expense(1, Category::Transport, dec!(40)),
        expense(2, Category::Food, dec!(7.5)),
        expense(3, Category::Shopping, dec!(100)),
    ];
    assert_eq!(total_expenses(&ex), dec!(160));
    assert_eq!(total_expenses(&[]), Decimal::ZERO);

    let by_cat = expenses_by_category(&ex);
    assert_eq!(by_cat.len(), 3);
    assert_eq!(by_cat[&Category::Food], dec!(20));
    assert_eq!(by_cat[&Category::Transport], dec!(40));
    assert!(!by_cat.contains_key(&Category::Accommodation));

    let by_date: Vec<(NaiveDate, Decimal)> = expenses_by_date(&ex).into_iter().collect();
    assert_eq!(
        by_date,
        vec![
            (NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), dec!(40)),
            (NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(), dec!(20)),
            (NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(), dec!(100)),
        ]
    );
}

#[test]
fn categories_parse_case_insensitively() {
    assert_eq!("Food".parse::<Category>().unwrap(), Category::Food);
    assert_eq!(" ACCOMMODATION ".parse::<Category>().unwrap(), Category::Accommodation);
    assert!("groceries".parse::<Category>().is_err());
    assert_eq!(Category::Entertainment.to_string(), "entertainment");
}

#[test]
fn totals_saturate_at_the_decimal_limit() {
    let ex = vec![
        expense(1, Category::Food, Decimal::MAX),
        expense(1, Category::Food, Decimal::MAX),
    ];
    assert_eq!(total_expenses(&ex), Decimal::MAX);
    assert_eq!(expenses_by_category(&ex)[&Category::Food], Decimal::MAX);
    assert_eq!(expenses_by_date(&ex).into_values().next(), Some(Decimal::MAX));
}
