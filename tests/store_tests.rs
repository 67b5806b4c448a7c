// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::tempdir;
use tripsplit::error::EntryError;
use tripsplit::models::{Category, MemberId, Split};
use tripsplit::store::{self, NewExpense, NewTrip};
use tripsplit::{db, settlement, utils};

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    conn
}

fn new_trip(conn: &Connection, name: &str, currency: &str) -> i64 {
    store::create_trip(
        conn,
        &NewTrip {
            name: name.to_string(),
            currency: currency.to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 4, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 4, 7),
        },
    )
    .unwrap()
}

fn new_expense(payer: MemberId, amount: Decimal, currency: &str, participants: &[MemberId]) -> NewExpense {
    NewExpense {
        description: "taxi".to_string(),
        amount,
        currency: currency.to_string(),
        payer_id: payer,
        date: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap(),
        category: Category::Transport,
        participants: participants.to_vec(),
        split: Split::Equal,
    }
}

fn shares(pairs: &[(MemberId, Decimal)]) -> Split {
    Split::Custom(pairs.iter().copied().collect::<BTreeMap<_, _>>())
}

#[test]
fn snapshot_round_trips_expenses() {
    let conn = setup();
    let trip_id = new_trip(&conn, "Osaka", "usd");
    let a = store::add_member(&conn, trip_id, "Ann", None, None).unwrap();
    let b = store::add_member(&conn, trip_id, " Bo ", Some("🐻"), Some("#000000")).unwrap();

    let mut e = new_expense(a, dec!(92), "eur", &[a, b, a]);
    e.split = shares(&[(a, dec!(60)), (b, dec!(32)), (99, dec!(5))]);
    store::add_expense(&conn, trip_id, &e).unwrap();

    let trip = store::load_trip(&conn, trip_id).unwrap();
    assert_eq!(trip.currency, "USD");
    assert_eq!(trip.start_date, NaiveDate::from_ymd_opt(2025, 4, 1));
    assert_eq!(trip.members[0].color.as_deref(), Some(store::MEMBER_COLORS[0]));
    assert_eq!(trip.members[1].name, "Bo");
    assert_eq!(trip.members[1].avatar.as_deref(), Some("🐻"));
    assert_eq!(trip.members[1].color.as_deref(), Some("#000000"));

    let stored = &trip.expenses[0];
    assert_eq!(stored.currency, "EUR");
    assert_eq!(stored.amount_in_base, dec!(100));
    assert_eq!(stored.participants, vec![a, b]);
    // the share of a non-participant is not kept
    assert_eq!(stored.split, shares(&[(a, dec!(60)), (b, dec!(32))]));
}

#[test]
fn custom_split_must_cover_the_amount() {
    let conn = setup();
    let trip_id = new_trip(&conn, "Osaka", "USD");
    let a = store::add_member(&conn, trip_id, "Ann", None, None).unwrap();
    let b = store::add_member(&conn, trip_id, "Bo", None, None).unwrap();

    let mut e = new_expense(a, dec!(100), "USD", &[a, b]);
    e.split = shares(&[(a, dec!(60)), (b, dec!(30))]);
    let err = store::add_expense(&conn, trip_id, &e).unwrap_err();
    assert_eq!(
        err.downcast_ref::<EntryError>(),
        Some(&EntryError::SplitMismatch {
            expected: dec!(100),
            actual: dec!(90)
        })
    );

    // within one cent is accepted
    e.split = shares(&[(a, dec!(66.67)), (b, dec!(33.33))]);
    assert!(store::add_expense(&conn, trip_id, &e).is_ok());
    e.split = shares(&[(a, dec!(66.666)), (b, dec!(33.33))]);
    assert!(store::add_expense(&conn, trip_id, &e).is_ok());
    assert_eq!(store::list_expenses(&conn, trip_id).unwrap().len(), 2);
}

#[test]
fn entry_validation_rejects_bad_input() {
    let conn = setup();
    let trip_id = new_trip(&conn, "Osaka", "USD");
    let a = store::add_member(&conn, trip_id, "Ann", None, None).unwrap();
    let members = store::list_members(&conn, trip_id).unwrap();

    let check = |e: NewExpense| store::validate_expense(&e, &members);

    assert_eq!(
        check(new_expense(a, dec!(0), "USD", &[a])),
        Err(EntryError::NonPositiveAmount(dec!(0)))
    );
    assert_eq!(check(new_expense(a, dec!(5), "USD", &[])), Err(EntryError::NoParticipants));
    assert_eq!(check(new_expense(42, dec!(5), "USD", &[a])), Err(EntryError::UnknownPayer(42)));
    assert_eq!(
        check(new_expense(a, dec!(5), "USD", &[a, 7])),
        Err(EntryError::UnknownParticipant(7))
    );
    assert_eq!(
        check(new_expense(a, dec!(5), "US$", &[a])),
        Err(EntryError::InvalidCurrency("US$".to_string()))
    );
    let mut e = new_expense(a, dec!(5), "USD", &[a]);
    e.split = shares(&[(a, dec!(-1))]);
    assert_eq!(check(e), Err(EntryError::NegativeShare(a)));
    assert_eq!(check(new_expense(a, dec!(5), "usd", &[a])), Ok(()));
}

#[test]
fn removing_a_member_cascades() {
    let conn = setup();
    let trip_id = new_trip(&conn, "Osaka", "USD");
    let a = store::add_member(&conn, trip_id, "A", None, None).unwrap();
    let b = store::add_member(&conn, trip_id, "B", None, None).unwrap();
    let c = store::add_member(&conn, trip_id, "C", None, None).unwrap();

    store::add_expense(&conn, trip_id, &new_expense(a, dec!(300), "USD", &[a, b, c])).unwrap();
    store::add_expense(&conn, trip_id, &new_expense(b, dec!(50), "USD", &[a, b])).unwrap();
    let mut custom = new_expense(a, dec!(90), "USD", &[a, b, c]);
    custom.split = shares(&[(a, dec!(30)), (b, dec!(30)), (c, dec!(30))]);
    store::add_expense(&conn, trip_id, &custom).unwrap();

    store::remove_member(&conn, trip_id, b).unwrap();

    let trip = store::load_trip(&conn, trip_id).unwrap();
    assert_eq!(trip.members.iter().map(|m| m.id).collect::<Vec<_>>(), vec![a, c]);
    assert_eq!(trip.expenses.len(), 2, "expense paid by B is gone");
    assert_eq!(trip.expenses[0].participants, vec![a, c]);
    assert_eq!(trip.expenses[1].split, shares(&[(a, dec!(30)), (c, dec!(30))]));

    let s = settlement::settle(&trip);
    assert_eq!(s.balances[0].balance, dec!(210));
    assert_eq!(s.balances[1].balance, dec!(-180));
    assert_eq!(s.transactions.len(), 1);
    assert_eq!(s.transactions[0].amount, dec!(180));
}

#[test]
fn rate_changes_refresh_base_amounts() {
    let conn = setup();
    let trip_id = new_trip(&conn, "Tokyo", "HKD");
    let a = store::add_member(&conn, trip_id, "A", None, None).unwrap();
    store::add_expense(&conn, trip_id, &new_expense(a, dec!(100), "JPY", &[a])).unwrap();

    // 100 JPY -> 100/150 USD -> * 7.8 HKD
    let base = |conn: &Connection| store::list_expenses(conn, trip_id).unwrap()[0].amount_in_base;
    assert_eq!(utils::fmt_amount(&base(&conn)), "5.20");

    store::set_rate(&conn, trip_id, "jpy", dec!(0.05)).unwrap();
    assert_eq!(base(&conn), dec!(5));
    assert_eq!(store::trip_rates(&conn, trip_id).unwrap().get("JPY"), Some(&dec!(0.05)));

    assert!(store::set_rate(&conn, trip_id, "JPY", dec!(0)).is_err());

    assert!(store::remove_rate(&conn, trip_id, "JPY").unwrap());
    assert!(!store::remove_rate(&conn, trip_id, "JPY").unwrap());
    assert_eq!(utils::fmt_amount(&base(&conn)), "5.20");

    store::set_rate(&conn, trip_id, "JPY", dec!(0.05)).unwrap();
    store::set_trip_currency(&conn, trip_id, "JPY").unwrap();
    assert!(store::trip_rates(&conn, trip_id).unwrap().is_empty());
    assert_eq!(base(&conn), dec!(100));
}

#[test]
fn current_trip_follows_selection() {
    let conn = setup();
    assert!(store::resolve_trip(&conn, None).is_err());

    let osaka = new_trip(&conn, "Osaka", "JPY");
    let seoul = new_trip(&conn, "Seoul", "KRW");
    store::set_current_trip(&conn, osaka).unwrap();
    assert_eq!(store::resolve_trip(&conn, None).unwrap(), osaka);
    assert_eq!(store::resolve_trip(&conn, Some("Seoul")).unwrap(), seoul);
    assert!(store::resolve_trip(&conn, Some("Paris")).is_err());

    store::remove_trip(&conn, osaka).unwrap();
    assert_eq!(store::current_trip_id(&conn).unwrap(), None);
    assert_eq!(store::list_trips(&conn).unwrap().len(), 1);
}

#[test]
fn default_currency_setting() {
    let conn = setup();
    assert_eq!(store::default_currency(&conn).unwrap(), "HKD");
    store::set_default_currency(&conn, "twd").unwrap();
    assert_eq!(store::default_currency(&conn).unwrap(), "TWD");
    assert!(store::set_default_currency(&conn, "dollars").is_err());
}

#[test]
fn database_file_persists_between_opens() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trips.sqlite");
    {
        let conn = db::open_at(&path).unwrap();
        let id = new_trip(&conn, "Bangkok", "THB");
        store::add_member(&conn, id, "A", None, None).unwrap();
    }
    let conn = db::open_at(&path).unwrap();
    let id = store::trip_id_by_name(&conn, "Bangkok").unwrap();
    assert_eq!(store::list_members(&conn, id).unwrap().len(), 1);
}

#[test]
fn oversized_amounts_and_rates_are_rejected() {
    let conn = setup();
    let trip_id = new_trip(&conn, "Hue", "VND");
    let a = store::add_member(&conn, trip_id, "Ann", None, None).unwrap();
    let b = store::add_member(&conn, trip_id, "Bo", None, None).unwrap();

    let huge = dec!(10000000000000000000000000);
    let err = store::add_expense(&conn, trip_id, &new_expense(a, huge, "USD", &[a])).unwrap_err();
    assert_eq!(err.downcast_ref::<EntryError>(), Some(&EntryError::AmountTooLarge(huge)));
    assert!(store::list_expenses(&conn, trip_id).unwrap().is_empty());

    let mut split = new_expense(a, dec!(10), "USD", &[a, b]);
    split.split = shares(&[(a, dec!(2000000000000000)), (b, dec!(-1999999999999990))]);
    assert_eq!(
        store::validate_expense(&split, &store::list_members(&conn, trip_id).unwrap()),
        Err(EntryError::AmountTooLarge(dec!(2000000000000000)))
    );

    // the limit itself converts without trouble
    store::add_expense(&conn, trip_id, &new_expense(a, store::MAX_AMOUNT, "USD", &[a])).unwrap();
    let stored = store::list_expenses(&conn, trip_id).unwrap();
    assert_eq!(stored[0].amount_in_base, store::MAX_AMOUNT * dec!(24500));

    let err = store::set_rate(&conn, trip_id, "usd", dec!(1000000001)).unwrap_err();
    assert_eq!(err.downcast_ref::<EntryError>(), Some(&EntryError::RateTooLarge("USD".into())));
    store::set_rate(&conn, trip_id, "USD", store::MAX_RATE).unwrap();
}

#[test]
fn base_currency_cannot_have_a_custom_rate() {
    let conn = setup();
    let trip_id = new_trip(&conn, "Taipei", "TWD");
    let err = store::set_rate(&conn, trip_id, "twd", dec!(2)).unwrap_err();
    assert_eq!(
        err.downcast_ref::<EntryError>(),
        Some(&EntryError::BaseCurrencyRate("TWD".into()))
    );
    assert!(store::trip_rates(&conn, trip_id).unwrap().is_empty());
}

#[test]
fn editing_an_expense_rewrites_it() {
    let conn = setup();
    let trip_id = new_trip(&conn, "Lyon", "USD");
    let a = store::add_member(&conn, trip_id, "Ann", None, None).unwrap();
    let b = store::add_member(&conn, trip_id, "Bo", None, None).unwrap();
    let c = store::add_member(&conn, trip_id, "Cy", None, None).unwrap();
    let id = store::add_expense(&conn, trip_id, &new_expense(a, dec!(90), "USD", &[a, b, c])).unwrap();

    let mut e = new_expense(b, dec!(92), "eur", &[a, b]);
    e.description = "dinner".to_string();
    e.category = Category::Food;
    e.split = shares(&[(a, dec!(46)), (b, dec!(46))]);
    store::update_expense(&conn, trip_id, id, &e).unwrap();

    let trip = store::load_trip(&conn, trip_id).unwrap();
    assert_eq!(trip.expenses.len(), 1);
    let stored = &trip.expenses[0];
    assert_eq!(stored.id, id);
    assert_eq!(stored.payer_id, b);
    assert_eq!(stored.description, "dinner");
    assert_eq!(stored.category, Category::Food);
    assert_eq!(stored.currency, "EUR");
    assert_eq!(stored.amount_in_base, dec!(100));
    assert_eq!(stored.participants, vec![a, b]);
    assert_eq!(stored.split, shares(&[(a, dec!(46)), (b, dec!(46))]));

    let s = settlement::settle(&trip);
    assert_eq!(s.balances[0].balance, dec!(-50));
    assert_eq!(s.balances[1].balance, dec!(50));
    assert_eq!(s.balances[2].balance, Decimal::ZERO);

    // a rejected edit leaves the row alone
    let mut bad = e.clone();
    bad.split = shares(&[(a, dec!(1))]);
    assert!(store::update_expense(&conn, trip_id, id, &bad).is_err());
    let again = store::list_expenses(&conn, trip_id).unwrap();
    assert_eq!(again[0].split, shares(&[(a, dec!(46)), (b, dec!(46))]));

    assert!(store::update_expense(&conn, trip_id, id + 100, &e).is_err());
}

#[test]
fn trip_and_member_details_can_change() {
    let conn = setup();
    let trip_id = new_trip(&conn, "Hanoi", "VND");
    new_trip(&conn, "Hue", "VND");

    store::rename_trip(&conn, trip_id, " Hanoi 2025 ").unwrap();
    assert_eq!(store::trip_id_by_name(&conn, "Hanoi 2025").unwrap(), trip_id);
    assert!(store::trip_id_by_name(&conn, "Hanoi").is_err());
    assert!(store::rename_trip(&conn, trip_id, "  ").is_err());
    assert!(store::rename_trip(&conn, trip_id, "Hue").is_err());

    let may = |d| NaiveDate::from_ymd_opt(2025, 5, d);
    store::set_trip_dates(&conn, trip_id, may(1), None).unwrap();
    let trip = store::load_trip(&conn, trip_id).unwrap();
    assert_eq!((trip.start_date, trip.end_date), (may(1), None));
    assert!(store::set_trip_dates(&conn, trip_id, may(3), may(1)).is_err());

    let a = store::add_member(&conn, trip_id, "Ann", Some("🐱"), None).unwrap();
    store::update_member(&conn, trip_id, a, None, Some("#123456")).unwrap();
    let m = &store::list_members(&conn, trip_id).unwrap()[0];
    assert_eq!(m.avatar.as_deref(), Some("🐱"));
    assert_eq!(m.color.as_deref(), Some("#123456"));

    store::update_member(&conn, trip_id, a, Some("🦊"), None).unwrap();
    let m = &store::list_members(&conn, trip_id).unwrap()[0];
    assert_eq!(m.avatar.as_deref(), Some("🦊"));
    assert_eq!(m.color.as_deref(), Some("#123456"));

    assert!(store::update_member(&conn, trip_id, a + 100, None, None).is_err());
}
