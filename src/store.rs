// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Trip persistence. Everything takes an explicit connection; the settlement
//! engine only ever sees the [`Trip`] snapshot returned by [`load_trip`].

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::EntryError;
use crate::models::{Category, Expense, Member, MemberId, RateTable, Split, Trip};
use crate::settlement::{EPSILON, fx};
use crate::utils::{get_setting, parse_currency, set_setting};

pub const MEMBER_COLORS: [&str; 10] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
    "#BB8FCE", "#85C1E9",
];

const DEFAULT_CURRENCY: &str = "HKD";

/// Largest amount or custom share accepted for one expense (10^15).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);
/// Largest custom rate accepted (10^9 base units per unit).
pub const MAX_RATE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

fn dec(s: &str, what: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid {} '{}' in database", what, s))
}

fn touch_trip(conn: &Connection, trip_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE trips SET updated_at=datetime('now') WHERE id=?1",
        params![trip_id],
    )?;
    Ok(())
}

// ---- settings ----

pub fn default_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "default_currency")?.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()))
}

pub fn set_default_currency(conn: &Connection, ccy: &str) -> Result<()> {
    let ccy = parse_currency(ccy)?;
    set_setting(conn, "default_currency", &ccy)
}

pub fn current_trip_id(conn: &Connection) -> Result<Option<i64>> {
    let Some(v) = get_setting(conn, "current_trip")? else {
        return Ok(None);
    };
    let id: i64 = v
        .parse()
        .with_context(|| format!("Invalid current_trip setting '{}'", v))?;
    let exists: Option<i64> = conn
        .query_row("SELECT id FROM trips WHERE id=?1", params![id], |r| r.get(0))
        .optional()?;
    Ok(exists)
}

pub fn set_current_trip(conn: &Connection, trip_id: i64) -> Result<()> {
    set_setting(conn, "current_trip", &trip_id.to_string())
}

/// The trip named on the command line, or else the current one.
pub fn resolve_trip(conn: &Connection, name: Option<&str>) -> Result<i64> {
    match name {
        Some(n) => trip_id_by_name(conn, n),
        None => current_trip_id(conn)?
            .ok_or_else(|| anyhow!("No trip selected; pass --trip or run 'trip use <name>'")),
    }
}

// ---- trips ----

#[derive(Debug, Clone)]
pub struct NewTrip {
    pub name: String,
    pub currency: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub fn create_trip(conn: &Connection, trip: &NewTrip) -> Result<i64> {
    let name = trip.name.trim();
    if name.is_empty() {
        return Err(anyhow!("Trip name must not be empty"));
    }
    let currency = parse_currency(&trip.currency)?;
    if let (Some(s), Some(e)) = (trip.start_date, trip.end_date) {
        if e < s {
            return Err(anyhow!("Trip ends ({}) before it starts ({})", e, s));
        }
    }
    conn.execute(
        "INSERT INTO trips(name, currency, start_date, end_date) VALUES (?1, ?2, ?3, ?4)",
        params![name, currency, trip.start_date, trip.end_date],
    )
    .with_context(|| format!("Could not create trip '{}'", name))?;
    let id = conn.last_insert_rowid();
    tracing::info!(trip = id, %name, %currency, "trip created");
    Ok(id)
}

pub fn trip_id_by_name(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM trips WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name.trim()], |r| r.get(0))
        .with_context(|| format!("Trip '{}' not found", name))?;
    Ok(id)
}

#[derive(Debug, Clone, Serialize)]
pub struct TripRow {
    pub id: i64,
    pub name: String,
    pub currency: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub members: i64,
    pub expenses: i64,
}

pub fn list_trips(conn: &Connection) -> Result<Vec<TripRow>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.currency, t.start_date, t.end_date,
                (SELECT COUNT(*) FROM members m WHERE m.trip_id=t.id),
                (SELECT COUNT(*) FROM expenses e WHERE e.trip_id=t.id)
         FROM trips t ORDER BY t.name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(TripRow {
            id: r.get(0)?,
            name: r.get(1)?,
            currency: r.get(2)?,
            start_date: r.get(3)?,
            end_date: r.get(4)?,
            members: r.get(5)?,
            expenses: r.get(6)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn remove_trip(conn: &Connection, trip_id: i64) -> Result<()> {
    conn.execute("DELETE FROM trips WHERE id=?1", params![trip_id])?;
    tracing::info!(trip = trip_id, "trip removed");
    Ok(())
}

pub fn rename_trip(conn: &Connection, trip_id: i64, new: &str) -> Result<()> {
    let new = new.trim();
    if new.is_empty() {
        return Err(anyhow!("Trip name must not be empty"));
    }
    let n = conn
        .execute("UPDATE trips SET name=?1 WHERE id=?2", params![new, trip_id])
        .with_context(|| format!("Could not rename trip to '{}'", new))?;
    if n == 0 {
        return Err(anyhow!("Trip {} not found", trip_id));
    }
    touch_trip(conn, trip_id)?;
    tracing::info!(trip = trip_id, name = %new, "trip renamed");
    Ok(())
}

/// Replace both trip dates; `None` clears a date.
pub fn set_trip_dates(
    conn: &Connection,
    trip_id: i64,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<()> {
    if let (Some(s), Some(e)) = (start_date, end_date) {
        if e < s {
            return Err(anyhow!("Trip ends ({}) before it starts ({})", e, s));
        }
    }
    let n = conn.execute(
        "UPDATE trips SET start_date=?1, end_date=?2 WHERE id=?3",
        params![start_date, end_date, trip_id],
    )?;
    if n == 0 {
        return Err(anyhow!("Trip {} not found", trip_id));
    }
    touch_trip(conn, trip_id)?;
    Ok(())
}

/// Change the base currency. Custom rates were expressed against the old base,
/// so they are dropped, and stored base amounts are recomputed.
pub fn set_trip_currency(conn: &Connection, trip_id: i64, ccy: &str) -> Result<()> {
    let ccy = parse_currency(ccy)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE trips SET currency=?1 WHERE id=?2",
        params![ccy, trip_id],
    )?;
    tx.execute("DELETE FROM trip_rates WHERE trip_id=?1", params![trip_id])?;
    refresh_base_amounts(&tx, trip_id)?;
    touch_trip(&tx, trip_id)?;
    tx.commit()?;
    tracing::info!(trip = trip_id, currency = %ccy, "base currency changed");
    Ok(())
}

// ---- members ----

pub fn add_member(
    conn: &Connection,
    trip_id: i64,
    name: &str,
    avatar: Option<&str>,
    color: Option<&str>,
) -> Result<MemberId> {
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("Member name must not be empty"));
    }
    let color = match color {
        Some(c) => c.to_string(),
        None => {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM members WHERE trip_id=?1",
                params![trip_id],
                |r| r.get(0),
            )?;
            MEMBER_COLORS[count as usize % MEMBER_COLORS.len()].to_string()
        }
    };
    conn.execute(
        "INSERT INTO members(trip_id, name, avatar, color) VALUES (?1, ?2, ?3, ?4)",
        params![trip_id, name, avatar, color],
    )
    .with_context(|| format!("Could not add member '{}'", name))?;
    let id = conn.last_insert_rowid();
    touch_trip(conn, trip_id)?;
    tracing::info!(trip = trip_id, member = id, %name, "member added");
    Ok(id)
}

pub fn member_id_by_name(conn: &Connection, trip_id: i64, name: &str) -> Result<MemberId> {
    let mut stmt = conn.prepare("SELECT id FROM members WHERE trip_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![trip_id, name.trim()], |r| r.get(0))
        .with_context(|| format!("Member '{}' not found", name))?;
    Ok(id)
}

pub fn rename_member(conn: &Connection, trip_id: i64, old: &str, new: &str) -> Result<()> {
    let id = member_id_by_name(conn, trip_id, old)?;
    let new = new.trim();
    if new.is_empty() {
        return Err(anyhow!("Member name must not be empty"));
    }
    conn.execute(
        "UPDATE members SET name=?1 WHERE id=?2",
        params![new, id],
    )
    .with_context(|| format!("Could not rename '{}' to '{}'", old, new))?;
    touch_trip(conn, trip_id)?;
    Ok(())
}

/// Set a member's avatar and colour. `None` leaves a field as it is.
pub fn update_member(
    conn: &Connection,
    trip_id: i64,
    member_id: MemberId,
    avatar: Option<&str>,
    color: Option<&str>,
) -> Result<()> {
    let n = conn.execute(
        "UPDATE members SET avatar=COALESCE(?1, avatar), color=COALESCE(?2, color)
         WHERE id=?3 AND trip_id=?4",
        params![avatar, color, member_id, trip_id],
    )?;
    if n == 0 {
        return Err(anyhow!("Member {} not found in trip", member_id));
    }
    touch_trip(conn, trip_id)?;
    tracing::info!(trip = trip_id, member = member_id, "member updated");
    Ok(())
}

/// Delete a member. Their participations and custom shares go with them, as do
/// the expenses they paid for.
pub fn remove_member(conn: &Connection, trip_id: i64, member_id: MemberId) -> Result<()> {
    let n = conn.execute(
        "DELETE FROM members WHERE id=?1 AND trip_id=?2",
        params![member_id, trip_id],
    )?;
    if n == 0 {
        return Err(anyhow!("Member {} not found in trip", member_id));
    }
    touch_trip(conn, trip_id)?;
    tracing::info!(trip = trip_id, member = member_id, "member removed");
    Ok(())
}

pub fn list_members(conn: &Connection, trip_id: i64) -> Result<Vec<Member>> {
    let mut stmt =
        conn.prepare("SELECT id, name, avatar, color FROM members WHERE trip_id=?1 ORDER BY id")?;
    let rows = stmt.query_map(params![trip_id], |r| {
        Ok(Member {
            id: r.get(0)?,
            name: r.get(1)?,
            avatar: r.get(2)?,
            color: r.get(3)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// ---- expenses ----

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub description: String,
    pub amount: Decimal,
    pub currency: String,
    pub payer_id: MemberId,
    pub date: NaiveDate,
    pub category: Category,
    pub participants: Vec<MemberId>,
    pub split: Split,
}

/// Entry checks the settlement engine relies on but never repeats.
///
/// A custom split must account for the whole amount; a participant without a
/// share counts as zero.
pub fn validate_expense(e: &NewExpense, members: &[Member]) -> Result<(), EntryError> {
    if e.amount <= Decimal::ZERO {
        return Err(EntryError::NonPositiveAmount(e.amount));
    }
    if e.amount > MAX_AMOUNT {
        return Err(EntryError::AmountTooLarge(e.amount));
    }
    parse_currency(&e.currency)?;
    if e.participants.is_empty() {
        return Err(EntryError::NoParticipants);
    }
    let known: HashSet<MemberId> = members.iter().map(|m| m.id).collect();
    if !known.contains(&e.payer_id) {
        return Err(EntryError::UnknownPayer(e.payer_id));
    }
    if let Some(id) = e.participants.iter().find(|id| !known.contains(id)) {
        return Err(EntryError::UnknownParticipant(*id));
    }
    if let Split::Custom(shares) = &e.split {
        let mut actual = Decimal::ZERO;
        for id in dedup(&e.participants) {
            let share = shares.get(&id).copied().unwrap_or(Decimal::ZERO);
            if share.is_sign_negative() && !share.is_zero() {
                return Err(EntryError::NegativeShare(id));
            }
            if share > MAX_AMOUNT {
                return Err(EntryError::AmountTooLarge(share));
            }
            actual += share;
        }
        if (actual - e.amount).abs() > EPSILON {
            return Err(EntryError::SplitMismatch {
                expected: e.amount,
                actual,
            });
        }
    }
    Ok(())
}

fn dedup(ids: &[MemberId]) -> Vec<MemberId> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

pub fn add_expense(conn: &Connection, trip_id: i64, e: &NewExpense) -> Result<i64> {
    let members = list_members(conn, trip_id)?;
    validate_expense(e, &members)?;
    let currency = parse_currency(&e.currency)?;
    let base = trip_currency(conn, trip_id)?;
    let rates = trip_rates(conn, trip_id)?;
    let amount_in_base = fx::convert(e.amount, &currency, &base, Some(&rates));

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO expenses(trip_id, description, amount, currency, amount_in_base, payer_id, date, category, split_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            trip_id,
            e.description.trim(),
            e.amount.to_string(),
            currency,
            amount_in_base.to_string(),
            e.payer_id,
            e.date,
            e.category.as_str(),
            e.split.kind(),
        ],
    )?;
    let expense_id = tx.last_insert_rowid();
    write_participants(&tx, expense_id, e)?;
    touch_trip(&tx, trip_id)?;
    tx.commit()?;
    tracing::info!(trip = trip_id, expense = expense_id, amount = %e.amount, %currency, "expense added");
    Ok(expense_id)
}

fn write_participants(conn: &Connection, expense_id: i64, e: &NewExpense) -> Result<()> {
    for member_id in dedup(&e.participants) {
        // Shares of non-participants are dropped here.
        let share = e.split.share_of(member_id).map(|s| s.to_string());
        conn.execute(
            "INSERT INTO expense_participants(expense_id, member_id, share) VALUES (?1, ?2, ?3)",
            params![expense_id, member_id, share],
        )?;
    }
    Ok(())
}

/// Replace every field of an existing expense, re-validating it and
/// recomputing its base amount.
pub fn update_expense(
    conn: &Connection,
    trip_id: i64,
    expense_id: i64,
    e: &NewExpense,
) -> Result<()> {
    let members = list_members(conn, trip_id)?;
    validate_expense(e, &members)?;
    let currency = parse_currency(&e.currency)?;
    let base = trip_currency(conn, trip_id)?;
    let rates = trip_rates(conn, trip_id)?;
    let amount_in_base = fx::convert(e.amount, &currency, &base, Some(&rates));

    let tx = conn.unchecked_transaction()?;
    let n = tx.execute(
        "UPDATE expenses SET description=?1, amount=?2, currency=?3, amount_in_base=?4,
                payer_id=?5, date=?6, category=?7, split_type=?8, updated_at=datetime('now')
         WHERE id=?9 AND trip_id=?10",
        params![
            e.description.trim(),
            e.amount.to_string(),
            currency,
            amount_in_base.to_string(),
            e.payer_id,
            e.date,
            e.category.as_str(),
            e.split.kind(),
            expense_id,
            trip_id,
        ],
    )?;
    if n == 0 {
        return Err(anyhow!("Expense {} not found in trip", expense_id));
    }
    tx.execute(
        "DELETE FROM expense_participants WHERE expense_id=?1",
        params![expense_id],
    )?;
    write_participants(&tx, expense_id, e)?;
    touch_trip(&tx, trip_id)?;
    tx.commit()?;
    tracing::info!(trip = trip_id, expense = expense_id, amount = %e.amount, %currency, "expense updated");
    Ok(())
}

pub fn remove_expense(conn: &Connection, trip_id: i64, expense_id: i64) -> Result<()> {
    let n = conn.execute(
        "DELETE FROM expenses WHERE id=?1 AND trip_id=?2",
        params![expense_id, trip_id],
    )?;
    if n == 0 {
        return Err(anyhow!("Expense {} not found in trip", expense_id));
    }
    touch_trip(conn, trip_id)?;
    tracing::info!(trip = trip_id, expense = expense_id, "expense removed");
    Ok(())
}

pub fn list_expenses(conn: &Connection, trip_id: i64) -> Result<Vec<Expense>> {
    let mut participants: HashMap<i64, (Vec<MemberId>, BTreeMap<MemberId, Decimal>)> =
        HashMap::new();
    let mut pstmt = conn.prepare(
        "SELECT p.expense_id, p.member_id, p.share FROM expense_participants p
         JOIN expenses e ON e.id=p.expense_id
         WHERE e.trip_id=?1 ORDER BY p.rowid",
    )?;
    let mut prows = pstmt.query(params![trip_id])?;
    while let Some(r) = prows.next()? {
        let expense_id: i64 = r.get(0)?;
        let member_id: MemberId = r.get(1)?;
        let share: Option<String> = r.get(2)?;
        let entry = participants.entry(expense_id).or_default();
        entry.0.push(member_id);
        if let Some(s) = share {
            entry.1.insert(member_id, dec(&s, "share")?);
        }
    }

    let mut stmt = conn.prepare(
        "SELECT id, description, amount, currency, amount_in_base, payer_id, date, category,
                split_type, created_at, updated_at
         FROM expenses WHERE trip_id=?1 ORDER BY date, id",
    )?;
    let mut rows = stmt.query(params![trip_id])?;
    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let amount: String = r.get(2)?;
        let amount_in_base: String = r.get(4)?;
        let category: String = r.get(7)?;
        let split_type: String = r.get(8)?;
        let (ids, shares) = participants.remove(&id).unwrap_or_default();
        let split = match split_type.as_str() {
            "equal" => Split::Equal,
            "custom" => Split::Custom(shares),
            other => return Err(EntryError::UnknownSplitType(other.to_string()).into()),
        };
        out.push(Expense {
            id,
            trip_id,
            description: r.get(1)?,
            amount: dec(&amount, "amount")?,
            currency: r.get(3)?,
            amount_in_base: dec(&amount_in_base, "base amount")?,
            payer_id: r.get(5)?,
            date: r.get(6)?,
            category: category.parse()?,
            participants: ids,
            split,
            created_at: r.get(9)?,
            updated_at: r.get(10)?,
        });
    }
    Ok(out)
}

// ---- rates ----

fn trip_currency(conn: &Connection, trip_id: i64) -> Result<String> {
    conn.query_row(
        "SELECT currency FROM trips WHERE id=?1",
        params![trip_id],
        |r| r.get(0),
    )
    .with_context(|| format!("Trip {} not found", trip_id))
}

pub fn trip_rates(conn: &Connection, trip_id: i64) -> Result<RateTable> {
    let mut stmt =
        conn.prepare("SELECT currency, rate FROM trip_rates WHERE trip_id=?1 ORDER BY currency")?;
    let rows = stmt.query_map(params![trip_id], |r| {
        Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?;
    let mut out = RateTable::new();
    for row in rows {
        let (ccy, rate) = row?;
        let rate = dec(&rate, "rate")?;
        out.insert(ccy, rate);
    }
    Ok(out)
}

/// Set `1 ccy = rate <base>` for a trip.
pub fn set_rate(conn: &Connection, trip_id: i64, ccy: &str, rate: Decimal) -> Result<()> {
    let ccy = parse_currency(ccy)?;
    if rate <= Decimal::ZERO {
        return Err(EntryError::InvalidRate(ccy).into());
    }
    if rate > MAX_RATE {
        return Err(EntryError::RateTooLarge(ccy).into());
    }
    if ccy == trip_currency(conn, trip_id)? {
        return Err(EntryError::BaseCurrencyRate(ccy).into());
    }
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO trip_rates(trip_id, currency, rate) VALUES (?1, ?2, ?3)
         ON CONFLICT(trip_id, currency) DO UPDATE SET rate=excluded.rate",
        params![trip_id, ccy, rate.to_string()],
    )?;
    refresh_base_amounts(&tx, trip_id)?;
    touch_trip(&tx, trip_id)?;
    tx.commit()?;
    tracing::info!(trip = trip_id, currency = %ccy, %rate, "custom rate set");
    Ok(())
}

pub fn remove_rate(conn: &Connection, trip_id: i64, ccy: &str) -> Result<bool> {
    let ccy = parse_currency(ccy)?;
    let tx = conn.unchecked_transaction()?;
    let n = tx.execute(
        "DELETE FROM trip_rates WHERE trip_id=?1 AND currency=?2",
        params![trip_id, ccy],
    )?;
    if n > 0 {
        refresh_base_amounts(&tx, trip_id)?;
        touch_trip(&tx, trip_id)?;
    }
    tx.commit()?;
    Ok(n > 0)
}

fn refresh_base_amounts(conn: &Connection, trip_id: i64) -> Result<()> {
    let base = trip_currency(conn, trip_id)?;
    let rates = trip_rates(conn, trip_id)?;
    let mut stmt = conn.prepare("SELECT id, amount, currency FROM expenses WHERE trip_id=?1")?;
    let rows = stmt.query_map(params![trip_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
        ))
    })?;
    let mut updates = Vec::new();
    for row in rows {
        let (id, amount, ccy) = row?;
        let converted = fx::convert(dec(&amount, "amount")?, &ccy, &base, Some(&rates));
        updates.push((id, converted));
    }
    for (id, converted) in updates {
        conn.execute(
            "UPDATE expenses SET amount_in_base=?1 WHERE id=?2",
            params![converted.to_string(), id],
        )?;
    }
    Ok(())
}

// ---- snapshot ----

/// Read a trip with its members, expenses and rates in one transaction.
pub fn load_trip(conn: &Connection, trip_id: i64) -> Result<Trip> {
    let tx = conn.unchecked_transaction()?;
    let (name, currency, start_date, end_date, created_at, updated_at) = tx
        .query_row(
            "SELECT name, currency, start_date, end_date, created_at, updated_at FROM trips WHERE id=?1",
            params![trip_id],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, Option<NaiveDate>>(2)?,
                    r.get::<_, Option<NaiveDate>>(3)?,
                    r.get::<_, String>(4)?,
                    r.get::<_, String>(5)?,
                ))
            },
        )
        .with_context(|| format!("Trip {} not found", trip_id))?;
    let trip = Trip {
        id: trip_id,
        name,
        currency,
        start_date,
        end_date,
        custom_rates: trip_rates(&tx, trip_id)?,
        members: list_members(&tx, trip_id)?,
        expenses: list_expenses(&tx, trip_id)?,
        created_at,
        updated_at,
    };
    tx.commit()?;
    Ok(trip)
}
