// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EntryError;

pub type MemberId = i64;

/// Custom conversion rates of a trip: `rates[X]` is how many units of the trip's
/// base currency equal 1 unit of `X`.
pub type RateTable = BTreeMap<String, Decimal>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub avatar: Option<String>,
    pub color: Option<String>,
}

impl Member {
    pub fn new(id: MemberId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar: None,
            color: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Transport,
    Accommodation,
    Food,
    Entertainment,
    Shopping,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Transport,
        Category::Accommodation,
        Category::Food,
        Category::Entertainment,
        Category::Shopping,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Transport => "transport",
            Category::Accommodation => "accommodation",
            Category::Food => "food",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = EntryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| EntryError::UnknownCategory(s.to_string()))
    }
}

/// How an expense's cost is divided among its participants.
///
/// Custom shares are expressed in the expense's original currency.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "shares", rename_all = "lowercase")]
pub enum Split {
    #[default]
    Equal,
    Custom(BTreeMap<MemberId, Decimal>),
}

impl Split {
    pub fn kind(&self) -> &'static str {
        match self {
            Split::Equal => "equal",
            Split::Custom(_) => "custom",
        }
    }

    pub fn share_of(&self, member: MemberId) -> Option<Decimal> {
        match self {
            Split::Equal => None,
            Split::Custom(shares) => shares.get(&member).copied(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub trip_id: i64,
    pub description: String,
    pub amount: Decimal,
    pub currency: String,
    pub amount_in_base: Decimal,
    pub payer_id: MemberId,
    pub date: NaiveDate,
    pub category: Category,
    pub participants: Vec<MemberId>,
    pub split: Split,
    pub created_at: String,
    pub updated_at: String,
}

/// Snapshot of a trip with everything the settlement engine needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: i64,
    pub name: String,
    pub currency: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub custom_rates: RateTable,
    pub members: Vec<Member>,
    pub expenses: Vec<Expense>,
    pub created_at: String,
    pub updated_at: String,
}

impl Trip {
    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }
}
