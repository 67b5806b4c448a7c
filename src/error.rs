// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Rejections raised where user data enters the store. The settlement engine
/// itself never fails; it relies on these checks having been made.
#[derive(Debug, Error, PartialEq)]
pub enum EntryError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("amount {0} is larger than {}", crate::store::MAX_AMOUNT)]
    AmountTooLarge(Decimal),
    #[error("an expense needs at least one participant")]
    NoParticipants,
    #[error("payer {0} is not a member of this trip")]
    UnknownPayer(i64),
    #[error("participant {0} is not a member of this trip")]
    UnknownParticipant(i64),
    #[error("share for member {0} is negative")]
    NegativeShare(i64),
    #[error("custom shares add up to {actual}, expected {expected}")]
    SplitMismatch { expected: Decimal, actual: Decimal },
    #[error("invalid currency code '{0}', expected three letters like EUR")]
    InvalidCurrency(String),
    #[error("exchange rate for {0} must be positive")]
    InvalidRate(String),
    #[error("exchange rate for {0} is larger than {}", crate::store::MAX_RATE)]
    RateTooLarge(String),
    #[error("{0} is the trip's base currency and always converts 1:1")]
    BaseCurrencyRate(String),
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
    #[error("unknown split type '{0}', expected equal or custom")]
    UnknownSplitType(String),
}
