//! Schedule inputs, optionally derived from an extracted record.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::contract::rules::parse_italian_amount;
use crate::models::record::{fields, ExtractedRecord, FieldValue};

/// Installment count assumed when the contract does not state one.
pub const DEFAULT_INSTALLMENT_COUNT: u32 = 3;

/// Upper bound on installments in one plan (ten years of monthly payments).
pub const MAX_INSTALLMENT_COUNT: u32 = 120;

/// Inputs of the installment-count-aware schedule.
///
/// Explicit dates and amounts are keyed by 1-based installment number and
/// kept as text; they are parsed during generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub total_amount: Decimal,
    pub start_date: String,
    pub installment_count: u32,
    #[serde(default)]
    pub explicit_dates: BTreeMap<u32, String>,
    #[serde(default)]
    pub explicit_amounts: BTreeMap<u32, String>,
}

impl ScheduleRequest {
    pub fn new(total_amount: Decimal, start_date: impl Into<String>, installment_count: u32) -> Self {
        Self {
            total_amount,
            start_date: start_date.into(),
            installment_count,
            explicit_dates: BTreeMap::new(),
            explicit_amounts: BTreeMap::new(),
        }
    }

    /// Set the due date of installment `number`.
    pub fn with_date(mut self, number: u32, date: impl Into<String>) -> Self {
        self.explicit_dates.insert(number, date.into());
        self
    }

    /// Set the amount of installment `number`.
    pub fn with_amount(mut self, number: u32, amount: impl Into<String>) -> Self {
        self.explicit_amounts.insert(number, amount.into());
        self
    }

    /// Build a request from an extracted record.
    ///
    /// Returns `None` unless both the total rent and the start date are
    /// present. The installment count defaults to three, also when the
    /// record states a count outside `1..=MAX_INSTALLMENT_COUNT`.
    pub fn from_record(record: &ExtractedRecord) -> Option<Self> {
        let total_amount = match record.get(fields::RENT_TOTAL)? {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => parse_italian_amount(s)?,
            _ => return None,
        };
        let start_date = record.text(fields::START_DATE).filter(|s| !s.trim().is_empty())?;

        let installment_count = match record.get(fields::NUMBER_OF_INSTALLMENTS) {
            Some(FieldValue::Number(n)) => n.to_u32(),
            Some(FieldValue::Text(s)) => s.trim().parse::<u32>().ok(),
            _ => None,
        }
        .filter(|count| (1..=MAX_INSTALLMENT_COUNT).contains(count))
        .unwrap_or(DEFAULT_INSTALLMENT_COUNT);

        let mut request = Self::new(total_amount, start_date, installment_count);

        for n in 1..=installment_count {
            match record.get(&fields::installment_date(n)) {
                Some(FieldValue::Text(date)) if !date.trim().is_empty() => {
                    request.explicit_dates.insert(n, date.clone());
                }
                _ => {}
            }

            match record.get(&fields::installment_amount(n)) {
                Some(FieldValue::Number(amount)) => {
                    request.explicit_amounts.insert(n, amount.to_string());
                }
                Some(FieldValue::Text(amount)) if !amount.trim().is_empty() => {
                    request.explicit_amounts.insert(n, amount.clone());
                }
                _ => {}
            }
        }

        Some(request)
    }
}
