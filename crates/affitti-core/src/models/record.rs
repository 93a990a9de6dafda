//! Extracted contract record and confidence report.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize, Serializer};

/// Canonical field names of an extracted contract record.
pub mod fields {
    // Personal information
    pub const GUEST_NAME: &str = "guest_name";
    pub const BIRTH_DATE: &str = "birth_date";
    pub const BIRTH_PLACE: &str = "birth_place";
    pub const FISCAL_CODE: &str = "fiscal_code";
    pub const RESIDENCE_CITY: &str = "residence_city";
    pub const RESIDENCE_ADDRESS: &str = "residence_address";

    // Property and education
    pub const ACCOMMODATION_ADDRESS: &str = "accommodation_address";
    pub const UNIVERSITY: &str = "university";
    pub const ACADEMIC_YEAR: &str = "academic_year";

    // Contract period
    pub const START_DATE: &str = "start_date";
    pub const END_DATE: &str = "end_date";

    // Financial information
    pub const RENT_TOTAL: &str = "rent_total";
    pub const MONTHLY_RENT: &str = "monthly_rent";
    pub const SECURITY_DEPOSIT: &str = "security_deposit";
    pub const NUMBER_OF_INSTALLMENTS: &str = "number_of_installments";

    // Other
    pub const CONTRACT_TYPE: &str = "contract_type";
    pub const PROVIDER: &str = "provider";

    /// Every non-installment canonical field, in document order.
    pub const BASE_FIELDS: &[&str] = &[
        GUEST_NAME,
        BIRTH_DATE,
        BIRTH_PLACE,
        FISCAL_CODE,
        RESIDENCE_CITY,
        RESIDENCE_ADDRESS,
        ACCOMMODATION_ADDRESS,
        UNIVERSITY,
        ACADEMIC_YEAR,
        START_DATE,
        END_DATE,
        RENT_TOTAL,
        MONTHLY_RENT,
        SECURITY_DEPOSIT,
        NUMBER_OF_INSTALLMENTS,
        CONTRACT_TYPE,
        PROVIDER,
    ];

    /// Key of the amount of installment `n` (1-based).
    pub fn installment_amount(n: u32) -> String {
        format!("installment_{}_amount", n)
    }

    /// Key of the due date of installment `n` (1-based).
    pub fn installment_date(n: u32) -> String {
        format!("installment_{}_date", n)
    }
}

/// A single extracted value.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Field not found.
    #[default]
    Null,
    /// Boolean flag.
    Flag(bool),
    /// Text, kept as found in the source.
    Text(String),
    /// Numeric amount or count.
    Number(Decimal),
}

impl FieldValue {
    /// Build a text value, mapping `None` to `Null`.
    pub fn text(value: Option<impl Into<String>>) -> Self {
        value.map_or(Self::Null, |v| Self::Text(v.into()))
    }

    /// Build a numeric value, mapping `None` to `Null`.
    pub fn number(value: Option<Decimal>) -> Self {
        value.map_or(Self::Null, Self::Number)
    }

    /// Whether the value counts as populated for confidence scoring.
    pub fn is_filled(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Text(s) => !s.is_empty(),
            Self::Flag(_) | Self::Number(_) => true,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Flag(b) => serializer.serialize_bool(*b),
            Self::Text(s) => serializer.serialize_str(s),
            // Persisted records carry plain JSON numbers.
            Self::Number(n) => match (n.fract().is_zero(), n.to_i64(), n.to_f64()) {
                (true, Some(i), _) => serializer.serialize_i64(i),
                (_, _, Some(f)) => serializer.serialize_f64(f),
                _ => serializer.serialize_str(&n.to_string()),
            },
        }
    }
}

/// Flat mapping from field name to extracted value.
///
/// Unfound fields are present with [`FieldValue::Null`], never omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl ExtractedRecord {
    /// Create a record holding every canonical field as `null`, with
    /// `installment_slots` amount/date pairs.
    pub fn with_canonical_fields(installment_slots: u32) -> Self {
        let mut record = Self::default();
        for key in fields::BASE_FIELDS {
            record.set(*key, FieldValue::Null);
        }
        for n in 1..=installment_slots {
            record.set(fields::installment_amount(n), FieldValue::Null);
            record.set(fields::installment_date(n), FieldValue::Null);
        }
        record
    }

    /// Add missing canonical keys as `null`, leaving present values untouched.
    pub fn fill_missing(&mut self, installment_slots: u32) {
        for (key, value) in Self::with_canonical_fields(installment_slots).fields {
            self.fields.entry(key).or_insert(value);
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) {
        self.fields.insert(key.into(), value);
    }

    /// Value of a field; `None` when the key is not part of the record.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_text)
    }

    pub fn number(&self, key: &str) -> Option<Decimal> {
        self.get(key).and_then(FieldValue::as_number)
    }

    pub fn is_filled(&self, key: &str) -> bool {
        self.get(key).is_some_and(FieldValue::is_filled)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields holding a populated value.
    pub fn filled_count(&self) -> usize {
        self.fields.values().filter(|v| v.is_filled()).count()
    }
}

/// Per-field and overall extraction confidence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceReport {
    /// Share of scored fields that were populated (0.0 - 1.0).
    pub overall: f32,

    /// 1 when the scored field was populated, else 0.
    pub field_scores: BTreeMap<String, u8>,
}

impl ConfidenceReport {
    /// Build a report from per-field scores; `overall` is their mean.
    pub fn from_scores(field_scores: BTreeMap<String, u8>) -> Self {
        let total = field_scores.len();
        let hits: usize = field_scores.values().map(|s| usize::from(*s)).sum();
        let overall = if total > 0 {
            hits as f32 / total as f32
        } else {
            0.0
        };

        Self {
            overall,
            field_scores,
        }
    }

    /// Round `overall` to two decimal places.
    pub fn rounded(mut self) -> Self {
        self.overall = (self.overall * 100.0).round() / 100.0;
        self
    }

    /// Overall confidence as a percentage.
    pub fn percent(&self) -> f32 {
        self.overall * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn test_canonical_record_is_all_null() {
        let record = ExtractedRecord::with_canonical_fields(3);

        assert_eq!(record.len(), fields::BASE_FIELDS.len() + 6);
        assert_eq!(record.filled_count(), 0);
        assert_eq!(record.get("installment_3_date"), Some(&FieldValue::Null));
        assert_eq!(record.get("installment_4_date"), None);
    }

    #[test]
    fn test_fill_missing_keeps_values() {
        let mut record = ExtractedRecord::default();
        record.set(fields::GUEST_NAME, FieldValue::Text("MARIO ROSSI".into()));
        record.fill_missing(10);

        assert_eq!(record.text(fields::GUEST_NAME), Some("MARIO ROSSI"));
        assert_eq!(record.get("installment_10_amount"), Some(&FieldValue::Null));
        assert_eq!(record.filled_count(), 1);
    }

    #[test]
    fn test_is_filled() {
        assert!(!FieldValue::Null.is_filled());
        assert!(!FieldValue::Text(String::new()).is_filled());
        assert!(FieldValue::Text("x".into()).is_filled());
        assert!(FieldValue::Number(Decimal::ZERO).is_filled());
        assert!(FieldValue::Flag(false).is_filled());
    }

    #[test]
    fn test_serialize_numbers_as_json_numbers() {
        let mut record = ExtractedRecord::default();
        record.set("rent_total", FieldValue::Number(Decimal::from(12360)));
        record.set("monthly_rent", FieldValue::Number(Decimal::from_str("1030.50").unwrap()));
        record.set("provider", FieldValue::Null);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "monthly_rent": 1030.5,
                "provider": null,
                "rent_total": 12360
            })
        );
    }

    #[test]
    fn test_deserialize_mixed_values() {
        let record: ExtractedRecord = serde_json::from_str(
            r#"{"guest_name": "MARIO ROSSI", "rent_total": 12360, "utilities_included": true, "end_date": null}"#,
        )
        .unwrap();

        assert_eq!(record.text("guest_name"), Some("MARIO ROSSI"));
        assert_eq!(record.number("rent_total"), Some(Decimal::from(12360)));
        assert_eq!(record.get("utilities_included"), Some(&FieldValue::Flag(true)));
        assert_eq!(record.get("end_date"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_confidence_from_scores() {
        let scores: BTreeMap<String, u8> = [("a", 1), ("b", 1), ("c", 0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let report = ConfidenceReport::from_scores(scores).rounded();
        assert_eq!(report.overall, 0.67);
    }

    #[test]
    fn test_confidence_empty_is_zero() {
        let report = ConfidenceReport::from_scores(BTreeMap::new());
        assert_eq!(report.overall, 0.0);
    }
}
