//! Ordinal installment extraction ("prima rata", "seconda rata", "terza rata").
//!
//! Only the three ordinals of the contract template are recognized.

use regex::Regex;
use rust_decimal::Decimal;

use super::amounts::parse_italian_amount;
use super::patterns::{FIRST_INSTALLMENT, SECOND_INSTALLMENT, THIRD_INSTALLMENT};
use super::{ExtractionMatch, FieldExtractor};

/// Installment amount and due date as written in the contract.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallmentHint {
    /// 1-based ordinal.
    pub number: u32,
    /// Parsed amount, `None` when the captured text is not a number.
    pub amount: Option<Decimal>,
    /// Due date, verbatim.
    pub date: String,
}

/// Installment extractor.
pub struct InstallmentExtractor;

impl InstallmentExtractor {
    pub fn new() -> Self {
        Self
    }

    fn ordinals() -> [(u32, &'static Regex); 3] {
        [
            (1, &*FIRST_INSTALLMENT),
            (2, &*SECOND_INSTALLMENT),
            (3, &*THIRD_INSTALLMENT),
        ]
    }

    /// Number of ordinals this extractor can recognize.
    pub const SLOTS: u32 = 3;
}

impl Default for InstallmentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for InstallmentExtractor {
    type Output = ExtractionMatch<InstallmentHint>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// Each ordinal is matched independently; missing ordinals are skipped.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for (number, pattern) in Self::ordinals() {
            let Some(caps) = pattern.captures(text) else {
                continue;
            };
            let Some(full_match) = caps.get(0) else {
                continue;
            };

            let hint = InstallmentHint {
                number,
                amount: parse_italian_amount(&caps[1]),
                date: caps[2].to_string(),
            };
            results.push(
                ExtractionMatch::new(hint, full_match.as_str())
                    .with_position(full_match.start(), full_match.end()),
            );
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_all_ordinals() {
        let text = "€4944 prima rata entro il 25 settembre 2025; \
                    €3708 seconda rata entro il 25/01/2026; \
                    €3.708 terza rata entro il 25 aprile 2026";

        let hints: Vec<_> = InstallmentExtractor::new()
            .extract_all(text)
            .into_iter()
            .map(|m| m.value)
            .collect();

        assert_eq!(hints.len(), 3);
        assert_eq!(hints[0].number, 1);
        assert_eq!(hints[0].amount, Some(Decimal::from(4944)));
        assert_eq!(hints[0].date, "25 settembre 2025");
        assert_eq!(hints[1].date, "25/01/2026");
        assert_eq!(hints[2].amount, Some(Decimal::from(3708)));
    }

    #[test]
    fn test_missing_ordinal_is_skipped() {
        let text = "€3708 seconda rata entro il 25 gennaio 2026";

        let hints = InstallmentExtractor::new().extract_all(text);
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].value.number, 2);
    }
}
