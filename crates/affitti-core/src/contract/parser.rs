//! Template contract parser built on fixed regex rules.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::dates::normalize_to_iso;
use crate::error::ExtractionError;
use crate::models::config::{ExtractionConfig, StrategyKind};
use crate::models::record::{fields, ConfidenceReport, ExtractedRecord, FieldValue};

use super::rules::{
    amounts::parse_italian_amount,
    patterns::*,
    FieldExtractor, FiscalCodeExtractor, InstallmentExtractor,
};
use super::text::clean_text;
use super::{ContractExtractor, ExtractionResult};
use crate::error::Result;

/// Contract type of the recognized template.
pub const TEMPLATE_CONTRACT_TYPE: &str = "Contratto di Ospitalità e Alloggio";

/// Provider of the recognized template.
pub const TEMPLATE_PROVIDER: &str = "UNICAMPUSRESIDENCE S.R.L.";

/// Synchronous contract parsing.
pub trait ContractParser {
    /// Parse contract fields from text.
    fn parse(&self, text: &str) -> Result<ExtractionResult>;
}

/// Contract parser tuned to the student-residence hospitality template.
///
/// Each pattern targets disjoint text, so the parser holds no state between
/// patterns or calls.
#[derive(Debug, Clone)]
pub struct PatternContractParser {
    /// Whether to validate fiscal code check characters.
    validate_fiscal_code: bool,
    /// Whether to normalize the contract period dates to ISO.
    normalize_period_dates: bool,
    /// Whether to clean whitespace before matching.
    clean_input: bool,
}

/// Working state of a single parse call.
struct Scan {
    record: ExtractedRecord,
    scores: BTreeMap<String, u8>,
    raw_matches: BTreeMap<String, String>,
}

impl Scan {
    fn new() -> Self {
        Self {
            record: ExtractedRecord::with_canonical_fields(InstallmentExtractor::SLOTS),
            scores: BTreeMap::new(),
            raw_matches: BTreeMap::new(),
        }
    }

    fn matched(&mut self, key: &str, snippet: &str) {
        self.raw_matches.insert(key.to_string(), snippet.to_string());
    }

    fn score(&mut self, key: &str, found: bool) {
        self.scores.insert(key.to_string(), u8::from(found));
    }
}

impl PatternContractParser {
    /// Create a new parser with default settings.
    pub fn new() -> Self {
        Self {
            validate_fiscal_code: false,
            normalize_period_dates: true,
            clean_input: true,
        }
    }

    /// Create a parser from extraction configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new()
            .with_fiscal_code_validation(config.validate_fiscal_code)
            .with_period_normalization(config.normalize_period_dates)
            .with_input_cleaning(config.clean_input)
    }

    /// Set fiscal code validation.
    pub fn with_fiscal_code_validation(mut self, validate: bool) -> Self {
        self.validate_fiscal_code = validate;
        self
    }

    /// Set contract period date normalization.
    pub fn with_period_normalization(mut self, normalize: bool) -> Self {
        self.normalize_period_dates = normalize;
        self
    }

    /// Set input whitespace cleaning.
    pub fn with_input_cleaning(mut self, clean: bool) -> Self {
        self.clean_input = clean;
        self
    }

    fn extract_guest(&self, text: &str, scan: &mut Scan) {
        let guest_name = GUEST_NAME.captures(text).map(|caps| {
            scan.matched("guest_name", &caps[0]);
            caps[1].trim().to_string()
        });
        scan.score(fields::GUEST_NAME, guest_name.is_some());
        scan.record.set(fields::GUEST_NAME, FieldValue::text(guest_name));

        let (birth_place, birth_date) = match BIRTH_INFO.captures(text) {
            Some(caps) => {
                scan.matched("birth_info", &caps[0]);
                (Some(caps[1].trim().to_string()), Some(caps[2].to_string()))
            }
            None => (None, None),
        };
        scan.score(fields::BIRTH_DATE, birth_date.is_some());
        scan.record.set(fields::BIRTH_PLACE, FieldValue::text(birth_place));
        scan.record.set(fields::BIRTH_DATE, FieldValue::text(birth_date));

        let fiscal_code = FiscalCodeExtractor::new()
            .with_validation(self.validate_fiscal_code)
            .extract(text)
            .map(|m| {
                scan.matched("fiscal_code", &m.source);
                m.value
            });
        scan.score(fields::FISCAL_CODE, fiscal_code.is_some());
        scan.record.set(fields::FISCAL_CODE, FieldValue::text(fiscal_code));

        let (city, address) = match RESIDENCE.captures(text) {
            Some(caps) => {
                scan.matched("residence", &caps[0]);
                (Some(caps[1].trim().to_string()), Some(caps[2].trim().to_string()))
            }
            None => (None, None),
        };
        scan.score("residence", address.is_some());
        scan.record.set(fields::RESIDENCE_CITY, FieldValue::text(city));
        scan.record.set(fields::RESIDENCE_ADDRESS, FieldValue::text(address));
    }

    fn extract_amounts(&self, text: &str, scan: &mut Scan) {
        let rent_total = RENT_TOTAL.captures(text).and_then(|caps| {
            scan.matched("rent_total", &caps[0]);
            positive(parse_italian_amount(&caps[1]))
        });
        scan.score(fields::RENT_TOTAL, rent_total.is_some());
        scan.record.set(fields::RENT_TOTAL, FieldValue::number(rent_total));

        let deposit = SECURITY_DEPOSIT.captures(text).and_then(|caps| {
            scan.matched("security_deposit", &caps[0]);
            positive(parse_italian_amount(&caps[1]))
        });
        scan.score(fields::SECURITY_DEPOSIT, deposit.is_some());
        scan.record.set(fields::SECURITY_DEPOSIT, FieldValue::number(deposit));

        let count = INSTALLMENT_COUNT.captures(text).and_then(|caps| {
            scan.matched("installments", &caps[0]);
            positive(caps[1].parse::<u32>().ok().map(Decimal::from))
        });
        scan.record.set(fields::NUMBER_OF_INSTALLMENTS, FieldValue::number(count));

        for m in InstallmentExtractor::new().extract_all(text) {
            let hint = m.value;
            scan.matched(&format!("installment_{}", hint.number), &m.source);
            scan.record.set(
                fields::installment_amount(hint.number),
                FieldValue::number(hint.amount),
            );
            scan.record.set(
                fields::installment_date(hint.number),
                FieldValue::Text(hint.date),
            );
        }
    }

    fn extract_period(&self, text: &str, scan: &mut Scan) {
        let (start, end) = match CONTRACT_PERIOD.captures(text) {
            Some(caps) => {
                scan.matched("period", &caps[0]);
                (
                    self.period_date(&caps[1]),
                    self.period_date(&caps[2]),
                )
            }
            None => (None, None),
        };
        scan.score("dates", start.is_some() && end.is_some());
        scan.record.set(fields::START_DATE, FieldValue::text(start));
        scan.record.set(fields::END_DATE, FieldValue::text(end));
    }

    fn period_date(&self, raw: &str) -> Option<String> {
        if !self.normalize_period_dates {
            return Some(raw.to_string());
        }

        match normalize_to_iso(raw) {
            Ok(iso) => Some(iso),
            Err(e) => {
                debug!(raw, error = %e, "contract period date not normalized");
                None
            }
        }
    }

    fn extract_accommodation(&self, text: &str, scan: &mut Scan) {
        // Residence building form first, then the generic property form.
        let address = if let Some(caps) = ACCOMMODATION_NOMENTUM.captures(text) {
            scan.matched("accommodation", &caps[0]);
            Some(format!("Via Nomentum {}", &caps[1]))
        } else if let Some(caps) = ACCOMMODATION_PROPERTY.captures(text) {
            scan.matched("accommodation", &caps[0]);
            Some(format!("Via {}", caps[1].trim()))
        } else {
            None
        };
        scan.score(fields::ACCOMMODATION_ADDRESS, address.is_some());
        scan.record
            .set(fields::ACCOMMODATION_ADDRESS, FieldValue::text(address));
    }

    fn extract_university(&self, text: &str, scan: &mut Scan) {
        let (university, year) = match UNIVERSITY.captures(text) {
            Some(caps) => {
                scan.matched("university", &caps[0]);
                (Some(caps[1].to_string()), Some(caps[2].to_string()))
            }
            None => (None, None),
        };
        scan.record.set(fields::UNIVERSITY, FieldValue::text(university));
        scan.record.set(fields::ACADEMIC_YEAR, FieldValue::text(year));
    }
}

impl Default for PatternContractParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ContractParser for PatternContractParser {
    fn parse(&self, text: &str) -> Result<ExtractionResult> {
        let start = Instant::now();

        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput.into());
        }

        let text: Cow<'_, str> = if self.clean_input {
            Cow::Owned(clean_text(text))
        } else {
            Cow::Borrowed(text)
        };

        info!("Extracting contract fields from {} characters of text", text.len());

        let mut scan = Scan::new();
        self.extract_guest(&text, &mut scan);
        self.extract_amounts(&text, &mut scan);
        self.extract_period(&text, &mut scan);
        self.extract_accommodation(&text, &mut scan);
        self.extract_university(&text, &mut scan);

        // Template constants are only asserted once the template is recognized.
        if !scan.raw_matches.is_empty() {
            scan.record
                .set(fields::CONTRACT_TYPE, FieldValue::Text(TEMPLATE_CONTRACT_TYPE.into()));
            scan.record
                .set(fields::PROVIDER, FieldValue::Text(TEMPLATE_PROVIDER.into()));
        }

        let confidence = ConfidenceReport::from_scores(scan.scores).rounded();

        info!(
            "Extraction complete. Confidence: {:.1}% ({} patterns matched in {:?})",
            confidence.percent(),
            scan.raw_matches.len(),
            start.elapsed()
        );

        Ok(ExtractionResult {
            record: scan.record,
            confidence,
            raw_matches: scan.raw_matches,
            strategy: StrategyKind::Pattern,
        })
    }
}

impl ContractExtractor for PatternContractParser {
    fn extract(&self, text: &str) -> impl Future<Output = Result<ExtractionResult>> + Send {
        std::future::ready(self.parse(text))
    }
}

/// Zero and negative amounts count as not found.
fn positive(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| v.is_sign_positive() && !v.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    const CONTRACT: &str = r#"
        CONTRATTO DI OSPITALITÀ E ALLOGGIO
        UNICAMPUSRESIDENCE S.R.L. con sede in Roma
        E: Il/La Sig./Sig.ra MARIO ROSSI, nato/a a ROMA il 10/12/1985
        C.F. RSSMRA85T10A562S residente in MILANO, VIA GARIBALDI 12
        iscritto/a alla Università LUISS per l'anno accademico 2025/2026
        Il godimento dell'alloggio sito in Via Nomentum 12 decorre dal 10 ottobre 2025, al 30 giugno 2026.
        La retta di euro 12.360,00 sarà corrisposta in numero 3 rate:
        €4944 prima rata entro il 25 settembre 2025
        €3708 seconda rata entro il 25 gennaio 2026
        €3708 terza rata entro il 25 aprile 2026
        In caso di danni l'ospite subirà la perdita di €250 versati a titolo di deposito.
    "#;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_full_contract() {
        let result = PatternContractParser::new().parse(CONTRACT).unwrap();
        let record = &result.record;

        assert_eq!(record.text(fields::GUEST_NAME), Some("MARIO ROSSI"));
        assert_eq!(record.text(fields::BIRTH_PLACE), Some("ROMA"));
        assert_eq!(record.text(fields::BIRTH_DATE), Some("10/12/1985"));
        assert_eq!(record.text(fields::FISCAL_CODE), Some("RSSMRA85T10A562S"));
        assert_eq!(record.text(fields::RESIDENCE_CITY), Some("MILANO"));
        assert_eq!(record.text(fields::RESIDENCE_ADDRESS), Some("VIA GARIBALDI 12"));
        assert_eq!(record.text(fields::ACCOMMODATION_ADDRESS), Some("Via Nomentum 12"));
        assert_eq!(record.text(fields::UNIVERSITY), Some("LUISS"));
        assert_eq!(record.text(fields::ACADEMIC_YEAR), Some("2025/2026"));
        assert_eq!(record.text(fields::START_DATE), Some("2025-10-10"));
        assert_eq!(record.text(fields::END_DATE), Some("2026-06-30"));
        assert_eq!(record.number(fields::RENT_TOTAL), Some(dec("12360.00")));
        assert_eq!(record.number(fields::SECURITY_DEPOSIT), Some(dec("250")));
        assert_eq!(record.number(fields::NUMBER_OF_INSTALLMENTS), Some(dec("3")));
        assert_eq!(record.number("installment_1_amount"), Some(dec("4944")));
        assert_eq!(record.text("installment_1_date"), Some("25 settembre 2025"));
        assert_eq!(record.text("installment_3_date"), Some("25 aprile 2026"));
        assert_eq!(record.text(fields::CONTRACT_TYPE), Some(TEMPLATE_CONTRACT_TYPE));
        assert_eq!(record.text(fields::PROVIDER), Some(TEMPLATE_PROVIDER));

        assert_eq!(result.confidence.overall, 1.0);
        assert_eq!(result.confidence.field_scores.len(), 8);
        assert_eq!(result.strategy, StrategyKind::Pattern);
    }

    #[test]
    fn test_unrecognized_text_is_all_null() {
        let result = PatternContractParser::new()
            .parse("Lorem ipsum dolor sit amet, consectetur adipiscing elit.")
            .unwrap();

        assert_eq!(result.record.filled_count(), 0);
        assert!(result.record.iter().all(|(_, v)| *v == FieldValue::Null));
        assert_eq!(
            result.record.len(),
            ExtractedRecord::with_canonical_fields(3).len()
        );
        assert_eq!(result.confidence.overall, 0.0);
        assert!(result.confidence.field_scores.values().all(|s| *s == 0));
        assert!(result.raw_matches.is_empty());
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let parser = PatternContractParser::new();
        assert!(parser.parse("").is_err());
        assert!(parser.parse("   \n\t ").is_err());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = PatternContractParser::new();
        let first = parser.parse(CONTRACT).unwrap();
        let second = parser.parse(CONTRACT).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_partial_contract_confidence() {
        let text = "Il/La Sig./Sig.ra ANNA BIANCHI, nato/a a TORINO il 01/02/2003 \
                    C.F. BNCNNA03B41L219X retta di euro 9.000,00";

        let result = PatternContractParser::new().parse(text).unwrap();

        // guest name, birth date, fiscal code and rent out of eight scored fields
        assert_eq!(result.confidence.overall, 0.5);
        assert_eq!(result.confidence.field_scores["dates"], 0);
        assert_eq!(result.confidence.field_scores["rent_total"], 1);
        assert!(!result.confidence.field_scores.contains_key("university"));
    }

    #[test]
    fn test_installments_not_scored() {
        let text = "€4944 prima rata entro il 25 settembre 2025";
        let result = PatternContractParser::new().parse(text).unwrap();

        assert_eq!(result.record.number("installment_1_amount"), Some(dec("4944")));
        assert_eq!(result.record.get("installment_2_amount"), Some(&FieldValue::Null));
        assert_eq!(result.confidence.overall, 0.0);
    }

    #[test]
    fn test_period_dates_verbatim_when_not_normalized() {
        let text = "godimento dal 10 ottobre 2025, al 30 giugno 2026";
        let result = PatternContractParser::new()
            .with_period_normalization(false)
            .parse(text)
            .unwrap();

        assert_eq!(result.record.text(fields::START_DATE), Some("10 ottobre 2025"));
        assert_eq!(result.record.text(fields::END_DATE), Some("30 giugno 2026"));
    }

    #[test]
    fn test_unknown_month_nulls_period() {
        let text = "godimento dal 10 brumaio 2025, al 30 giugno 2026";
        let result = PatternContractParser::new().parse(text).unwrap();

        assert_eq!(result.record.get(fields::START_DATE), Some(&FieldValue::Null));
        assert_eq!(result.record.text(fields::END_DATE), Some("2026-06-30"));
        assert_eq!(result.confidence.field_scores["dates"], 0);
    }

    #[test]
    fn test_zero_rent_is_not_found() {
        let result = PatternContractParser::new()
            .parse("retta di euro 0,00")
            .unwrap();
        assert_eq!(result.record.get(fields::RENT_TOTAL), Some(&FieldValue::Null));
        assert_eq!(result.confidence.field_scores["rent_total"], 0);
    }

    #[test]
    fn test_generic_accommodation_form() {
        let result = PatternContractParser::new()
            .parse("l'immobile in Roma, Via Tiburtina 100")
            .unwrap();
        assert_eq!(
            result.record.text(fields::ACCOMMODATION_ADDRESS),
            Some("Via Tiburtina 100")
        );
    }

    #[test]
    fn test_fiscal_code_validation_rejects_bad_check_character() {
        let text = "C.F. RSSMRA85T10A562X";

        let lenient = PatternContractParser::new().parse(text).unwrap();
        assert_eq!(lenient.record.text(fields::FISCAL_CODE), Some("RSSMRA85T10A562X"));

        let strict = PatternContractParser::new()
            .with_fiscal_code_validation(true)
            .parse(text)
            .unwrap();
        assert_eq!(strict.record.get(fields::FISCAL_CODE), Some(&FieldValue::Null));
    }
}
