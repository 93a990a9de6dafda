//! Italian fiscal code (codice fiscale) extraction and validation.

use super::patterns::FISCAL_CODE;
use super::{ExtractionMatch, FieldExtractor};

/// Fiscal code field extractor.
pub struct FiscalCodeExtractor {
    validate: bool,
}

impl FiscalCodeExtractor {
    /// Create a new fiscal code extractor. Validation is off by default.
    pub fn new() -> Self {
        Self { validate: false }
    }

    /// Set whether to validate the check character.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

impl Default for FiscalCodeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for FiscalCodeExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for caps in FISCAL_CODE.captures_iter(text) {
            let code = caps[1].to_uppercase();

            if self.validate && !validate_fiscal_code(&code) {
                continue;
            }

            if let Some(full_match) = caps.get(0) {
                results.push(
                    ExtractionMatch::new(code, full_match.as_str())
                        .with_position(full_match.start(), full_match.end()),
                );
            }
        }

        results
    }
}

/// Extract the first fiscal code from text without validation.
pub fn extract_fiscal_code(text: &str) -> Option<String> {
    FiscalCodeExtractor::new().extract(text).map(|m| m.value)
}

/// Validate a 16-character fiscal code against its check character.
pub fn validate_fiscal_code(code: &str) -> bool {
    let code = code.to_uppercase();
    let bytes = code.as_bytes();

    if bytes.len() != 16 || !bytes.iter().all(|b| b.is_ascii_alphanumeric()) {
        return false;
    }

    let mut sum = 0u32;
    for (i, &b) in bytes[..15].iter().enumerate() {
        // Positions are counted from 1, so even indices are "odd" positions.
        sum += if i % 2 == 0 { odd_value(b) } else { even_value(b) };
    }

    let expected = b'A' + (sum % 26) as u8;
    bytes[15] == expected
}

fn even_value(b: u8) -> u32 {
    match b {
        b'0'..=b'9' => u32::from(b - b'0'),
        _ => u32::from(b - b'A'),
    }
}

fn odd_value(b: u8) -> u32 {
    const ODD: [u32; 26] = [
        1, 0, 5, 7, 9, 13, 15, 17, 19, 21, 2, 4, 18, 20, 11, 3, 6, 8, 12, 14, 16, 10, 22, 25,
        24, 23,
    ];

    match b {
        b'0'..=b'9' => ODD[usize::from(b - b'0')],
        _ => ODD[usize::from(b - b'A')],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_fiscal_code() {
        assert!(validate_fiscal_code("RSSMRA85T10A562S"));
        assert!(validate_fiscal_code("VRDGPP80A01H501U"));
        assert!(validate_fiscal_code("bnclra99a41h501o"));
    }

    #[test]
    fn test_invalid_fiscal_code() {
        assert!(!validate_fiscal_code("RSSMRA85T10A562X"));
        assert!(!validate_fiscal_code("RSSMRA85T10A562"));
        assert!(!validate_fiscal_code("RSSMRA85T10A56-S"));
    }

    #[test]
    fn test_extract_with_validation() {
        let text = "C.F. RSSMRA85T10A562X, poi C.F. VRDGPP80A01H501U";

        let lenient = FiscalCodeExtractor::new().extract(text).unwrap();
        assert_eq!(lenient.value, "RSSMRA85T10A562X");

        let strict = FiscalCodeExtractor::new()
            .with_validation(true)
            .extract(text)
            .unwrap();
        assert_eq!(strict.value, "VRDGPP80A01H501U");
    }

    #[test]
    fn test_extract_fiscal_code_uppercases() {
        assert_eq!(
            extract_fiscal_code("c.f. rssmra85t10a562s"),
            Some("RSSMRA85T10A562S".to_string())
        );
    }
}
