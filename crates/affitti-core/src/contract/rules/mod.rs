//! Rule-based field extractors for Italian rental contracts.

pub mod amounts;
pub mod fiscal_code;
pub mod installments;
pub mod patterns;

pub use amounts::{format_euro, format_italian_amount, parse_italian_amount};
pub use fiscal_code::{extract_fiscal_code, validate_fiscal_code, FiscalCodeExtractor};
pub use installments::{InstallmentExtractor, InstallmentHint};
pub use patterns::*;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// An extracted value with the source text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
