//! Error types for the affitti-core library.

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the affitti library.
#[derive(Error, Debug)]
pub enum AffittiError {
    /// Contract field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Payment schedule generation error.
    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Remote extraction service error.
    #[error("delegate error: {0}")]
    Delegate(#[from] DelegateError),

    /// Date normalization error.
    #[error("date error: {0}")]
    Date(#[from] DateError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to contract field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The contract text was empty or whitespace only.
    #[error("contract text is empty")]
    EmptyInput,

    /// Failed to parse a value.
    #[error("failed to parse {field}: {value}")]
    Parse { field: String, value: String },
}

/// Errors related to payment schedule generation.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Total amount must be strictly positive.
    #[error("total amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    /// Installment count outside `1..=MAX_INSTALLMENT_COUNT`.
    #[error(
        "installment count must be between 1 and {max}, got {0}",
        max = crate::schedule::MAX_INSTALLMENT_COUNT
    )]
    InvalidInstallmentCount(u32),

    /// An amount too large for exact cent arithmetic.
    #[error("amount {0} is too large to schedule")]
    AmountOverflow(Decimal),
}

/// Errors raised by the remote extraction service.
#[derive(Error, Debug)]
pub enum DelegateError {
    /// No API key or endpoint available.
    #[error("delegate extraction is not configured: {0}")]
    NotConfigured(String),

    /// Transport-level failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    /// The completion carried no message content.
    #[error("service returned an empty completion")]
    EmptyResponse,

    /// The content parsed as JSON but is not a flat object.
    #[error("malformed structured response: {0}")]
    MalformedResponse(String),

    /// The content is not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors related to date normalization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// Input matches none of the supported shapes.
    #[error("unrecognized date format: {0}")]
    Unrecognized(String),

    /// Input has a supported shape but is not a calendar date.
    #[error("invalid calendar date: {0}")]
    Invalid(String),
}

/// Result type for the affitti library.
pub type Result<T> = std::result::Result<T, AffittiError>;
