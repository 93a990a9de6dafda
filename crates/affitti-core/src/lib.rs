//! Core library for Italian rental contract analysis.
//!
//! This crate provides:
//! - Contract field extraction from plain text, either with template regex
//!   rules or delegated to a remote language-model service
//! - Confidence scoring of extracted records
//! - Payment schedules: installment plans and a discounted single payment
//! - Italian date and amount normalization

pub mod contract;
pub mod dates;
pub mod error;
pub mod models;
pub mod schedule;

pub use contract::{
    ContractExtractor, ContractParser, DelegateContractParser, ExtractionResult, Extractor,
    PatternContractParser,
};
pub use error::{AffittiError, Result};
pub use models::config::{AffittiConfig, StrategyKind};
pub use models::record::{ConfidenceReport, ExtractedRecord, FieldValue};
pub use models::schedule::{
    DiscountedPayment, InstallmentPlan, PaymentOption, PaymentScheduleResult, PaymentType,
    ScheduledPayment,
};
pub use schedule::{PaymentScheduleGenerator, ScheduleRequest};
