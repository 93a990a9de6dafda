//! Contract field extraction.
//!
//! Two strategies share one output contract:
//! - [`PatternContractParser`] applies fixed regex rules tuned to one template
//! - [`DelegateContractParser`] asks a remote language-model service
//!
//! [`Extractor`] selects between them from configuration.

mod delegate;
mod parser;
pub mod rules;
pub mod text;

pub use delegate::DelegateContractParser;
pub use parser::{ContractParser, PatternContractParser};

use std::collections::BTreeMap;
use std::future::Future;

use serde::Serialize;

use crate::error::Result;
use crate::models::config::{AffittiConfig, StrategyKind};
use crate::models::record::{ConfidenceReport, ExtractedRecord};

/// Result of contract field extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    /// Extracted fields.
    pub record: ExtractedRecord,
    /// Confidence scores.
    pub confidence: ConfidenceReport,
    /// Matched source snippets, or the raw service response.
    pub raw_matches: BTreeMap<String, String>,
    /// Strategy that produced the result.
    pub strategy: StrategyKind,
}

/// Capability shared by all extraction strategies.
pub trait ContractExtractor {
    /// Extract contract fields from plain text.
    fn extract(&self, text: &str) -> impl Future<Output = Result<ExtractionResult>> + Send;
}

/// Extraction strategy selected by configuration.
pub enum Extractor {
    Pattern(PatternContractParser),
    Delegate(DelegateContractParser),
}

impl Extractor {
    /// Build the strategy named in `config.extraction.strategy`.
    pub fn from_config(config: &AffittiConfig) -> Result<Self> {
        match config.extraction.strategy {
            StrategyKind::Pattern => Ok(Self::Pattern(PatternContractParser::from_config(
                &config.extraction,
            ))),
            StrategyKind::Delegate => Ok(Self::Delegate(DelegateContractParser::from_config(
                &config.delegate,
            )?)),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Pattern(_) => StrategyKind::Pattern,
            Self::Delegate(_) => StrategyKind::Delegate,
        }
    }
}

impl ContractExtractor for Extractor {
    async fn extract(&self, text: &str) -> Result<ExtractionResult> {
        match self {
            Self::Pattern(parser) => parser.extract(text).await,
            Self::Delegate(parser) => parser.extract(text).await,
        }
    }
}
