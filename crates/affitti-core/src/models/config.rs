//! Configuration structures for extraction and schedule generation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main configuration for the affitti pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffittiConfig {
    /// Contract field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Remote extraction service configuration.
    pub delegate: DelegateConfig,

    /// Payment schedule configuration.
    pub schedule: ScheduleConfig,
}

/// Which extraction strategy to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Fixed regex patterns tuned to one contract template.
    #[default]
    Pattern,
    /// Remote language-model service.
    Delegate,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Pattern => "pattern",
            StrategyKind::Delegate => "delegate",
        }
    }
}

/// Contract field extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Extraction strategy.
    pub strategy: StrategyKind,

    /// Reject fiscal codes with a wrong check character.
    pub validate_fiscal_code: bool,

    /// Normalize contract start/end dates to ISO in the pattern strategy.
    pub normalize_period_dates: bool,

    /// Clean whitespace in the input text before extraction.
    pub clean_input: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Pattern,
            validate_fiscal_code: false,
            normalize_period_dates: true,
            clean_input: true,
        }
    }
}

/// Remote extraction service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegateConfig {
    /// Chat completions endpoint.
    pub endpoint: String,

    /// Model name sent with each request.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Installment slots requested from the service.
    pub max_installments: u32,
}

impl Default for DelegateConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            max_installments: 10,
        }
    }
}

/// Payment schedule configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Percentages of the fixed installment split; the last takes the remainder.
    pub fixed_percentages: Vec<Decimal>,

    /// Discount for the single early payment, in percent.
    pub discount_percentage: Decimal,

    /// Totals strictly above this recommend installments.
    pub recommendation_threshold: Decimal,

    /// Months between consecutive installment due dates.
    pub cadence_months: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            fixed_percentages: vec![Decimal::from(40), Decimal::from(30), Decimal::from(30)],
            discount_percentage: Decimal::from(3),
            recommendation_threshold: Decimal::from(5000),
            cadence_months: 4,
        }
    }
}

impl AffittiConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
