//! Payment schedule generation.
//!
//! Every schedule offers two options for the same contract total:
//! - an installment plan, either the fixed percentage split or an
//!   installment-count-aware split with optional explicit amounts
//! - a single early payment with a flat discount
//!
//! The last installment always absorbs the rounding remainder, so kept
//! installments never drift from the total by a cent.

mod request;

pub use request::{ScheduleRequest, DEFAULT_INSTALLMENT_COUNT, MAX_INSTALLMENT_COUNT};

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, warn};

use crate::contract::rules::amounts::{format_euro, parse_italian_amount};
use crate::dates::{add_months, normalize_date_or, today};
use crate::error::{Result, ScheduleError};
use crate::models::config::ScheduleConfig;
use crate::models::schedule::{
    DiscountedPayment, EntryKind, InstallmentPlan, PaymentScheduleResult, PaymentType,
    ScheduledPayment,
};

/// Round a currency amount to cents, halves away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Payment schedule generator.
#[derive(Debug, Clone)]
pub struct PaymentScheduleGenerator {
    fixed_percentages: Vec<Decimal>,
    discount_percentage: Decimal,
    recommendation_threshold: Decimal,
    cadence_months: u32,
    /// Date substituted for unparseable dates; today when unset.
    reference_date: Option<NaiveDate>,
}

impl PaymentScheduleGenerator {
    /// Create a generator with the default 40/30/30 split, 3% discount and
    /// 4-month cadence.
    pub fn new() -> Self {
        Self::from_config(&ScheduleConfig::default())
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self {
            fixed_percentages: config.fixed_percentages.clone(),
            discount_percentage: config.discount_percentage,
            recommendation_threshold: config.recommendation_threshold,
            cadence_months: config.cadence_months,
            reference_date: None,
        }
    }

    /// Use a fixed date instead of today as the fallback for bad dates.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Fixed percentage split (40/30/30 by default).
    ///
    /// `explicit_dates` maps 1-based installment numbers to due dates as
    /// written in the contract.
    pub fn generate_fixed(
        &self,
        total_amount: Decimal,
        start_date: &str,
        explicit_dates: &BTreeMap<u32, String>,
    ) -> Result<PaymentScheduleResult> {
        validate_total(total_amount)?;
        validate_count(self.fixed_percentages.len() as u32)?;

        info!(
            total = %total_amount,
            installments = self.fixed_percentages.len(),
            "Generating fixed payment schedule"
        );

        let start = self.normalize(start_date);
        let last = self.fixed_percentages.len() - 1;
        let mut cumulative = Decimal::ZERO;
        let mut installments = Vec::with_capacity(self.fixed_percentages.len());

        for (index, percentage) in self.fixed_percentages.iter().enumerate() {
            let amount = if index == last {
                total_amount - cumulative
            } else {
                let amount = total_amount
                    .checked_mul(*percentage)
                    .map(|share| round_cents(share / Decimal::ONE_HUNDRED))
                    .ok_or(ScheduleError::AmountOverflow(total_amount))?;
                cumulative = cumulative
                    .checked_add(amount)
                    .ok_or(ScheduleError::AmountOverflow(total_amount))?;
                amount
            };

            let number = index as u32 + 1;
            installments.push(ScheduledPayment {
                installment_number: number,
                amount,
                percentage: *percentage,
                due_date: self.due_date(start, index as u32, explicit_dates.get(&number)),
                description: installment_label(number, *percentage),
                payment_type: EntryKind::Installment,
            });
        }

        let shares: Vec<String> = self
            .fixed_percentages
            .iter()
            .map(|p| format!("{}%", p.normalize()))
            .collect();

        let installment_plan = InstallmentPlan {
            total_amount,
            description: format!(
                "Pagamento rateale in {} rate: {} del totale",
                installments.len(),
                shares.join(", ")
            ),
            installments,
        };

        self.finish(total_amount, start, installment_plan)
    }

    /// Installment-count-aware split.
    ///
    /// Installments without an explicit amount get an equal share of the
    /// total; the last one gets whatever the kept installments before it
    /// leave over. Installments whose amount is not positive are dropped and
    /// the remaining ones keep their original numbers.
    pub fn generate(&self, request: &ScheduleRequest) -> Result<PaymentScheduleResult> {
        let total_amount = request.total_amount;
        validate_total(total_amount)?;
        let count = request.installment_count;
        validate_count(count)?;

        info!(total = %total_amount, installments = count, "Generating payment schedule");

        let start = self.normalize(&request.start_date);
        let equal_share = round_cents(total_amount / Decimal::from(count));
        let mut cumulative = Decimal::ZERO;
        let mut installments = Vec::with_capacity(count as usize);

        for number in 1..=count {
            let amount = match request.explicit_amounts.get(&number) {
                Some(raw) => {
                    let parsed = parse_italian_amount(raw);
                    if parsed.is_none() {
                        warn!(installment = number, amount = %raw, "unparseable installment amount");
                    }
                    parsed
                }
                None if number == count => Some(total_amount - cumulative),
                None => Some(equal_share),
            };

            let Some(amount) = amount.filter(|a| *a > Decimal::ZERO) else {
                debug!(installment = number, "dropping installment without a positive amount");
                continue;
            };
            cumulative = cumulative
                .checked_add(amount)
                .ok_or(ScheduleError::AmountOverflow(amount))?;

            let percentage = amount
                .checked_div(total_amount)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .map(round_cents)
                .ok_or(ScheduleError::AmountOverflow(amount))?;
            installments.push(ScheduledPayment {
                installment_number: number,
                amount,
                percentage,
                due_date: self.due_date(start, number - 1, request.explicit_dates.get(&number)),
                description: installment_label(number, percentage),
                payment_type: EntryKind::Installment,
            });
        }

        let description = if count == 1 {
            "Pagamento rateale in 1 rata".to_string()
        } else {
            format!("Pagamento rateale in {} rate", count)
        };

        let installment_plan = InstallmentPlan {
            total_amount,
            installments,
            description,
        };

        self.finish(total_amount, start, installment_plan)
    }

    /// Single early payment with the configured discount.
    pub fn single_payment(
        &self,
        total_amount: Decimal,
        start: NaiveDate,
    ) -> Result<DiscountedPayment> {
        let pct = self.discount_percentage;
        let discount_amount = total_amount
            .checked_mul(pct)
            .map(|discount| round_cents(discount / Decimal::ONE_HUNDRED))
            .ok_or(ScheduleError::AmountOverflow(total_amount))?;
        let final_amount = total_amount - discount_amount;

        Ok(DiscountedPayment {
            total_amount: final_amount,
            discount_percentage: pct,
            discount_amount,
            due_date: start,
            installments: vec![ScheduledPayment {
                installment_number: 1,
                amount: final_amount,
                percentage: Decimal::ONE_HUNDRED,
                due_date: start,
                description: format!("Pagamento unico con sconto {}%", pct.normalize()),
                payment_type: EntryKind::SingleWithDiscount,
            }],
            description: format!(
                "Pagamento unico anticipato con sconto del {}% (risparmio di {})",
                pct.normalize(),
                format_euro(discount_amount)
            ),
        })
    }

    /// Installments for totals strictly above the threshold.
    pub fn recommend(&self, total_amount: Decimal) -> PaymentType {
        if total_amount > self.recommendation_threshold {
            PaymentType::Installments
        } else {
            PaymentType::SingleWithDiscount
        }
    }

    fn finish(
        &self,
        total_amount: Decimal,
        start: NaiveDate,
        installment_plan: InstallmentPlan,
    ) -> Result<PaymentScheduleResult> {
        Ok(PaymentScheduleResult {
            installment_plan,
            single_payment: self.single_payment(total_amount, start)?,
            recommended_option: self.recommend(total_amount),
        })
    }

    fn due_date(&self, start: NaiveDate, index: u32, explicit: Option<&String>) -> NaiveDate {
        if let Some(raw) = explicit {
            return self.normalize(raw);
        }

        index
            .checked_mul(self.cadence_months)
            .and_then(|months| add_months(start, months))
            .unwrap_or(start)
    }

    fn normalize(&self, raw: &str) -> NaiveDate {
        normalize_date_or(raw, self.reference_date.unwrap_or_else(today))
    }
}

impl Default for PaymentScheduleGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_total(total_amount: Decimal) -> Result<()> {
    if total_amount <= Decimal::ZERO {
        return Err(ScheduleError::InvalidAmount(total_amount).into());
    }
    Ok(())
}

fn validate_count(count: u32) -> Result<()> {
    if !(1..=MAX_INSTALLMENT_COUNT).contains(&count) {
        return Err(ScheduleError::InvalidInstallmentCount(count).into());
    }
    Ok(())
}

fn installment_label(number: u32, percentage: Decimal) -> String {
    format!("{}° rata ({}%)", number, percentage.normalize())
}
