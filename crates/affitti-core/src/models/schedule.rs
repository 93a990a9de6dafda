//! Payment schedule data models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of payment plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Split into several installments.
    Installments,
    /// One early payment with a discount.
    SingleWithDiscount,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Installments => "installments",
            PaymentType::SingleWithDiscount => "single_with_discount",
        }
    }
}

/// Tag carried by each scheduled payment entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Installment,
    SingleWithDiscount,
}

/// One scheduled payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    /// 1-based position in the plan. Dropped entries keep their gap.
    pub installment_number: u32,

    /// Amount due.
    pub amount: Decimal,

    /// Share of the contract total, in percent.
    pub percentage: Decimal,

    /// Due date.
    pub due_date: NaiveDate,

    /// Human-readable label (Italian).
    pub description: String,

    /// Entry tag.
    pub payment_type: EntryKind,
}

/// Installment payment plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    /// Contract total the plan splits.
    pub total_amount: Decimal,

    /// Ordered installments.
    pub installments: Vec<ScheduledPayment>,

    /// Human-readable summary (Italian).
    pub description: String,
}

impl InstallmentPlan {
    /// Sum of all scheduled amounts.
    pub fn scheduled_total(&self) -> Decimal {
        self.installments.iter().map(|i| i.amount).sum()
    }
}

/// Single discounted payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountedPayment {
    /// Amount due after the discount.
    pub total_amount: Decimal,

    /// Discount applied, in percent.
    pub discount_percentage: Decimal,

    /// Discount applied, in currency.
    pub discount_amount: Decimal,

    /// Due date (the contract start date).
    pub due_date: NaiveDate,

    /// The single payment entry.
    pub installments: Vec<ScheduledPayment>,

    /// Human-readable summary (Italian).
    pub description: String,
}

/// One of the two plan variants, in the tagged form stored by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentOption {
    Installments(InstallmentPlan),
    SingleWithDiscount(DiscountedPayment),
}

impl PaymentOption {
    pub fn payment_type(&self) -> PaymentType {
        match self {
            PaymentOption::Installments(_) => PaymentType::Installments,
            PaymentOption::SingleWithDiscount(_) => PaymentType::SingleWithDiscount,
        }
    }
}

/// Both plan variants plus the recommended one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentScheduleResult {
    /// Installment split.
    pub installment_plan: InstallmentPlan,

    /// Single discounted payment.
    pub single_payment: DiscountedPayment,

    /// Recommended option.
    pub recommended_option: PaymentType,
}

impl PaymentScheduleResult {
    /// Both options as a tagged list, installments first.
    pub fn options(&self) -> Vec<PaymentOption> {
        vec![
            PaymentOption::Installments(self.installment_plan.clone()),
            PaymentOption::SingleWithDiscount(self.single_payment.clone()),
        ]
    }
}
