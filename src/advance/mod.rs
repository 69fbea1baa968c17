//! Payroll and premium salary advances: request validation, fee totals,
//! status transitions and the database workflow tying them together.

pub mod fees;
pub mod limits;
pub mod service;
pub mod status;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::model::{company::Company, employee::Employee};

/// Which advance family a request targets. Both share the same row layout and
/// lifecycle but live in separate tables and use different ceilings and
/// payment dates.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AdvanceKind {
    Payroll,
    Premium,
}

impl AdvanceKind {
    pub fn table(self) -> &'static str {
        match self {
            AdvanceKind::Payroll => "payroll_advances",
            AdvanceKind::Premium => "premium_advances",
        }
    }

    pub fn history_table(self) -> &'static str {
        match self {
            AdvanceKind::Payroll => "payroll_advance_history",
            AdvanceKind::Premium => "premium_advance_history",
        }
    }

    pub fn tax_table(self) -> &'static str {
        match self {
            AdvanceKind::Payroll => "payroll_advance_taxes",
            AdvanceKind::Premium => "premium_advance_taxes",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AdvanceKind::Payroll => "Payroll advance",
            AdvanceKind::Premium => "Premium advance",
        }
    }

    pub fn payment_date(self, company: &Company, today: NaiveDate) -> NaiveDate {
        match self {
            AdvanceKind::Payroll => limits::payroll_payment_date(company.pay_frequency, today),
            AdvanceKind::Premium => limits::premium_payment_date(today),
        }
    }

    /// Most the employee may have outstanding for `payment_date`.
    pub fn ceiling(
        self,
        employee: &Employee,
        company: &Company,
        today: NaiveDate,
        payment_date: NaiveDate,
    ) -> Decimal {
        match self {
            AdvanceKind::Payroll => limits::payroll_ceiling(
                employee.salary,
                company.pay_frequency,
                company.max_salary_percentage,
            ),
            AdvanceKind::Premium => limits::premium_ceiling(
                employee.salary,
                today,
                payment_date,
                company.max_salary_percentage,
            ),
        }
    }
}
