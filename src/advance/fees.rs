use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::tax::{BankFee, CompanyTax, FeeKind, GlobalTax};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeRule {
    pub name: String,
    pub kind: FeeKind,
    pub value: Decimal,
}

impl FeeRule {
    pub fn evaluate(&self, requested: Decimal) -> Decimal {
        match self.kind {
            FeeKind::Flat => self.value,
            FeeKind::Percentage => (requested * self.value / Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        }
    }
}

impl From<&GlobalTax> for FeeRule {
    fn from(t: &GlobalTax) -> Self {
        FeeRule {
            name: t.name.clone(),
            kind: t.kind,
            value: t.value,
        }
    }
}

impl From<&CompanyTax> for FeeRule {
    fn from(t: &CompanyTax) -> Self {
        FeeRule {
            name: t.name.clone(),
            kind: t.kind,
            value: t.value,
        }
    }
}

impl From<&BankFee> for FeeRule {
    fn from(f: &BankFee) -> Self {
        FeeRule {
            name: f.name.clone(),
            kind: f.kind,
            value: f.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FeeLine {
    pub name: String,
    pub kind: FeeKind,
    #[schema(value_type = String)]
    pub rate: Decimal,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FeeBreakdown {
    pub lines: Vec<FeeLine>,
    #[schema(value_type = String)]
    pub taxes_total: Decimal,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
}

/// total = requested + every fee evaluated against the requested amount.
pub fn compute_total(requested: Decimal, rules: &[FeeRule]) -> FeeBreakdown {
    let lines: Vec<FeeLine> = rules
        .iter()
        .map(|rule| FeeLine {
            name: rule.name.clone(),
            kind: rule.kind,
            rate: rule.value,
            amount: rule.evaluate(requested),
        })
        .collect();

    let taxes_total: Decimal = lines.iter().map(|l| l.amount).sum();

    FeeBreakdown {
        lines,
        taxes_total,
        total_amount: requested + taxes_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, kind: FeeKind, value: i64, scale: u32) -> FeeRule {
        FeeRule {
            name: name.to_string(),
            kind,
            value: Decimal::new(value, scale),
        }
    }

    #[test]
    fn no_rules_keeps_requested_amount() {
        let b = compute_total(Decimal::from(100_000), &[]);
        assert!(b.lines.is_empty());
        assert_eq!(b.taxes_total, Decimal::ZERO);
        assert_eq!(b.total_amount, Decimal::from(100_000));
    }

    #[test]
    fn flat_and_percentage_fees_add_up() {
        let rules = vec![
            rule("platform", FeeKind::Percentage, 250, 2), // 2.50%
            rule("transfer", FeeKind::Flat, 7500, 0),
        ];
        let b = compute_total(Decimal::from(100_000), &rules);

        assert_eq!(b.lines[0].amount, Decimal::from(2_500));
        assert_eq!(b.lines[1].amount, Decimal::from(7_500));
        assert_eq!(b.taxes_total, Decimal::from(10_000));
        assert_eq!(b.total_amount, Decimal::from(110_000));
    }

    #[test]
    fn total_is_requested_plus_sum_of_lines() {
        let rules = vec![
            rule("a", FeeKind::Percentage, 333, 2),
            rule("b", FeeKind::Percentage, 1, 1),
            rule("c", FeeKind::Flat, 1999, 2),
        ];
        for requested in [1, 999, 123_457, 2_000_000] {
            let requested = Decimal::from(requested);
            let b = compute_total(requested, &rules);
            let sum: Decimal = b.lines.iter().map(|l| l.amount).sum();
            assert_eq!(b.total_amount, requested + sum);
        }
    }

    #[test]
    fn percentage_rounds_half_away_from_zero() {
        // 1% of 0.50 = 0.005 -> 0.01
        let r = rule("x", FeeKind::Percentage, 1, 0);
        assert_eq!(r.evaluate(Decimal::new(50, 2)), Decimal::new(1, 2));
    }
}
