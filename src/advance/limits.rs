use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{AppError, AppResult};
use crate::model::{
    advance::PaymentMethod, company::Company, company::PayFrequency, employee::Employee,
};

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (y, m) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

fn next_month(date: NaiveDate) -> (i32, u32) {
    if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    }
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn validate_amount(requested: Decimal, company: &Company) -> AppResult<()> {
    if requested <= Decimal::ZERO {
        return Err(AppError::validation("Requested amount must be greater than zero"));
    }
    if requested.scale() > 2 && requested != round_money(requested) {
        return Err(AppError::validation(
            "Requested amount cannot have more than two decimals",
        ));
    }
    if requested < company.min_request_amount {
        return Err(AppError::Validation(format!(
            "Requested amount must be at least {}",
            company.min_request_amount
        )));
    }
    Ok(())
}

/// Inclusive day-of-month window; a start after the end wraps past month end
/// (e.g. 25..5). Days past the end of a short month mean its last day.
pub fn within_request_window(start_day: u8, end_day: u8, today: NaiveDate) -> bool {
    let last = last_day_of_month(today.year(), today.month()).day() as u8;
    let wraps = start_day > end_day;
    let (start_day, end_day) = (start_day.min(last), end_day.min(last));
    let day = today.day() as u8;
    if wraps {
        day >= start_day || day <= end_day
    } else {
        (start_day..=end_day).contains(&day)
    }
}

pub fn check_request_window(company: &Company, today: NaiveDate) -> AppResult<()> {
    if within_request_window(company.request_start_day, company.request_end_day, today) {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Advances can only be requested between day {} and day {} of the month",
            company.request_start_day, company.request_end_day
        )))
    }
}

pub fn check_destination(employee: &Employee, method: PaymentMethod) -> AppResult<()> {
    let configured = match method {
        PaymentMethod::BankAccount => {
            employee.bank_id.is_some()
                && employee
                    .bank_account_number
                    .as_deref()
                    .is_some_and(|n| !n.trim().is_empty())
        }
        PaymentMethod::CryptoWallet => employee
            .wallet_address
            .as_deref()
            .is_some_and(|w| !w.trim().is_empty()),
    };

    if configured {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "No destination configured for payment method {}",
            method
        )))
    }
}

pub fn check_ceiling(requested: Decimal, outstanding: Decimal, ceiling: Decimal) -> AppResult<()> {
    if requested + outstanding > ceiling {
        let available = (ceiling - outstanding).max(Decimal::ZERO);
        return Err(AppError::Validation(format!(
            "Requested amount exceeds the available limit of {}",
            round_money(available)
        )));
    }
    Ok(())
}

/// Next payday strictly after `today`.
pub fn payroll_payment_date(freq: PayFrequency, today: NaiveDate) -> NaiveDate {
    let month_end = last_day_of_month(today.year(), today.month());
    match freq {
        PayFrequency::Monthly => {
            if today < month_end {
                month_end
            } else {
                let (y, m) = next_month(today);
                last_day_of_month(y, m)
            }
        }
        PayFrequency::Biweekly => {
            if today.day() < 15 {
                today.with_day(15).unwrap_or(month_end)
            } else if today < month_end {
                month_end
            } else {
                let (y, m) = next_month(today);
                NaiveDate::from_ymd_opt(y, m, 15).unwrap_or(month_end)
            }
        }
    }
}

/// Premiums are paid on June 30 and December 20; this is the first of those
/// strictly after `today`.
pub fn premium_payment_date(today: NaiveDate) -> NaiveDate {
    let year = today.year();
    [(year, 6, 30), (year, 12, 20), (year + 1, 6, 30)]
        .into_iter()
        .filter_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        .find(|payday| *payday > today)
        .unwrap_or(today)
}

pub fn payment_term(today: NaiveDate, payment_date: NaiveDate) -> u16 {
    (payment_date - today).num_days().clamp(0, u16::MAX as i64) as u16
}

/// Salary available for one payday.
pub fn payroll_ceiling(salary: Decimal, freq: PayFrequency, max_percentage: Decimal) -> Decimal {
    let per_payday = match freq {
        PayFrequency::Monthly => salary,
        PayFrequency::Biweekly => salary / Decimal::TWO,
    };
    round_money(per_payday * max_percentage / Decimal::ONE_HUNDRED)
}

/// First day of the semester that `payday` settles: January 1 for the June
/// payday, July 1 for the December one.
fn semester_start(payday: NaiveDate) -> NaiveDate {
    let first_month = if payday.month() <= 6 { 1 } else { 7 };
    NaiveDate::from_ymd_opt(payday.year(), first_month, 1).unwrap_or(payday)
}

/// Days worked up to `today` in the semester settled on `payday`, on a
/// 30-day-month calendar. Zero while that semester has not started yet.
pub fn semester_days(today: NaiveDate, payday: NaiveDate) -> u32 {
    let start = semester_start(payday);
    if today < start {
        return 0;
    }
    (today.month() - start.month()) * 30 + today.day().min(30)
}

/// Premium earned towards `payday` so far: salary × days / 360.
pub fn premium_accrued(salary: Decimal, today: NaiveDate, payday: NaiveDate) -> Decimal {
    round_money(salary * Decimal::from(semester_days(today, payday)) / Decimal::from(360))
}

pub fn premium_ceiling(
    salary: Decimal,
    today: NaiveDate,
    payday: NaiveDate,
    max_percentage: Decimal,
) -> Decimal {
    round_money(premium_accrued(salary, today, payday) * max_percentage / Decimal::ONE_HUNDRED)
}

/// Validates the company-level settings an administrator submits.
pub fn validate_company_settings(
    max_salary_percentage: Decimal,
    min_request_amount: Decimal,
    request_start_day: u8,
    request_end_day: u8,
) -> AppResult<()> {
    if max_salary_percentage <= Decimal::ZERO || max_salary_percentage > Decimal::ONE_HUNDRED {
        return Err(AppError::validation(
            "max_salary_percentage must be between 0 and 100",
        ));
    }
    if min_request_amount < Decimal::ZERO {
        return Err(AppError::validation("min_request_amount cannot be negative"));
    }
    for day in [request_start_day, request_end_day] {
        if !(1..=31).contains(&day) {
            return Err(AppError::validation("request days must be between 1 and 31"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::model::employee::EmployeeStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn company() -> Company {
        Company {
            id: 1,
            name: "Acme".into(),
            nit: "900123456-7".into(),
            max_salary_percentage: Decimal::from(50),
            min_request_amount: Decimal::from(50_000),
            request_start_day: 1,
            request_end_day: 25,
            pay_frequency: PayFrequency::Monthly,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn employee() -> Employee {
        Employee {
            id: 1,
            company_id: 1,
            document_number: "1020304050".into(),
            first_name: "Ana".into(),
            last_name: "Rios".into(),
            email: "ana@acme.co".into(),
            phone: None,
            salary: Decimal::from(3_000_000),
            bank_id: Some(1),
            bank_account_number: Some("12345".into()),
            wallet_address: None,
            status: EmployeeStatus::Active,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn amount_bounds() {
        let c = company();
        assert!(validate_amount(Decimal::ZERO, &c).is_err());
        assert!(validate_amount(Decimal::from(-5), &c).is_err());
        assert!(validate_amount(Decimal::from(49_999), &c).is_err());
        assert!(validate_amount(Decimal::new(100_000_001, 3), &c).is_err());
        assert!(validate_amount(Decimal::from(100_000), &c).is_ok());
    }

    #[test]
    fn request_window_plain_and_wrapping() {
        assert!(within_request_window(1, 25, date(2026, 3, 25)));
        assert!(!within_request_window(1, 25, date(2026, 3, 26)));
        assert!(within_request_window(25, 5, date(2026, 3, 28)));
        assert!(within_request_window(25, 5, date(2026, 3, 3)));
        assert!(!within_request_window(25, 5, date(2026, 3, 10)));
    }

    #[test]
    fn request_window_clamps_to_short_months() {
        assert!(within_request_window(29, 31, date(2026, 2, 28)));
        assert!(!within_request_window(29, 31, date(2026, 2, 27)));
        assert!(within_request_window(29, 31, date(2028, 2, 29)));
        assert!(within_request_window(31, 31, date(2026, 4, 30)));
        assert!(within_request_window(30, 5, date(2026, 2, 28)));
        assert!(within_request_window(30, 5, date(2026, 3, 2)));
        // 31..30 wraps over nearly the whole month, even in April
        assert!(within_request_window(31, 30, date(2026, 4, 12)));
    }

    #[test]
    fn monthly_payday_is_month_end() {
        assert_eq!(
            payroll_payment_date(PayFrequency::Monthly, date(2026, 2, 10)),
            date(2026, 2, 28)
        );
        assert_eq!(
            payroll_payment_date(PayFrequency::Monthly, date(2026, 12, 31)),
            date(2027, 1, 31)
        );
    }

    #[test]
    fn biweekly_payday() {
        let f = PayFrequency::Biweekly;
        assert_eq!(payroll_payment_date(f, date(2026, 4, 3)), date(2026, 4, 15));
        assert_eq!(payroll_payment_date(f, date(2026, 4, 15)), date(2026, 4, 30));
        assert_eq!(payroll_payment_date(f, date(2026, 4, 30)), date(2026, 5, 15));
    }

    #[test]
    fn premium_paydays() {
        assert_eq!(premium_payment_date(date(2026, 2, 1)), date(2026, 6, 30));
        assert_eq!(premium_payment_date(date(2026, 9, 1)), date(2026, 12, 20));
        assert_eq!(premium_payment_date(date(2026, 6, 30)), date(2026, 12, 20));
        assert_eq!(premium_payment_date(date(2026, 12, 24)), date(2027, 6, 30));
        assert_eq!(payment_term(date(2026, 6, 1), date(2026, 6, 30)), 29);
    }

    #[test]
    fn premium_accrual_uses_360_day_year() {
        let june = date(2026, 6, 30);
        // March 31 counts as 30: 2 * 30 + 30 = 90 days
        assert_eq!(semester_days(date(2026, 3, 31), june), 90);
        assert_eq!(semester_days(date(2026, 7, 1), date(2026, 12, 20)), 1);
        assert_eq!(
            premium_accrued(Decimal::from(3_600_000), date(2026, 3, 31), june),
            Decimal::from(900_000)
        );
    }

    #[test]
    fn premium_accrual_follows_the_payday_semester() {
        let salary = Decimal::from(3_000_000);
        let pct = Decimal::from(50);

        let today = date(2026, 12, 15);
        let payday = premium_payment_date(today);
        assert_eq!(payday, date(2026, 12, 20));
        assert_eq!(semester_days(today, payday), 165);
        assert_eq!(premium_ceiling(salary, today, payday, pct), Decimal::from(687_500));

        // After the December payday the next one is in June, whose semester
        // has not begun.
        let today = date(2026, 12, 24);
        let payday = premium_payment_date(today);
        assert_eq!(payday, date(2027, 6, 30));
        assert_eq!(semester_days(today, payday), 0);
        assert_eq!(premium_ceiling(salary, today, payday, pct), Decimal::ZERO);

        let today = date(2026, 6, 30);
        let payday = premium_payment_date(today);
        assert_eq!(payday, date(2026, 12, 20));
        assert_eq!(semester_days(today, payday), 0);
        assert_eq!(premium_ceiling(salary, today, payday, pct), Decimal::ZERO);

        let today = date(2027, 1, 10);
        assert_eq!(semester_days(today, premium_payment_date(today)), 10);
    }

    #[test]
    fn ceilings() {
        let salary = Decimal::from(3_000_000);
        assert_eq!(
            payroll_ceiling(salary, PayFrequency::Monthly, Decimal::from(50)),
            Decimal::from(1_500_000)
        );
        assert_eq!(
            payroll_ceiling(salary, PayFrequency::Biweekly, Decimal::from(50)),
            Decimal::from(750_000)
        );

        let ceiling = Decimal::from(1_500_000);
        assert!(check_ceiling(Decimal::from(500_000), Decimal::from(1_000_000), ceiling).is_ok());
        assert!(check_ceiling(Decimal::from(500_001), Decimal::from(1_000_000), ceiling).is_err());
    }

    #[test]
    fn destination_must_exist() {
        let e = employee();
        assert!(check_destination(&e, PaymentMethod::BankAccount).is_ok());
        assert!(check_destination(&e, PaymentMethod::CryptoWallet).is_err());

        let blank = Employee {
            bank_account_number: Some("  ".into()),
            ..employee()
        };
        assert!(check_destination(&blank, PaymentMethod::BankAccount).is_err());
    }

    #[test]
    fn company_settings_ranges() {
        assert!(validate_company_settings(Decimal::from(50), Decimal::ZERO, 1, 31).is_ok());
        assert!(validate_company_settings(Decimal::from(101), Decimal::ZERO, 1, 31).is_err());
        assert!(validate_company_settings(Decimal::from(50), Decimal::ZERO, 0, 31).is_err());
        assert!(validate_company_settings(Decimal::from(50), Decimal::from(-1), 1, 31).is_err());
    }
}
