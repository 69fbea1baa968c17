use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{MySql, MySqlPool, Transaction};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::advance::PaymentMethod;
use crate::model::debt::{CompanyDebt, CompanyDebtPart};

fn part_table(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::BankAccount => "company_fiat_debts",
        PaymentMethod::CryptoWallet => "company_crypto_debts",
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DebtDetail {
    #[serde(flatten)]
    pub debt: CompanyDebt,
    pub fiat: Option<CompanyDebtPart>,
    pub crypto: Option<CompanyDebtPart>,
}

/// Adds a new advance to the debt of the month its payment falls in and
/// returns that debt's id.
pub async fn add_requested(
    tx: &mut Transaction<'_, MySql>,
    company_id: u64,
    payment_date: NaiveDate,
    method: PaymentMethod,
    amount: Decimal,
) -> AppResult<u64> {
    // LAST_INSERT_ID(id) makes the existing row's id come back on update
    let debt_id = sqlx::query(
        r#"
        INSERT INTO company_debts (company_id, month, year, total_amount)
        VALUES (?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            total_amount = total_amount + VALUES(total_amount),
            id = LAST_INSERT_ID(id)
        "#,
    )
    .bind(company_id)
    .bind(payment_date.month() as u8)
    .bind(payment_date.year() as u16)
    .bind(amount)
    .execute(&mut **tx)
    .await?
    .last_insert_id();

    sqlx::query(&format!(
        r#"
        INSERT INTO {} (company_debt_id, total_amount) VALUES (?, ?)
        ON DUPLICATE KEY UPDATE total_amount = total_amount + VALUES(total_amount)
        "#,
        part_table(method)
    ))
    .bind(debt_id)
    .bind(amount)
    .execute(&mut **tx)
    .await?;

    Ok(debt_id)
}

/// Takes a rejected or cancelled advance back out of its debt.
pub async fn remove_requested(
    tx: &mut Transaction<'_, MySql>,
    debt_id: u64,
    method: PaymentMethod,
    amount: Decimal,
) -> AppResult<()> {
    sqlx::query("UPDATE company_debts SET total_amount = total_amount - ? WHERE id = ?")
        .bind(amount)
        .bind(debt_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(&format!(
        "UPDATE {} SET total_amount = total_amount - ? WHERE company_debt_id = ?",
        part_table(method)
    ))
    .bind(amount)
    .bind(debt_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn add_paid(
    tx: &mut Transaction<'_, MySql>,
    debt_id: u64,
    method: PaymentMethod,
    amount: Decimal,
) -> AppResult<()> {
    sqlx::query("UPDATE company_debts SET paid_amount = paid_amount + ? WHERE id = ?")
        .bind(amount)
        .bind(debt_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(&format!(
        "UPDATE {} SET paid_amount = paid_amount + ? WHERE company_debt_id = ?",
        part_table(method)
    ))
    .bind(amount)
    .bind(debt_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn list_for_company(
    pool: &MySqlPool,
    company_id: u64,
    year: Option<u16>,
) -> AppResult<Vec<CompanyDebt>> {
    let rows = sqlx::query_as::<_, CompanyDebt>(
        r#"
        SELECT id, company_id, month, year, total_amount, paid_amount
        FROM company_debts
        WHERE company_id = ? AND (? IS NULL OR year = ?)
        ORDER BY year DESC, month DESC
        "#,
    )
    .bind(company_id)
    .bind(year)
    .bind(year)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn detail(pool: &MySqlPool, debt_id: u64) -> AppResult<DebtDetail> {
    let debt = sqlx::query_as::<_, CompanyDebt>(
        "SELECT id, company_id, month, year, total_amount, paid_amount FROM company_debts WHERE id = ?",
    )
    .bind(debt_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Debt not found"))?;

    let mut parts = Vec::with_capacity(2);
    for method in [PaymentMethod::BankAccount, PaymentMethod::CryptoWallet] {
        let part = sqlx::query_as::<_, CompanyDebtPart>(&format!(
            "SELECT id, company_debt_id, total_amount, paid_amount FROM {} WHERE company_debt_id = ?",
            part_table(method)
        ))
        .bind(debt_id)
        .fetch_optional(pool)
        .await?;
        parts.push(part);
    }
    let crypto = parts.pop().flatten();
    let fiat = parts.pop().flatten();

    Ok(DebtDetail { debt, fiat, crypto })
}
