use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::advance::fees::FeeRule;
use crate::error::{AppError, AppResult};
use crate::model::advance::PaymentMethod;
use crate::model::tax::{BankFee, CompanyTax, FeeKind, GlobalTax};

#[derive(Debug, Deserialize, ToSchema)]
pub struct FeeReq {
    #[schema(example = "Platform fee")]
    pub name: String,
    pub kind: FeeKind,
    #[schema(example = "2.50", value_type = String)]
    pub value: Decimal,
}

fn validate(req: &FeeReq) -> AppResult<()> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation("name is required"));
    }
    if req.value < Decimal::ZERO {
        return Err(AppError::validation("value cannot be negative"));
    }
    if req.kind == FeeKind::Percentage && req.value > Decimal::ONE_HUNDRED {
        return Err(AppError::validation("a percentage cannot exceed 100"));
    }
    // stored as DECIMAL(18,4)
    if req.value != req.value.round_dp(4) {
        return Err(AppError::validation("value cannot have more than four decimals"));
    }
    Ok(())
}

pub async fn list_global(pool: &MySqlPool) -> AppResult<Vec<GlobalTax>> {
    let rows = sqlx::query_as::<_, GlobalTax>(
        "SELECT id, name, kind, value, is_active FROM global_taxes ORDER BY id",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create_global(pool: &MySqlPool, req: &FeeReq) -> AppResult<GlobalTax> {
    validate(req)?;
    let id = sqlx::query("INSERT INTO global_taxes (name, kind, value) VALUES (?, ?, ?)")
        .bind(req.name.trim())
        .bind(req.kind.as_ref())
        .bind(req.value)
        .execute(pool)
        .await?
        .last_insert_id();
    info!(tax_id = id, "Global tax created");

    sqlx::query_as::<_, GlobalTax>(
        "SELECT id, name, kind, value, is_active FROM global_taxes WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(Into::into)
}

/// Deactivated rather than deleted; existing advances keep their snapshot.
pub async fn deactivate_global(pool: &MySqlPool, id: u64) -> AppResult<()> {
    let result = sqlx::query("UPDATE global_taxes SET is_active = FALSE WHERE id = ? AND is_active")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Active global tax not found"));
    }
    Ok(())
}

pub async fn list_company(pool: &MySqlPool, company_id: u64) -> AppResult<Vec<CompanyTax>> {
    let rows = sqlx::query_as::<_, CompanyTax>(
        "SELECT id, company_id, name, kind, value, is_active FROM company_taxes \
         WHERE company_id = ? ORDER BY id",
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn create_company(pool: &MySqlPool, company_id: u64, req: &FeeReq) -> AppResult<CompanyTax> {
    validate(req)?;
    let id = sqlx::query(
        "INSERT INTO company_taxes (company_id, name, kind, value) VALUES (?, ?, ?, ?)",
    )
    .bind(company_id)
    .bind(req.name.trim())
    .bind(req.kind.as_ref())
    .bind(req.value)
    .execute(pool)
    .await?
    .last_insert_id();
    info!(tax_id = id, company_id, "Company tax created");

    sqlx::query_as::<_, CompanyTax>(
        "SELECT id, company_id, name, kind, value, is_active FROM company_taxes WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(Into::into)
}

pub async fn deactivate_company(pool: &MySqlPool, company_id: u64, id: u64) -> AppResult<()> {
    let result = sqlx::query(
        "UPDATE company_taxes SET is_active = FALSE WHERE id = ? AND company_id = ? AND is_active",
    )
    .bind(id)
    .bind(company_id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Active company tax not found"));
    }
    Ok(())
}

pub async fn bank_fee(pool: &MySqlPool, bank_id: u64) -> AppResult<Option<BankFee>> {
    let fee = sqlx::query_as::<_, BankFee>(
        "SELECT id, bank_id, name, kind, value FROM bank_fees WHERE bank_id = ?",
    )
    .bind(bank_id)
    .fetch_optional(pool)
    .await?;
    Ok(fee)
}

/// One fee per bank; setting it again replaces the previous one.
pub async fn set_bank_fee(pool: &MySqlPool, bank_id: u64, req: &FeeReq) -> AppResult<BankFee> {
    validate(req)?;
    sqlx::query(
        r#"
        INSERT INTO bank_fees (bank_id, name, kind, value) VALUES (?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE name = VALUES(name), kind = VALUES(kind), value = VALUES(value)
        "#,
    )
    .bind(bank_id)
    .bind(req.name.trim())
    .bind(req.kind.as_ref())
    .bind(req.value)
    .execute(pool)
    .await?;

    bank_fee(pool, bank_id)
        .await?
        .ok_or_else(|| AppError::Internal("bank fee missing after upsert".into()))
}

/// Fees charged on an advance created now: active global taxes, active taxes
/// of the company and, for bank transfers, the fee of the destination bank.
pub async fn applicable_rules(
    pool: &MySqlPool,
    company_id: u64,
    method: PaymentMethod,
    bank_id: Option<u64>,
) -> AppResult<Vec<FeeRule>> {
    let mut rules: Vec<FeeRule> = list_global(pool)
        .await?
        .iter()
        .filter(|t| t.is_active)
        .map(FeeRule::from)
        .collect();

    rules.extend(
        list_company(pool, company_id)
            .await?
            .iter()
            .filter(|t| t.is_active)
            .map(FeeRule::from),
    );

    if let (PaymentMethod::BankAccount, Some(bank_id)) = (method, bank_id) {
        if let Some(fee) = bank_fee(pool, bank_id).await? {
            rules.push(FeeRule::from(&fee));
        }
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(kind: FeeKind, value: i64) -> FeeReq {
        FeeReq {
            name: "fee".into(),
            kind,
            value: Decimal::from(value),
        }
    }

    #[test]
    fn fee_values_are_checked() {
        assert!(validate(&req(FeeKind::Flat, 150_000)).is_ok());
        assert!(validate(&req(FeeKind::Percentage, 101)).is_err());
        assert!(validate(&req(FeeKind::Flat, -1)).is_err());
    }

    #[test]
    fn fractional_percentages_keep_four_decimals() {
        let eighth = FeeReq {
            value: Decimal::new(125, 3), // 0.125%
            ..req(FeeKind::Percentage, 0)
        };
        assert!(validate(&eighth).is_ok());

        let too_fine = FeeReq {
            value: Decimal::new(123_456, 5),
            ..req(FeeKind::Percentage, 0)
        };
        assert!(validate(&too_fine).is_err());
    }
}
