use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::advance::limits::validate_company_settings;
use crate::error::{AppError, AppResult};
use crate::model::company::{Company, PayFrequency};
use crate::utils::db_utils::{SqlValue, WhereClause, bind_query_as, bind_query_scalar};
use crate::utils::pagination::Page;

const COLUMNS: &str = "id, name, nit, max_salary_percentage, min_request_amount, \
    request_start_day, request_end_day, pay_frequency, is_active, created_at";

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCompany {
    #[schema(example = "Acme S.A.S")]
    pub name: String,
    #[schema(example = "900123456-7")]
    pub nit: String,
    #[schema(example = "50.00", value_type = Option<String>)]
    pub max_salary_percentage: Option<Decimal>,
    #[schema(example = "50000.00", value_type = Option<String>)]
    pub min_request_amount: Option<Decimal>,
    #[schema(example = 1)]
    pub request_start_day: Option<u8>,
    #[schema(example = 25)]
    pub request_end_day: Option<u8>,
    pub pay_frequency: Option<PayFrequency>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCompany {
    pub name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub max_salary_percentage: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub min_request_amount: Option<Decimal>,
    pub request_start_day: Option<u8>,
    pub request_end_day: Option<u8>,
    pub pay_frequency: Option<PayFrequency>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct CompanyFilter {
    /// Matches name or NIT
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub async fn create(pool: &MySqlPool, new: &CreateCompany) -> AppResult<Company> {
    let name = new.name.trim();
    let nit = new.nit.trim();
    if name.is_empty() || nit.is_empty() {
        return Err(AppError::validation("name and nit are required"));
    }

    let max_pct = new.max_salary_percentage.unwrap_or(Decimal::from(50));
    let min_amount = new.min_request_amount.unwrap_or(Decimal::ZERO);
    let start_day = new.request_start_day.unwrap_or(1);
    let end_day = new.request_end_day.unwrap_or(31);
    validate_company_settings(max_pct, min_amount, start_day, end_day)?;

    let id = sqlx::query(
        r#"
        INSERT INTO companies
            (name, nit, max_salary_percentage, min_request_amount,
             request_start_day, request_end_day, pay_frequency)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(nit)
    .bind(max_pct)
    .bind(min_amount)
    .bind(start_day)
    .bind(end_day)
    .bind(new.pay_frequency.unwrap_or(PayFrequency::Monthly).as_ref())
    .execute(pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(format!("A company with NIT {nit} already exists")),
        other => other,
    })?
    .last_insert_id();

    info!(company_id = id, "Company created");
    get(pool, id).await
}

pub async fn get(pool: &MySqlPool, id: u64) -> AppResult<Company> {
    sqlx::query_as::<_, Company>(&format!("SELECT {COLUMNS} FROM companies WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Company not found"))
}

pub async fn list(
    pool: &MySqlPool,
    filter: &CompanyFilter,
    page: Page,
) -> AppResult<(Vec<Company>, i64)> {
    let mut w = WhereClause::default();
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        w.and_all(
            "(name LIKE ? OR nit LIKE ?)",
            [SqlValue::String(pattern.clone()), SqlValue::String(pattern)],
        );
    }
    if let Some(active) = filter.is_active {
        w.and("is_active = ?", SqlValue::Bool(active));
    }

    let total = bind_query_scalar(
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM companies{}", w.sql())),
        w.values(),
    )
    .fetch_one(pool)
    .await?;

    let data = bind_query_as(
        sqlx::query_as::<_, Company>(&format!(
            "SELECT {COLUMNS} FROM companies{} ORDER BY name LIMIT ? OFFSET ?",
            w.sql()
        )),
        w.values(),
    )
    .bind(page.per_page)
    .bind(page.offset)
    .fetch_all(pool)
    .await?;

    Ok((data, total))
}

pub async fn update(pool: &MySqlPool, id: u64, changes: &UpdateCompany) -> AppResult<Company> {
    let current = get(pool, id).await?;

    let name = changes.name.as_deref().map(str::trim).unwrap_or(&current.name);
    if name.is_empty() {
        return Err(AppError::validation("name cannot be empty"));
    }
    let max_pct = changes.max_salary_percentage.unwrap_or(current.max_salary_percentage);
    let min_amount = changes.min_request_amount.unwrap_or(current.min_request_amount);
    let start_day = changes.request_start_day.unwrap_or(current.request_start_day);
    let end_day = changes.request_end_day.unwrap_or(current.request_end_day);
    let frequency = changes.pay_frequency.unwrap_or(current.pay_frequency);
    let is_active = changes.is_active.unwrap_or(current.is_active);
    validate_company_settings(max_pct, min_amount, start_day, end_day)?;

    sqlx::query(
        r#"
        UPDATE companies
        SET name = ?, max_salary_percentage = ?, min_request_amount = ?,
            request_start_day = ?, request_end_day = ?, pay_frequency = ?, is_active = ?
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(max_pct)
    .bind(min_amount)
    .bind(start_day)
    .bind(end_day)
    .bind(frequency.as_ref())
    .bind(is_active)
    .bind(id)
    .execute(pool)
    .await?;

    info!(company_id = id, "Company updated");
    get(pool, id).await
}

/// Companies are never deleted: their advances and debts reference them.
pub async fn deactivate(pool: &MySqlPool, id: u64) -> AppResult<()> {
    let result = sqlx::query("UPDATE companies SET is_active = FALSE WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        // MySQL reports 0 when the row already had the value
        get(pool, id).await?;
    }
    info!(company_id = id, "Company deactivated");
    Ok(())
}
