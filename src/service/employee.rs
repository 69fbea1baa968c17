use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};
use crate::model::employee::{Employee, EmployeeStatus};
use crate::utils::db_utils::{
    SqlValue, WhereClause, bind_query_as, bind_query_scalar, build_update_sql, execute_update,
};
use crate::utils::pagination::Page;

const COLUMNS: &str = "id, company_id, document_number, first_name, last_name, email, phone, \
    salary, bank_id, bank_account_number, wallet_address, status, created_at";

const UPDATABLE: &[&str] = &[
    "document_number",
    "first_name",
    "last_name",
    "email",
    "phone",
    "salary",
    "bank_id",
    "bank_account_number",
    "wallet_address",
    "status",
];

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = 1)]
    pub company_id: u64,
    #[schema(example = "1020304050")]
    pub document_number: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    pub phone: Option<String>,
    #[schema(example = "3000000.00", value_type = String)]
    pub salary: Decimal,
    pub bank_id: Option<u64>,
    pub bank_account_number: Option<String>,
    pub wallet_address: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateEmployee {
    pub document_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(value_type = Option<String>)]
    pub salary: Option<Decimal>,
    pub bank_id: Option<u64>,
    pub bank_account_number: Option<String>,
    pub wallet_address: Option<String>,
    pub status: Option<EmployeeStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeFilter {
    pub company_id: Option<u64>,
    pub status: Option<EmployeeStatus>,
    /// Matches names, email or document number
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

fn validate_salary(salary: Decimal) -> AppResult<()> {
    if salary <= Decimal::ZERO {
        return Err(AppError::validation("salary must be greater than zero"));
    }
    Ok(())
}

fn validate_email(email: &str) -> AppResult<()> {
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::validation("email is not valid")),
    }
}

pub async fn create(pool: &MySqlPool, new: &CreateEmployee) -> AppResult<Employee> {
    if new.document_number.trim().is_empty()
        || new.first_name.trim().is_empty()
        || new.last_name.trim().is_empty()
    {
        return Err(AppError::validation(
            "document_number, first_name and last_name are required",
        ));
    }
    validate_email(&new.email)?;
    validate_salary(new.salary)?;

    let id = sqlx::query(
        r#"
        INSERT INTO employees
            (company_id, document_number, first_name, last_name, email, phone,
             salary, bank_id, bank_account_number, wallet_address)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.company_id)
    .bind(new.document_number.trim())
    .bind(new.first_name.trim())
    .bind(new.last_name.trim())
    .bind(new.email.trim().to_lowercase())
    .bind(&new.phone)
    .bind(new.salary)
    .bind(new.bank_id)
    .bind(&new.bank_account_number)
    .bind(&new.wallet_address)
    .execute(pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => {
            AppError::Conflict("An employee with this email or document already exists".into())
        }
        other => other,
    })?
    .last_insert_id();

    info!(employee_id = id, company_id = new.company_id, "Employee created");
    get(pool, id).await
}

pub async fn get(pool: &MySqlPool, id: u64) -> AppResult<Employee> {
    sqlx::query_as::<_, Employee>(&format!("SELECT {COLUMNS} FROM employees WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))
}

pub async fn list(
    pool: &MySqlPool,
    filter: &EmployeeFilter,
    page: Page,
) -> AppResult<(Vec<Employee>, i64)> {
    let mut w = WhereClause::default();
    w.and_opt("company_id = ?", filter.company_id)
        .and_opt("status = ?", filter.status.map(|s| s.as_ref().to_string()));
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        w.and_all(
            "(first_name LIKE ? OR last_name LIKE ? OR email LIKE ? OR document_number LIKE ?)",
            std::iter::repeat(SqlValue::String(pattern)).take(4),
        );
    }

    let total = bind_query_scalar(
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM employees{}", w.sql())),
        w.values(),
    )
    .fetch_one(pool)
    .await?;

    let data = bind_query_as(
        sqlx::query_as::<_, Employee>(&format!(
            "SELECT {COLUMNS} FROM employees{} ORDER BY last_name, first_name LIMIT ? OFFSET ?",
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

pub async fn update(pool: &MySqlPool, id: u64, changes: &UpdateEmployee) -> AppResult<Employee> {
    if let Some(salary) = changes.salary {
        validate_salary(salary)?;
    }
    if let Some(email) = changes.email.as_deref() {
        validate_email(email)?;
    }

    let payload = serde_json::to_value(changes)
        .map_err(|e| AppError::Internal(format!("serializing employee patch: {e}")))?;
    let update = build_update_sql("employees", &payload, UPDATABLE, "id", id)?;

    let affected = execute_update(pool, update).await?;
    info!(employee_id = id, affected, "Employee updated");

    // also reports 404 for unknown ids
    get(pool, id).await
}

pub async fn deactivate(pool: &MySqlPool, id: u64) -> AppResult<()> {
    get(pool, id).await?;
    sqlx::query("UPDATE employees SET status = ? WHERE id = ?")
        .bind(EmployeeStatus::Inactive.as_ref())
        .bind(id)
        .execute(pool)
        .await?;
    info!(employee_id = id, "Employee deactivated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(validate_email("ana@acme.co").is_ok());
        assert!(validate_email("ana@localhost").is_err());
        assert!(validate_email("@acme.co").is_err());
        assert!(validate_email("ana").is_err());
    }

    #[test]
    fn patch_serializes_enums_as_column_values() {
        let patch = UpdateEmployee {
            status: Some(EmployeeStatus::Inactive),
            salary: Some(Decimal::new(310_000_000, 2)),
            ..Default::default()
        };
        let payload = serde_json::to_value(&patch).unwrap();
        let update = build_update_sql("employees", &payload, UPDATABLE, "id", 3).unwrap();
        assert_eq!(update.sql, "UPDATE employees SET salary = ?, status = ? WHERE id = ?");
        assert_eq!(update.values[1], SqlValue::String("INACTIVE".into()));
    }
}
