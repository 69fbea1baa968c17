use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::indicator::Indicator;

#[derive(Debug, Deserialize, ToSchema)]
pub struct IndicatorReq {
    #[schema(example = "SMMLV")]
    pub code: String,
    #[schema(example = "Minimum monthly wage")]
    pub name: String,
    #[schema(example = "1423500", value_type = String)]
    pub value: Decimal,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub valid_from: NaiveDate,
}

pub async fn list(pool: &MySqlPool, code: Option<&str>) -> AppResult<Vec<Indicator>> {
    let rows = match code {
        Some(code) => {
            sqlx::query_as::<_, Indicator>(
                "SELECT id, code, name, value, valid_from FROM indicators \
                 WHERE code = ? ORDER BY valid_from DESC",
            )
            .bind(code.to_uppercase())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Indicator>(
                "SELECT id, code, name, value, valid_from FROM indicators \
                 ORDER BY code, valid_from DESC",
            )
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows)
}

/// Value of `code` in force on `on`.
pub async fn current(pool: &MySqlPool, code: &str, on: NaiveDate) -> AppResult<Indicator> {
    sqlx::query_as::<_, Indicator>(
        r#"
        SELECT id, code, name, value, valid_from
        FROM indicators
        WHERE code = ? AND valid_from <= ?
        ORDER BY valid_from DESC
        LIMIT 1
        "#,
    )
    .bind(code.to_uppercase())
    .bind(on)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("No value for indicator {code}")))
}

pub async fn create(pool: &MySqlPool, req: &IndicatorReq) -> AppResult<Indicator> {
    if req.code.trim().is_empty() || req.name.trim().is_empty() {
        return Err(AppError::validation("code and name are required"));
    }
    let id = sqlx::query(
        "INSERT INTO indicators (code, name, value, valid_from) VALUES (?, ?, ?, ?)",
    )
    .bind(req.code.trim().to_uppercase())
    .bind(req.name.trim())
    .bind(req.value)
    .bind(req.valid_from)
    .execute(pool)
    .await?
    .last_insert_id();

    info!(indicator_id = id, code = %req.code, "Indicator published");

    sqlx::query_as::<_, Indicator>(
        "SELECT id, code, name, value, valid_from FROM indicators WHERE id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(Into::into)
}

pub async fn delete(pool: &MySqlPool, id: u64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM indicators WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Indicator not found"));
    }
    Ok(())
}
