use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::bank::Bank;

#[derive(Debug, Deserialize, ToSchema)]
pub struct BankReq {
    #[schema(example = "Bancolombia")]
    pub name: String,
    #[schema(example = "007")]
    pub code: String,
    pub is_active: Option<bool>,
}

fn validate(req: &BankReq) -> AppResult<()> {
    if req.name.trim().is_empty() || req.code.trim().is_empty() {
        return Err(AppError::validation("name and code are required"));
    }
    Ok(())
}

pub async fn list(pool: &MySqlPool) -> AppResult<Vec<Bank>> {
    let banks = sqlx::query_as::<_, Bank>("SELECT id, name, code, is_active FROM banks ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(banks)
}

pub async fn get(pool: &MySqlPool, id: u64) -> AppResult<Bank> {
    sqlx::query_as::<_, Bank>("SELECT id, name, code, is_active FROM banks WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Bank not found"))
}

pub async fn create(pool: &MySqlPool, req: &BankReq) -> AppResult<Bank> {
    validate(req)?;
    let id = sqlx::query("INSERT INTO banks (name, code, is_active) VALUES (?, ?, ?)")
        .bind(req.name.trim())
        .bind(req.code.trim())
        .bind(req.is_active.unwrap_or(true))
        .execute(pool)
        .await?
        .last_insert_id();
    info!(bank_id = id, "Bank created");
    get(pool, id).await
}

pub async fn update(pool: &MySqlPool, id: u64, req: &BankReq) -> AppResult<Bank> {
    validate(req)?;
    let current = get(pool, id).await?;
    sqlx::query("UPDATE banks SET name = ?, code = ?, is_active = ? WHERE id = ?")
        .bind(req.name.trim())
        .bind(req.code.trim())
        .bind(req.is_active.unwrap_or(current.is_active))
        .bind(id)
        .execute(pool)
        .await?;
    get(pool, id).await
}
