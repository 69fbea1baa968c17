use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::IntoParams;

use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::permission::{self, PermissionCode};
use crate::service::debt as debt_service;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DebtQuery {
    /// Only debts of this year
    pub year: Option<u16>,
}

#[utoipa::path(
    get,
    path = "/dashboard/companies/{id}/debts",
    params(("id" = u64, Path, description = "Company id"), DebtQuery),
    responses(
        (status = 200, body = Vec<crate::model::debt::CompanyDebt>),
        (status = 403, description = "Missing DEBT_VIEW or company outside your scope")
    ),
    security(("bearer_auth" = [])),
    tag = "Debt"
)]
pub async fn list_company_debts(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<DebtQuery>,
) -> AppResult<HttpResponse> {
    let company_id = path.into_inner();
    permission::check(&pool, &auth, PermissionCode::DebtView).await?;
    auth.require_company_access(company_id)?;

    let debts = debt_service::list_for_company(&pool, company_id, query.year).await?;
    Ok(HttpResponse::Ok().json(debts))
}

#[utoipa::path(
    get,
    path = "/dashboard/debts/{id}",
    params(("id" = u64, Path, description = "Debt id")),
    responses(
        (status = 200, body = crate::service::debt::DebtDetail),
        (status = 404, description = "Debt not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Debt"
)]
pub async fn get_debt(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    permission::check(&pool, &auth, PermissionCode::DebtView).await?;
    let detail = debt_service::detail(&pool, path.into_inner()).await?;
    auth.require_company_access(detail.debt.company_id)?;
    Ok(HttpResponse::Ok().json(detail))
}
