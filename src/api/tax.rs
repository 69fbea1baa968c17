use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::permission::{self, PermissionCode};
use crate::service::bank as bank_service;
use crate::service::tax::{self as tax_service, FeeReq};

/// Global taxes and bank fees apply to every company, so only platform
/// admins may change them.
async fn require_platform_tax_manager(pool: &MySqlPool, auth: &AuthUser) -> AppResult<()> {
    permission::check(pool, auth, PermissionCode::TaxManage).await?;
    if !auth.is_platform_admin() {
        return Err(AppError::forbidden("Only platform admins manage global fees"));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/dashboard/taxes",
    responses((status = 200, body = Vec<crate::model::tax::GlobalTax>)),
    security(("bearer_auth" = [])),
    tag = "Tax"
)]
pub async fn list_global_taxes(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> AppResult<HttpResponse> {
    permission::check(&pool, &auth, PermissionCode::TaxManage).await?;
    Ok(HttpResponse::Ok().json(tax_service::list_global(&pool).await?))
}

#[utoipa::path(
    post,
    path = "/dashboard/taxes",
    request_body = FeeReq,
    responses(
        (status = 201, body = crate::model::tax::GlobalTax),
        (status = 400, description = "Invalid tax")
    ),
    security(("bearer_auth" = [])),
    tag = "Tax"
)]
pub async fn create_global_tax(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<FeeReq>,
) -> AppResult<HttpResponse> {
    require_platform_tax_manager(&pool, &auth).await?;
    let tax = tax_service::create_global(&pool, &payload).await?;
    Ok(HttpResponse::Created().json(tax))
}

#[utoipa::path(
    delete,
    path = "/dashboard/taxes/{id}",
    params(("id" = u64, Path, description = "Global tax id")),
    responses(
        (status = 204, description = "Tax deactivated"),
        (status = 404, description = "Active global tax not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tax"
)]
pub async fn delete_global_tax(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    require_platform_tax_manager(&pool, &auth).await?;
    tax_service::deactivate_global(&pool, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/dashboard/banks/{id}/fee",
    params(("id" = u64, Path, description = "Bank id")),
    responses(
        (status = 200, body = crate::model::tax::BankFee),
        (status = 404, description = "Bank has no fee")
    ),
    security(("bearer_auth" = [])),
    tag = "Tax"
)]
pub async fn get_bank_fee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    permission::check(&pool, &auth, PermissionCode::TaxManage).await?;
    let fee = tax_service::bank_fee(&pool, path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Bank has no fee"))?;
    Ok(HttpResponse::Ok().json(fee))
}

#[utoipa::path(
    put,
    path = "/dashboard/banks/{id}/fee",
    params(("id" = u64, Path, description = "Bank id")),
    request_body = FeeReq,
    responses(
        (status = 200, body = crate::model::tax::BankFee),
        (status = 404, description = "Bank not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tax"
)]
pub async fn set_bank_fee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<FeeReq>,
) -> AppResult<HttpResponse> {
    require_platform_tax_manager(&pool, &auth).await?;
    let bank = bank_service::get(&pool, path.into_inner()).await?;
    let fee = tax_service::set_bank_fee(&pool, bank.id, &payload).await?;
    Ok(HttpResponse::Ok().json(fee))
}
