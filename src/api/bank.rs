use actix_web::{HttpResponse, web};
use sqlx::MySqlPool;

use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::permission::{self, PermissionCode};
use crate::service::bank::{self as bank_service, BankReq};

/// Any authenticated user may list banks to pick a payout destination.
#[utoipa::path(
    get,
    path = "/dashboard/banks",
    responses((status = 200, body = Vec<crate::model::bank::Bank>)),
    security(("bearer_auth" = [])),
    tag = "Bank"
)]
pub async fn list_banks(_auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(bank_service::list(&pool).await?))
}

#[utoipa::path(
    post,
    path = "/dashboard/banks",
    request_body = BankReq,
    responses(
        (status = 201, body = crate::model::bank::Bank),
        (status = 409, description = "Bank code already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Bank"
)]
pub async fn create_bank(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<BankReq>,
) -> AppResult<HttpResponse> {
    permission::check(&pool, &auth, PermissionCode::BankManage).await?;
    Ok(HttpResponse::Created().json(bank_service::create(&pool, &payload).await?))
}

#[utoipa::path(
    get,
    path = "/dashboard/banks/{id}",
    params(("id" = u64, Path, description = "Bank id")),
    responses(
        (status = 200, body = crate::model::bank::Bank),
        (status = 404, description = "Bank not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Bank"
)]
pub async fn get_bank(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(bank_service::get(&pool, path.into_inner()).await?))
}

#[utoipa::path(
    put,
    path = "/dashboard/banks/{id}",
    params(("id" = u64, Path, description = "Bank id")),
    request_body = BankReq,
    responses(
        (status = 200, body = crate::model::bank::Bank),
        (status = 404, description = "Bank not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Bank"
)]
pub async fn update_bank(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<BankReq>,
) -> AppResult<HttpResponse> {
    permission::check(&pool, &auth, PermissionCode::BankManage).await?;
    let bank = bank_service::update(&pool, path.into_inner(), &payload).await?;
    Ok(HttpResponse::Ok().json(bank))
}
