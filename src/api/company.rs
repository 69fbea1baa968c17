use actix_web::{HttpResponse, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::company::Company;
use crate::permission::{self, PermissionCode};
use crate::service::company::{self as company_service, CompanyFilter, CreateCompany, UpdateCompany};
use crate::service::tax::{self as tax_service, FeeReq};
use crate::utils::pagination::paginate;

#[derive(Serialize, ToSchema)]
pub struct CompanyListResponse {
    pub data: Vec<Company>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 3)]
    pub total: i64,
}

#[utoipa::path(
    post,
    path = "/dashboard/companies",
    request_body = CreateCompany,
    responses(
        (status = 201, body = Company),
        (status = 400, description = "Invalid settings"),
        (status = 409, description = "NIT already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn create_company(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCompany>,
) -> AppResult<HttpResponse> {
    permission::check(&pool, &auth, PermissionCode::CompanyManage).await?;
    if !auth.is_platform_admin() {
        return Err(AppError::forbidden("Only platform admins can create companies"));
    }
    let company = company_service::create(&pool, &payload).await?;
    Ok(HttpResponse::Created().json(company))
}

#[utoipa::path(
    get,
    path = "/dashboard/companies",
    params(CompanyFilter),
    responses((status = 200, body = CompanyListResponse)),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn list_companies(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CompanyFilter>,
) -> AppResult<HttpResponse> {
    permission::check(&pool, &auth, PermissionCode::CompanyManage).await?;

    // company-bound callers only ever see their own company
    if let Some(own) = auth.company_scope(None)? {
        let company = company_service::get(&pool, own).await?;
        return Ok(HttpResponse::Ok().json(CompanyListResponse {
            data: vec![company],
            page: 1,
            per_page: 1,
            total: 1,
        }));
    }

    let page = paginate(query.page, query.per_page);
    let (data, total) = company_service::list(&pool, &query, page).await?;
    Ok(HttpResponse::Ok().json(CompanyListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/dashboard/companies/{id}",
    params(("id" = u64, Path, description = "Company id")),
    responses(
        (status = 200, body = Company),
        (status = 404, description = "Company not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn get_company(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    permission::check(&pool, &auth, PermissionCode::CompanyManage).await?;
    auth.require_company_access(id)?;
    Ok(HttpResponse::Ok().json(company_service::get(&pool, id).await?))
}

#[utoipa::path(
    put,
    path = "/dashboard/companies/{id}",
    params(("id" = u64, Path, description = "Company id")),
    request_body = UpdateCompany,
    responses(
        (status = 200, body = Company),
        (status = 400, description = "Invalid settings"),
        (status = 404, description = "Company not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn update_company(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateCompany>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    permission::check(&pool, &auth, PermissionCode::CompanyManage).await?;
    auth.require_company_access(id)?;
    Ok(HttpResponse::Ok().json(company_service::update(&pool, id, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/dashboard/companies/{id}",
    params(("id" = u64, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company deactivated"),
        (status = 404, description = "Company not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn deactivate_company(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    permission::check(&pool, &auth, PermissionCode::CompanyManage).await?;
    if !auth.is_platform_admin() {
        return Err(AppError::forbidden("Only platform admins can deactivate companies"));
    }
    company_service::deactivate(&pool, id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Company deactivated" })))
}

/* =========================
Company taxes
========================= */

#[utoipa::path(
    get,
    path = "/dashboard/companies/{id}/taxes",
    params(("id" = u64, Path, description = "Company id")),
    responses((status = 200, body = Vec<crate::model::tax::CompanyTax>)),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn list_company_taxes(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    permission::check(&pool, &auth, PermissionCode::TaxManage).await?;
    auth.require_company_access(id)?;
    Ok(HttpResponse::Ok().json(tax_service::list_company(&pool, id).await?))
}

#[utoipa::path(
    post,
    path = "/dashboard/companies/{id}/taxes",
    params(("id" = u64, Path, description = "Company id")),
    request_body = FeeReq,
    responses(
        (status = 201, body = crate::model::tax::CompanyTax),
        (status = 400, description = "Invalid tax")
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn create_company_tax(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<FeeReq>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    permission::check(&pool, &auth, PermissionCode::TaxManage).await?;
    auth.require_company_access(id)?;
    company_service::get(&pool, id).await?;
    let tax = tax_service::create_company(&pool, id, &payload).await?;
    Ok(HttpResponse::Created().json(tax))
}

#[utoipa::path(
    delete,
    path = "/dashboard/companies/{id}/taxes/{tax_id}",
    params(
        ("id" = u64, Path, description = "Company id"),
        ("tax_id" = u64, Path, description = "Company tax id")
    ),
    responses(
        (status = 204, description = "Tax deactivated"),
        (status = 404, description = "Active company tax not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Company"
)]
pub async fn delete_company_tax(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u64)>,
) -> AppResult<HttpResponse> {
    let (id, tax_id) = path.into_inner();
    permission::check(&pool, &auth, PermissionCode::TaxManage).await?;
    auth.require_company_access(id)?;
    tax_service::deactivate_company(&pool, id, tax_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
