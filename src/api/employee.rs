use actix_web::{HttpResponse, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::debug;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::model::employee::Employee;
use crate::permission::{self, PermissionCode};
use crate::service::employee::{self as employee_service, CreateEmployee, EmployeeFilter, UpdateEmployee};
use crate::utils::pagination::paginate;

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    #[schema(
    example = json!([{
        "id": 1,
        "company_id": 1,
        "document_number": "1020304050",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "phone": "+573001234567",
        "salary": "3000000.00",
        "bank_id": 2,
        "bank_account_number": "123-456789-00",
        "wallet_address": null,
        "status": "ACTIVE",
        "created_at": "2026-01-01T00:00:00Z"
    }])
)]
    pub data: Vec<Employee>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// Loads an employee of a company the caller may manage.
async fn managed_employee(pool: &MySqlPool, auth: &AuthUser, id: u64) -> AppResult<Employee> {
    permission::check(pool, auth, PermissionCode::EmployeeManage).await?;
    let employee = employee_service::get(pool, id).await?;
    auth.require_company_access(employee.company_id)?;
    Ok(employee)
}

#[utoipa::path(
    post,
    path = "/dashboard/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, body = Employee),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> AppResult<HttpResponse> {
    permission::check(&pool, &auth, PermissionCode::EmployeeManage).await?;
    auth.require_company_access(payload.company_id)?;
    let employee = employee_service::create(&pool, &payload).await?;
    Ok(HttpResponse::Created().json(employee))
}

#[utoipa::path(
    get,
    path = "/dashboard/employees",
    params(EmployeeFilter),
    responses((status = 200, body = EmployeeListResponse)),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeFilter>,
) -> AppResult<HttpResponse> {
    permission::check(&pool, &auth, PermissionCode::EmployeeManage).await?;

    let mut filter = query.into_inner();
    filter.company_id = auth.company_scope(filter.company_id)?;
    debug!(?filter, "Listing employees");

    let page = paginate(filter.page, filter.per_page);
    let (data, total) = employee_service::list(&pool, &filter, page).await?;
    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/dashboard/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    responses(
        (status = 200, body = Employee),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let employee = managed_employee(&pool, &auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(employee))
}

#[utoipa::path(
    put,
    path = "/dashboard/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    request_body = UpdateEmployee,
    responses(
        (status = 200, body = Employee),
        (status = 400, description = "No updatable fields or invalid values"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateEmployee>,
) -> AppResult<HttpResponse> {
    let employee = managed_employee(&pool, &auth, path.into_inner()).await?;
    let updated = employee_service::update(&pool, employee.id, &payload).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    delete,
    path = "/dashboard/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee deactivated"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Employee"
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let employee = managed_employee(&pool, &auth, path.into_inner()).await?;
    employee_service::deactivate(&pool, employee.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Employee deactivated" })))
}
