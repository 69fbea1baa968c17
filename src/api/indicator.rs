use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::IntoParams;

use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::permission::{self, PermissionCode};
use crate::service::indicator::{self as indicator_service, IndicatorReq};

#[derive(Debug, Deserialize, IntoParams)]
pub struct IndicatorQuery {
    /// Only values of this indicator code
    pub code: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CurrentQuery {
    /// Defaults to today
    #[param(value_type = Option<String>, format = Date)]
    pub on: Option<NaiveDate>,
}

#[utoipa::path(
    get,
    path = "/dashboard/indicators",
    params(IndicatorQuery),
    responses((status = 200, body = Vec<crate::model::indicator::Indicator>)),
    security(("bearer_auth" = [])),
    tag = "Indicator"
)]
pub async fn list_indicators(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<IndicatorQuery>,
) -> AppResult<HttpResponse> {
    let rows = indicator_service::list(&pool, query.code.as_deref()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    get,
    path = "/dashboard/indicators/{code}/current",
    params(("code" = String, Path, description = "Indicator code"), CurrentQuery),
    responses(
        (status = 200, body = crate::model::indicator::Indicator),
        (status = 404, description = "No value in force")
    ),
    security(("bearer_auth" = [])),
    tag = "Indicator"
)]
pub async fn current_indicator(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    query: web::Query<CurrentQuery>,
) -> AppResult<HttpResponse> {
    let on = query.on.unwrap_or_else(|| Utc::now().date_naive());
    let indicator = indicator_service::current(&pool, &path, on).await?;
    Ok(HttpResponse::Ok().json(indicator))
}

#[utoipa::path(
    post,
    path = "/dashboard/indicators",
    request_body = IndicatorReq,
    responses(
        (status = 201, body = crate::model::indicator::Indicator),
        (status = 409, description = "Value already published for that date")
    ),
    security(("bearer_auth" = [])),
    tag = "Indicator"
)]
pub async fn create_indicator(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<IndicatorReq>,
) -> AppResult<HttpResponse> {
    permission::check(&pool, &auth, PermissionCode::IndicatorManage).await?;
    Ok(HttpResponse::Created().json(indicator_service::create(&pool, &payload).await?))
}

#[utoipa::path(
    delete,
    path = "/dashboard/indicators/{id}",
    params(("id" = u64, Path, description = "Indicator id")),
    responses(
        (status = 204, description = "Indicator deleted"),
        (status = 404, description = "Indicator not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Indicator"
)]
pub async fn delete_indicator(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    permission::check(&pool, &auth, PermissionCode::IndicatorManage).await?;
    indicator_service::delete(&pool, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
