//! Payroll and premium advance endpoints. Both families share the handlers
//! below; the route functions only pick the [`AdvanceKind`].

use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::advance::AdvanceKind;
use crate::advance::service::{self as advance_service, AdvanceFilter, NewAdvanceRequest};
use crate::advance::status::Subaction;
use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::advance::{Actor, Advance, AdvanceHistory, AdvanceTax};
use crate::permission::{self, PermissionCode};
use crate::utils::pagination::paginate;

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "data": [{
        "id": 10,
        "employee_id": 1,
        "company_id": 1,
        "company_debt_id": 4,
        "requested_amount": "100000.00",
        "total_amount": "107500.00",
        "status": "REQUESTED",
        "payment_method": "BANK_ACCOUNT",
        "reason": null,
        "payment_date": "2026-01-31",
        "payment_term": 16,
        "paid_at": null,
        "created_at": "2026-01-15T10:00:00Z"
    }],
    "page": 1,
    "per_page": 10,
    "total": 1
}))]
pub struct AdvanceListResponse {
    pub data: Vec<Advance>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// An advance with the fee lines that make up its total.
#[derive(Serialize, ToSchema)]
pub struct AdvanceDetail {
    #[serde(flatten)]
    pub advance: Advance,
    pub taxes: Vec<AdvanceTax>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionReq {
    #[schema(example = "approve")]
    pub subaction: Subaction,
}

/// Loads an advance the caller may look at: their own, or any advance of
/// their company when they hold `ADVANCE_VIEW_ALL`.
async fn visible_advance(
    pool: &MySqlPool,
    auth: &AuthUser,
    kind: AdvanceKind,
    id: u64,
) -> AppResult<Advance> {
    let advance = advance_service::get(pool, kind, id).await?;
    if auth.employee_id == Some(advance.employee_id) {
        return Ok(advance);
    }
    permission::check(pool, auth, PermissionCode::AdvanceViewAll).await?;
    auth.require_company_access(advance.company_id)?;
    Ok(advance)
}

/// Who a status change is recorded as. Without `ADVANCE_VIEW_ALL` a caller
/// may only cancel their own advance.
fn acting_as(own: bool, view_all: bool, subaction: Subaction) -> AppResult<Actor> {
    match (own && subaction == Subaction::Cancel, view_all) {
        (true, _) => Ok(Actor::Employee),
        (false, true) => Ok(Actor::Admin),
        (false, false) => Err(AppError::forbidden("You can only cancel your own advances")),
    }
}

async fn list(
    pool: &MySqlPool,
    auth: &AuthUser,
    kind: AdvanceKind,
    mut filter: AdvanceFilter,
) -> AppResult<HttpResponse> {
    if permission::allows(pool, auth, PermissionCode::AdvanceViewAll).await? {
        filter.company_id = auth.company_scope(filter.company_id)?;
    } else {
        filter.employee_id = Some(auth.require_employee()?);
        filter.company_id = None;
    }

    let page = paginate(filter.page, filter.per_page);
    let (data, total) = advance_service::list(pool, kind, &filter, page).await?;

    Ok(HttpResponse::Ok().json(AdvanceListResponse {
        data,
        page: page.page,
        per_page: page.per_page,
        total,
    }))
}

async fn request(
    pool: &MySqlPool,
    auth: &AuthUser,
    kind: AdvanceKind,
    req: &NewAdvanceRequest,
) -> AppResult<HttpResponse> {
    permission::check(pool, auth, PermissionCode::AdvanceRequest).await?;
    let employee_id = auth.require_employee()?;

    let today = Utc::now().date_naive();
    let advance =
        advance_service::request(pool, kind, employee_id, auth.user_id, req, today).await?;
    Ok(HttpResponse::Created().json(advance))
}

async fn detail(
    pool: &MySqlPool,
    auth: &AuthUser,
    kind: AdvanceKind,
    id: u64,
) -> AppResult<HttpResponse> {
    let advance = visible_advance(pool, auth, kind, id).await?;
    let taxes = advance_service::taxes(pool, kind, advance.id).await?;
    Ok(HttpResponse::Ok().json(AdvanceDetail { advance, taxes }))
}

async fn history(
    pool: &MySqlPool,
    auth: &AuthUser,
    kind: AdvanceKind,
    id: u64,
) -> AppResult<HttpResponse> {
    let advance = visible_advance(pool, auth, kind, id).await?;
    let rows: Vec<AdvanceHistory> = advance_service::history(pool, kind, advance.id).await?;
    Ok(HttpResponse::Ok().json(rows))
}

async fn transition(
    pool: &MySqlPool,
    auth: &AuthUser,
    kind: AdvanceKind,
    id: u64,
    subaction: Subaction,
) -> AppResult<HttpResponse> {
    permission::check(pool, auth, subaction.permission()).await?;

    let advance = advance_service::get(pool, kind, id).await?;
    let own = auth.employee_id == Some(advance.employee_id);
    let view_all = permission::allows(pool, auth, PermissionCode::AdvanceViewAll).await?;
    if view_all {
        auth.require_company_access(advance.company_id)?;
    }
    let actor = acting_as(own, view_all, subaction)?;

    let updated =
        advance_service::transition(pool, kind, id, subaction, actor, auth.user_id).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/* =========================
Payroll advances
========================= */

#[utoipa::path(
    get,
    path = "/dashboard/payroll-advances",
    params(AdvanceFilter),
    responses(
        (status = 200, body = AdvanceListResponse),
        (status = 403, description = "Company outside your scope")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll advances"
)]
pub async fn list_payroll_advances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AdvanceFilter>,
) -> AppResult<HttpResponse> {
    list(&pool, &auth, AdvanceKind::Payroll, query.into_inner()).await
}

#[utoipa::path(
    post,
    path = "/dashboard/payroll-advances",
    request_body = NewAdvanceRequest,
    responses(
        (status = 201, body = Advance),
        (status = 400, description = "Amount, window, destination or ceiling check failed"),
        (status = 403, description = "Missing ADVANCE_REQUEST or no employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll advances"
)]
pub async fn request_payroll_advance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<NewAdvanceRequest>,
) -> AppResult<HttpResponse> {
    request(&pool, &auth, AdvanceKind::Payroll, &payload).await
}

#[utoipa::path(
    get,
    path = "/dashboard/payroll-advances/{id}",
    params(("id" = u64, Path, description = "Advance id")),
    responses(
        (status = 200, body = AdvanceDetail),
        (status = 404, description = "Payroll advance not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll advances"
)]
pub async fn get_payroll_advance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    detail(&pool, &auth, AdvanceKind::Payroll, path.into_inner()).await
}

#[utoipa::path(
    get,
    path = "/dashboard/payroll-advances/{id}/history",
    params(("id" = u64, Path, description = "Advance id")),
    responses(
        (status = 200, body = Vec<AdvanceHistory>),
        (status = 404, description = "Payroll advance not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll advances"
)]
pub async fn payroll_advance_history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    history(&pool, &auth, AdvanceKind::Payroll, path.into_inner()).await
}

#[utoipa::path(
    put,
    path = "/dashboard/payroll-advances/{id}",
    params(("id" = u64, Path, description = "Advance id")),
    request_body = TransitionReq,
    responses(
        (status = 200, body = Advance),
        (status = 400, description = "Status change not allowed from the current status"),
        (status = 403, description = "Missing permission for the subaction"),
        (status = 404, description = "Payroll advance not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll advances"
)]
pub async fn update_payroll_advance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<TransitionReq>,
) -> AppResult<HttpResponse> {
    transition(&pool, &auth, AdvanceKind::Payroll, path.into_inner(), payload.subaction).await
}

/* =========================
Premium advances
========================= */

#[utoipa::path(
    get,
    path = "/dashboard/premium-advances",
    params(AdvanceFilter),
    responses(
        (status = 200, body = AdvanceListResponse),
        (status = 403, description = "Company outside your scope")
    ),
    security(("bearer_auth" = [])),
    tag = "Premium advances"
)]
pub async fn list_premium_advances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AdvanceFilter>,
) -> AppResult<HttpResponse> {
    list(&pool, &auth, AdvanceKind::Premium, query.into_inner()).await
}

#[utoipa::path(
    post,
    path = "/dashboard/premium-advances",
    request_body = NewAdvanceRequest,
    responses(
        (status = 201, body = Advance),
        (status = 400, description = "Amount, window, destination or ceiling check failed"),
        (status = 403, description = "Missing ADVANCE_REQUEST or no employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Premium advances"
)]
pub async fn request_premium_advance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<NewAdvanceRequest>,
) -> AppResult<HttpResponse> {
    request(&pool, &auth, AdvanceKind::Premium, &payload).await
}

#[utoipa::path(
    get,
    path = "/dashboard/premium-advances/{id}",
    params(("id" = u64, Path, description = "Advance id")),
    responses(
        (status = 200, body = AdvanceDetail),
        (status = 404, description = "Premium advance not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Premium advances"
)]
pub async fn get_premium_advance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    detail(&pool, &auth, AdvanceKind::Premium, path.into_inner()).await
}

#[utoipa::path(
    get,
    path = "/dashboard/premium-advances/{id}/history",
    params(("id" = u64, Path, description = "Advance id")),
    responses(
        (status = 200, body = Vec<AdvanceHistory>),
        (status = 404, description = "Premium advance not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Premium advances"
)]
pub async fn premium_advance_history(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    history(&pool, &auth, AdvanceKind::Premium, path.into_inner()).await
}

#[utoipa::path(
    put,
    path = "/dashboard/premium-advances/{id}",
    params(("id" = u64, Path, description = "Advance id")),
    request_body = TransitionReq,
    responses(
        (status = 200, body = Advance),
        (status = 400, description = "Status change not allowed from the current status"),
        (status = 403, description = "Missing permission for the subaction"),
        (status = 404, description = "Premium advance not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Premium advances"
)]
pub async fn update_premium_advance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<TransitionReq>,
) -> AppResult<HttpResponse> {
    transition(&pool, &auth, AdvanceKind::Premium, path.into_inner(), payload.subaction).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_body_uses_lowercase_subactions() {
        let req: TransitionReq = serde_json::from_str(r#"{"subaction":"pay"}"#).unwrap();
        assert_eq!(req.subaction, Subaction::Pay);
        assert!(serde_json::from_str::<TransitionReq>(r#"{"subaction":"PAY"}"#).is_err());
    }

    #[test]
    fn own_cancel_is_recorded_as_employee() {
        assert_eq!(acting_as(true, false, Subaction::Cancel).unwrap(), Actor::Employee);
        assert_eq!(acting_as(true, true, Subaction::Cancel).unwrap(), Actor::Employee);
    }

    #[test]
    fn others_need_view_all() {
        assert_eq!(acting_as(false, true, Subaction::Approve).unwrap(), Actor::Admin);
        assert_eq!(acting_as(true, true, Subaction::Pay).unwrap(), Actor::Admin);

        let err = acting_as(false, false, Subaction::Cancel).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(acting_as(true, false, Subaction::Approve).is_err());
    }

    #[test]
    fn request_body_reads_string_amounts() {
        let req: NewAdvanceRequest = serde_json::from_str(
            r#"{"requested_amount":"100000","payment_method":"BANK_ACCOUNT"}"#,
        )
        .unwrap();
        assert_eq!(req.requested_amount, rust_decimal::Decimal::from(100_000));
        assert!(req.reason.is_none());
    }
}
