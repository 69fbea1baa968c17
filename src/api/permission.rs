use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use strum::IntoEnumIterator;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::role::Role;
use crate::permission::{self, PermissionCode, PermissionMap};

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionGrant {
    pub permission: PermissionCode,
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PermissionChange {
    #[schema(example = "hr")]
    pub role: Role,
    #[schema(example = "ADVANCE_PAY")]
    pub permission: PermissionCode,
}

/// One entry per permission code, including codes no role holds.
pub fn grants(map: &PermissionMap) -> Vec<PermissionGrant> {
    PermissionCode::iter()
        .map(|code| PermissionGrant {
            permission: code,
            roles: map.roles_for(code),
        })
        .collect()
}

async fn require_permission_manager(pool: &MySqlPool, auth: &AuthUser) -> AppResult<()> {
    permission::check(pool, auth, PermissionCode::PermissionManage).await?;
    if !auth.is_platform_admin() {
        return Err(AppError::forbidden("Only platform admins manage permissions"));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/dashboard/permissions",
    responses((status = 200, body = Vec<PermissionGrant>)),
    security(("bearer_auth" = [])),
    tag = "Permission"
)]
pub async fn list_permissions(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> AppResult<HttpResponse> {
    require_permission_manager(&pool, &auth).await?;
    let map = permission::load_map(&pool).await?;
    Ok(HttpResponse::Ok().json(grants(&map)))
}

#[utoipa::path(
    post,
    path = "/dashboard/permissions",
    request_body = PermissionChange,
    responses(
        (status = 204, description = "Permission granted"),
        (status = 403, description = "Missing PERMISSION_MANAGE")
    ),
    security(("bearer_auth" = [])),
    tag = "Permission"
)]
pub async fn grant_permission(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<PermissionChange>,
) -> AppResult<HttpResponse> {
    require_permission_manager(&pool, &auth).await?;
    permission::grant(&pool, payload.role, payload.permission).await?;
    info!(role = %payload.role, permission = %payload.permission, by = auth.user_id, "Permission granted");
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/dashboard/permissions",
    request_body = PermissionChange,
    responses(
        (status = 204, description = "Permission revoked"),
        (status = 400, description = "Would lock administrators out")
    ),
    security(("bearer_auth" = [])),
    tag = "Permission"
)]
pub async fn revoke_permission(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<PermissionChange>,
) -> AppResult<HttpResponse> {
    require_permission_manager(&pool, &auth).await?;
    if payload.role == Role::Admin && payload.permission == PermissionCode::PermissionManage {
        return Err(AppError::validation("Admins must keep PERMISSION_MANAGE"));
    }
    permission::revoke(&pool, payload.role, payload.permission).await?;
    info!(role = %payload.role, permission = %payload.permission, by = auth.user_id, "Permission revoked");
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::default_map;

    #[test]
    fn grants_list_every_code() {
        let listed = grants(&default_map());
        assert_eq!(listed.len(), PermissionCode::iter().count());

        let request = listed
            .iter()
            .find(|g| g.permission == PermissionCode::AdvanceRequest)
            .unwrap();
        assert_eq!(request.roles, vec![Role::Employee]);
    }
}
