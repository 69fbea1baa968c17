use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::OnceCell;
use sqlx::MySqlPool;

use super::PermissionCode;
use crate::error::{AppError, AppResult};
use crate::model::role::Role;

const DEFAULT_TTL_SECS: u64 = 300;

type RolePermissions = Arc<HashSet<PermissionCode>>;

/// role id => codes granted to that role
static PERMISSION_CACHE: OnceCell<Cache<u8, RolePermissions>> = OnceCell::new();

fn build(ttl: Duration) -> Cache<u8, RolePermissions> {
    Cache::builder().max_capacity(64).time_to_live(ttl).build()
}

/// Sets the TTL; must run before the first lookup to take effect.
pub fn init(ttl_secs: u64) {
    let _ = PERMISSION_CACHE.set(build(Duration::from_secs(ttl_secs)));
}

fn cache() -> &'static Cache<u8, RolePermissions> {
    PERMISSION_CACHE.get_or_init(|| build(Duration::from_secs(DEFAULT_TTL_SECS)))
}

async fn load_role(pool: &MySqlPool, role: Role) -> AppResult<RolePermissions> {
    let codes = sqlx::query_scalar::<_, String>(
        "SELECT permission_code FROM role_permissions WHERE role_id = ?",
    )
    .bind(role.id())
    .fetch_all(pool)
    .await?;

    Ok(Arc::new(codes.iter().filter_map(|c| c.parse().ok()).collect()))
}

/// Concurrent misses for one role share a single `load`; a failed load is
/// not cached.
async fn cached<F>(role: Role, load: F) -> AppResult<RolePermissions>
where
    F: Future<Output = AppResult<RolePermissions>>,
{
    cache()
        .try_get_with(role.id(), load)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}

pub async fn permissions_for(pool: &MySqlPool, role: Role) -> AppResult<RolePermissions> {
    cached(role, load_role(pool, role)).await
}

pub async fn invalidate(role: Role) {
    cache().invalidate(&role.id()).await;
}

/// Preload every role's grants so the first requests skip the database.
pub async fn warmup(pool: &MySqlPool) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (u8, String)>(
        "SELECT role_id, permission_code FROM role_permissions",
    )
    .fetch(pool);

    let mut by_role: HashMap<u8, HashSet<PermissionCode>> = HashMap::new();
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (role_id, code) = row?;
        match code.parse::<PermissionCode>() {
            Ok(code) => {
                by_role.entry(role_id).or_default().insert(code);
                total += 1;
            }
            Err(_) => log::warn!("Ignoring unknown permission code {} for role {}", code, role_id),
        }
    }

    let roles = by_role.len();
    for (role_id, codes) in by_role {
        cache().insert(role_id, Arc::new(codes)).await;
    }

    log::info!(
        "Permission cache warmup complete: {} grants across {} roles",
        total,
        roles
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(codes: &[PermissionCode]) -> RolePermissions {
        Arc::new(codes.iter().copied().collect())
    }

    #[actix_web::test]
    async fn loads_once_until_invalidated() {
        let role = Role::Hr;
        invalidate(role).await;

        let first = cached(role, async { Ok(set(&[PermissionCode::DebtView])) })
            .await
            .unwrap();
        let again = cached(role, async { Ok(set(&[PermissionCode::AdvancePay])) })
            .await
            .unwrap();
        assert_eq!(first, again);

        invalidate(role).await;
        let reloaded = cached(role, async { Ok(set(&[PermissionCode::AdvancePay])) })
            .await
            .unwrap();
        assert!(reloaded.contains(&PermissionCode::AdvancePay));
        invalidate(role).await;
    }

    #[actix_web::test]
    async fn failed_load_is_not_cached() {
        let role = Role::Employee;
        invalidate(role).await;

        let err = cached(role, async { Err(AppError::Internal("db down".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));

        let ok = cached(role, async { Ok(set(&[PermissionCode::AdvanceRequest])) })
            .await
            .unwrap();
        assert!(ok.contains(&PermissionCode::AdvanceRequest));
        invalidate(role).await;
    }
}
