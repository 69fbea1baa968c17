pub mod cache;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tracing::warn;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::role::Role;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionCode {
    AdvanceRequest,
    AdvanceApprove,
    AdvanceReject,
    AdvanceCancel,
    AdvancePay,
    AdvanceViewAll,
    CompanyManage,
    EmployeeManage,
    DebtView,
    TaxManage,
    BankManage,
    IndicatorManage,
    PermissionManage,
    UserManage,
}

/// Permission code -> roles allowed to use it.
#[derive(Debug, Default, Clone)]
pub struct PermissionMap {
    grants: HashMap<PermissionCode, HashSet<Role>>,
}

impl PermissionMap {
    pub fn from_rows(rows: impl IntoIterator<Item = (Role, PermissionCode)>) -> Self {
        let mut map = PermissionMap::default();
        for (role, code) in rows {
            map.grant(code, role);
        }
        map
    }

    pub fn grant(&mut self, code: PermissionCode, role: Role) {
        self.grants.entry(code).or_default().insert(role);
    }

    /// Denies unless at least one of `roles` holds `code`.
    pub fn allows(&self, roles: &[Role], code: PermissionCode) -> bool {
        match self.grants.get(&code) {
            Some(granted) => roles.iter().any(|r| granted.contains(r)),
            None => false,
        }
    }

    pub fn roles_for(&self, code: PermissionCode) -> Vec<Role> {
        let mut roles: Vec<Role> = self
            .grants
            .get(&code)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default();
        roles.sort_by_key(|r| r.id());
        roles
    }
}

/// Grants seeded by the initial migration.
#[cfg(test)]
pub fn default_map() -> PermissionMap {
    use PermissionCode::*;

    let admin = [
        AdvanceApprove,
        AdvanceReject,
        AdvanceCancel,
        AdvancePay,
        AdvanceViewAll,
        CompanyManage,
        EmployeeManage,
        DebtView,
        TaxManage,
        BankManage,
        IndicatorManage,
        PermissionManage,
        UserManage,
    ];
    let hr = [
        AdvanceApprove,
        AdvanceReject,
        AdvanceCancel,
        AdvanceViewAll,
        EmployeeManage,
        DebtView,
    ];
    let employee = [AdvanceRequest, AdvanceCancel];

    PermissionMap::from_rows(
        admin
            .into_iter()
            .map(|c| (Role::Admin, c))
            .chain(hr.into_iter().map(|c| (Role::Hr, c)))
            .chain(employee.into_iter().map(|c| (Role::Employee, c))),
    )
}

/// Whether one of the caller's roles holds `code`.
pub async fn allows(pool: &MySqlPool, auth: &AuthUser, code: PermissionCode) -> AppResult<bool> {
    let mut map = PermissionMap::default();
    for role in &auth.roles {
        for granted in cache::permissions_for(pool, *role).await?.iter() {
            map.grant(*granted, *role);
        }
    }
    Ok(map.allows(&auth.roles, code))
}

/// Fails with 403 unless one of the caller's roles holds `code`.
pub async fn check(pool: &MySqlPool, auth: &AuthUser, code: PermissionCode) -> AppResult<()> {
    if allows(pool, auth, code).await? {
        Ok(())
    } else {
        warn!(
            user_id = auth.user_id,
            username = %auth.username,
            permission = %code,
            "Permission denied"
        );
        Err(AppError::Forbidden(format!("Missing permission {}", code)))
    }
}

pub async fn load_map(pool: &MySqlPool) -> AppResult<PermissionMap> {
    let rows = sqlx::query_as::<_, (u8, String)>(
        "SELECT role_id, permission_code FROM role_permissions",
    )
    .fetch_all(pool)
    .await?;

    Ok(PermissionMap::from_rows(rows.into_iter().filter_map(
        |(role_id, code)| Some((Role::from_id(role_id)?, code.parse().ok()?)),
    )))
}

pub async fn grant(pool: &MySqlPool, role: Role, code: PermissionCode) -> AppResult<()> {
    sqlx::query("INSERT IGNORE INTO role_permissions (role_id, permission_code) VALUES (?, ?)")
        .bind(role.id())
        .bind(code.as_ref())
        .execute(pool)
        .await?;
    cache::invalidate(role).await;
    Ok(())
}

pub async fn revoke(pool: &MySqlPool, role: Role, code: PermissionCode) -> AppResult<()> {
    sqlx::query("DELETE FROM role_permissions WHERE role_id = ? AND permission_code = ?")
        .bind(role.id())
        .bind(code.as_ref())
        .execute(pool)
        .await?;
    cache::invalidate(role).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn denies_without_code_allows_with_it() {
        let map = default_map();
        assert!(map.allows(&[Role::Employee], PermissionCode::AdvanceRequest));
        assert!(!map.allows(&[Role::Employee], PermissionCode::AdvanceApprove));
        assert!(map.allows(&[Role::Employee, Role::Hr], PermissionCode::AdvanceApprove));
        assert!(!map.allows(&[Role::Hr], PermissionCode::AdvancePay));
    }

    #[test]
    fn empty_role_set_is_denied_everything() {
        let map = default_map();
        for code in PermissionCode::iter() {
            assert!(!map.allows(&[], code));
        }
    }

    #[test]
    fn unknown_code_is_denied() {
        let map = PermissionMap::default();
        assert!(!map.allows(&[Role::Admin], PermissionCode::CompanyManage));
    }

    #[test]
    fn roles_for_lists_every_holder_by_id() {
        let map = default_map();
        assert_eq!(
            map.roles_for(PermissionCode::AdvanceCancel),
            vec![Role::Admin, Role::Hr, Role::Employee]
        );
        assert_eq!(map.roles_for(PermissionCode::AdvancePay), vec![Role::Admin]);
    }

    #[test]
    fn migration_seeds_the_default_grants() {
        let sql = include_str!("../../migrations/20260101000000_init.sql");
        let insert = &sql[sql.find("INSERT INTO role_permissions").unwrap()..];
        let values = &insert[insert.find("VALUES").unwrap() + "VALUES".len()..insert.find(';').unwrap()];

        let seeded = PermissionMap::from_rows(values.split("),").map(|row| {
            let row = row.trim().trim_start_matches('(').trim_end_matches(')');
            let (role, code) = row.split_once(',').unwrap();
            (
                Role::from_id(role.trim().parse().unwrap()).unwrap(),
                code.trim().trim_matches('\'').parse::<PermissionCode>().unwrap(),
            )
        }));

        let defaults = default_map();
        for code in PermissionCode::iter() {
            assert_eq!(seeded.roles_for(code), defaults.roles_for(code), "{code}");
        }
    }

    #[test]
    fn codes_use_screaming_snake_case() {
        assert_eq!(PermissionCode::AdvanceViewAll.as_ref(), "ADVANCE_VIEW_ALL");
        assert_eq!(
            "PERMISSION_MANAGE".parse::<PermissionCode>().unwrap(),
            PermissionCode::PermissionManage
        );
    }
}
