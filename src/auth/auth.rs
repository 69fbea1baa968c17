use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use crate::models::{Claims, TokenType};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub roles: Vec<Role>,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
    /// Absent for platform administrators
    pub company_id: Option<u64>,
}

impl AuthUser {
    /// Unknown role ids are dropped, so a token naming none of ours ends up
    /// with an empty role set and every permission check denies it.
    pub fn from_claims(claims: Claims) -> Result<Self, AppError> {
        if claims.token_type != TokenType::Access {
            return Err(AppError::Unauthorized("Access token required".into()));
        }

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            roles: claims.roles.into_iter().filter_map(Role::from_id).collect(),
            employee_id: claims.employee_id,
            company_id: claims.company_id,
        })
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Platform administrators are the only callers not bound to a company.
    pub fn is_platform_admin(&self) -> bool {
        self.has_role(Role::Admin) && self.company_id.is_none()
    }

    pub fn require_employee(&self) -> Result<u64, AppError> {
        self.employee_id
            .ok_or_else(|| AppError::forbidden("No employee profile"))
    }

    /// Company a listing must be restricted to: whatever the caller asked
    /// for when they are a platform admin, their own company otherwise.
    pub fn company_scope(&self, requested: Option<u64>) -> Result<Option<u64>, AppError> {
        if self.is_platform_admin() {
            return Ok(requested);
        }
        let own = self
            .company_id
            .ok_or_else(|| AppError::forbidden("No company assigned"))?;
        match requested {
            Some(id) if id != own => Err(AppError::forbidden("Company outside your scope")),
            _ => Ok(Some(own)),
        }
    }

    pub fn require_company_access(&self, company_id: u64) -> Result<(), AppError> {
        self.company_scope(Some(company_id)).map(|_| ())
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected routes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match bearer_token(req) {
            Some(t) => t,
            None => return ready(Err(AppError::Unauthorized("Missing token".into()).into())),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(AppError::Internal("Config missing".into()).into())),
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(AppError::Unauthorized("Invalid token".into()).into())),
        };

        ready(AuthUser::from_claims(claims).map_err(Into::into))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: Vec<Role>, company_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "u".into(),
            roles,
            employee_id: None,
            company_id,
        }
    }

    #[test]
    fn platform_admin_picks_any_company() {
        let admin = user(vec![Role::Admin], None);
        assert_eq!(admin.company_scope(Some(9)).unwrap(), Some(9));
        assert_eq!(admin.company_scope(None).unwrap(), None);
    }

    #[test]
    fn hr_is_pinned_to_own_company() {
        let hr = user(vec![Role::Hr], Some(3));
        assert_eq!(hr.company_scope(None).unwrap(), Some(3));
        assert_eq!(hr.company_scope(Some(3)).unwrap(), Some(3));
        assert!(hr.company_scope(Some(4)).is_err());
    }

    #[test]
    fn refresh_tokens_are_not_access() {
        let claims = Claims {
            user_id: 1,
            sub: "u".into(),
            roles: vec![1],
            exp: 0,
            jti: "j".into(),
            token_type: TokenType::Refresh,
            employee_id: None,
            company_id: None,
        };
        assert!(AuthUser::from_claims(claims).is_err());
    }

    #[test]
    fn unknown_roles_are_dropped() {
        let claims = Claims {
            user_id: 1,
            sub: "u".into(),
            roles: vec![3, 99],
            exp: 0,
            jti: "j".into(),
            token_type: TokenType::Access,
            employee_id: Some(5),
            company_id: Some(1),
        };
        let user = AuthUser::from_claims(claims).unwrap();
        assert_eq!(user.roles, vec![Role::Employee]);
        assert_eq!(user.require_employee().unwrap(), 5);
    }
}
