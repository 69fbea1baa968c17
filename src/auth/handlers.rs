use crate::{
    auth::{
        auth::AuthUser,
        jwt::{TokenSubject, generate_access_token, generate_refresh_token, verify_token},
        password::{hash_password, verify_password},
    },
    config::Config,
    error::{AppError, AppResult},
    model::{role::Role, user::User},
    models::{LoginReqDto, TokenType, UserReq},
    permission::{self, PermissionCode},
    service::employee as employee_service,
};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

async fn load_roles(pool: &MySqlPool, user_id: u64) -> AppResult<Vec<u8>> {
    let roles = sqlx::query_scalar::<_, u8>(
        "SELECT role_id FROM user_roles WHERE user_id = ? ORDER BY role_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(roles)
}

async fn find_user(pool: &MySqlPool, username: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password, employee_id, company_id, is_active
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

fn subject_for(user: &User, roles: Vec<u8>) -> TokenSubject {
    TokenSubject {
        user_id: user.id,
        username: user.username.clone(),
        roles,
        employee_id: user.employee_id,
        company_id: user.company_id,
    }
}

fn token_error(e: jsonwebtoken::errors::Error) -> AppError {
    AppError::Internal(format!("token encoding failed: {e}"))
}

async fn store_refresh_token(
    pool: &MySqlPool,
    user_id: u64,
    jti: &str,
    exp: usize,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user_id)
    .bind(jti)
    .bind(exp as i64)
    .execute(pool)
    .await?;
    Ok(())
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

/// Creates a login for an employee, an HR manager or a platform admin.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = UserReq,
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Missing USER_MANAGE"),
        (status = 409, description = "Username already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
#[instrument(name = "auth_register", skip(auth, pool, user), fields(username = %user.username))]
pub async fn register(
    auth: AuthUser,
    user: web::Json<UserReq>,
    pool: web::Data<MySqlPool>,
) -> AppResult<HttpResponse> {
    permission::check(&pool, &auth, PermissionCode::UserManage).await?;

    let username = user.username.trim().to_lowercase();
    if username.is_empty() || user.password.is_empty() {
        return Err(AppError::validation("Username and password must not be empty"));
    }

    let roles: Vec<Role> = user.roles.iter().filter_map(|id| Role::from_id(*id)).collect();
    if roles.is_empty() || roles.len() != user.roles.len() {
        return Err(AppError::validation("At least one valid role is required"));
    }
    if roles.contains(&Role::Admin) && !auth.is_platform_admin() {
        return Err(AppError::forbidden("Only platform admins can create admins"));
    }

    // an employee login always belongs to the employee's company
    let company_id = match user.employee_id {
        Some(employee_id) => Some(employee_service::get(&pool, employee_id).await?.company_id),
        None => user.company_id,
    };
    if let Some(company_id) = company_id {
        auth.require_company_access(company_id)?;
    } else if !auth.is_platform_admin() {
        return Err(AppError::forbidden("Company outside your scope"));
    }

    let hashed = hash_password(&user.password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

    let mut tx = pool.begin().await?;

    let user_id = sqlx::query(
        r#"
        INSERT INTO users (username, password, employee_id, company_id)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&username)
    .bind(&hashed)
    .bind(user.employee_id)
    .bind(company_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict("Username already taken".into()),
        other => other,
    })?
    .last_insert_id();

    for role in &roles {
        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(role.id())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    info!(user_id, "User registered");

    Ok(HttpResponse::Created().json(json!({
        "message": "User registered successfully",
        "id": user_id
    })))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(AppError::validation("Username or password required"));
    }

    debug!("Fetching user from database");

    let username = user.username.trim().to_lowercase();
    let db_user = match find_user(&pool, &username).await? {
        Some(u) if u.is_active => u,
        _ => {
            info!("Invalid credentials: user not found or inactive");
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let subject = subject_for(&db_user, load_roles(&pool, db_user.id).await?);

    let access_token =
        generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl)
            .map_err(token_error)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl)
            .map_err(token_error)?;

    debug!(user_id = db_user.id, jti = %refresh_claims.jti, "Storing refresh token");
    store_refresh_token(&pool, db_user.id, &refresh_claims.jti, refresh_claims.exp).await?;

    // non-fatal
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(db_user.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!("Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
    }))
}

fn bearer(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned)
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, body = LoginResponse),
        (status = 401, description = "Refresh token invalid, revoked or expired")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let unauthorized = || AppError::Unauthorized("Invalid refresh token".into());

    let token = bearer(&req).ok_or_else(unauthorized)?;
    let claims = verify_token(&token, &config.jwt_secret).map_err(|_| unauthorized())?;
    if claims.token_type != TokenType::Refresh {
        return Err(unauthorized());
    }

    let mut tx = pool.begin().await?;

    // revoke the presented token; a second use finds nothing to revoke
    let revoked = sqlx::query(
        "UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ? AND revoked = FALSE",
    )
    .bind(&claims.jti)
    .execute(&mut *tx)
    .await?;
    if revoked.rows_affected() == 0 {
        return Err(unauthorized());
    }

    let db_user = sqlx::query_as::<_, User>(
        "SELECT id, username, password, employee_id, company_id, is_active FROM users WHERE id = ?",
    )
    .bind(claims.user_id)
    .fetch_optional(&mut *tx)
    .await?
    .filter(|u| u.is_active)
    .ok_or_else(unauthorized)?;

    tx.commit().await?;

    // roles may have changed since the last login
    let subject = subject_for(&db_user, load_roles(&pool, db_user.id).await?);

    let (new_refresh_token, new_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl)
            .map_err(token_error)?;
    store_refresh_token(&pool, db_user.id, &new_claims.jti, new_claims.exp).await?;

    let access_token =
        generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl)
            .map_err(token_error)?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token: new_refresh_token,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Refresh token revoked")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    let Some(token) = bearer(&req) else {
        return HttpResponse::NoContent().finish();
    };

    // only refresh tokens can logout
    let claims = match verify_token(&token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    // idempotent
    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = 1 WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}
