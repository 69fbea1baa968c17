use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

fn reject(req: ServiceRequest, err: AppError) -> Result<ServiceResponse<BoxBody>, Error> {
    tracing::debug!(path = req.path(), error = %err, "Rejected unauthenticated request");
    let resp = err.error_response();
    Ok(req.into_response(resp))
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| AppError::Internal("App config missing".into()))?;

    let header_value = match req.headers().get("Authorization") {
        Some(h) => match h.to_str() {
            Ok(v) => v.to_owned(),
            Err(_) => {
                return reject(
                    req,
                    AppError::Unauthorized("Invalid Authorization header encoding".into()),
                );
            }
        },
        None => {
            return reject(req, AppError::Unauthorized("Missing Authorization header".into()));
        }
    };

    let token = match header_value.strip_prefix("Bearer ") {
        Some(t) => t,
        None => {
            return reject(
                req,
                AppError::Unauthorized("Authorization header must start with Bearer".into()),
            );
        }
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => {
            return reject(req, AppError::Unauthorized("Invalid or expired token".into()));
        }
    };

    let auth_user = match AuthUser::from_claims(claims) {
        Ok(u) => u,
        Err(e) => return reject(req, e),
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{TokenSubject, generate_access_token, generate_refresh_token};
    use actix_web::{App, HttpResponse, http::StatusCode, middleware::from_fn, test, web};

    fn config() -> Config {
        Config {
            database_url: "mysql://localhost/test".into(),
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 60,
            refresh_token_ttl: 120,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/dashboard".into(),
            log_dir: "logs".into(),
            permission_cache_ttl: 300,
        }
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: 9,
            username: "hr.user".into(),
            roles: vec![2],
            employee_id: None,
            company_id: Some(1),
        }
    }

    async fn whoami(user: AuthUser) -> HttpResponse {
        HttpResponse::Ok().body(user.username)
    }

    macro_rules! app {
        () => {
            test::init_service(
                App::new().app_data(Data::new(config())).service(
                    web::scope("/dashboard")
                        .wrap(from_fn(auth_middleware))
                        .route("/me", web::get().to(whoami)),
                ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn missing_header_is_401_with_login_redirect() {
        let app = app!();
        let req = test::TestRequest::get().uri("/dashboard/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["errorData"]["message"], "Missing Authorization header");
        assert_eq!(body["errorData"]["redirect"], "/login");
    }

    #[actix_web::test]
    async fn refresh_token_cannot_call_api() {
        let app = app!();
        let (token, _) = generate_refresh_token(&subject(), "test-secret", 60).unwrap();
        let req = test::TestRequest::get()
            .uri("/dashboard/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn valid_token_reaches_handler() {
        let app = app!();
        let token = generate_access_token(&subject(), "test-secret", 60).unwrap();
        let req = test::TestRequest::get()
            .uri("/dashboard/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body.as_ref(), b"hr.user");
    }
}
