use crate::{
    advance::AdvanceKind,
    api::{advance, bank, company, debt, employee, indicator, permission, tax},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Per-IP limiter allowing `requests_per_min` with a burst of the same size.
fn build_limiter(requests_per_min: u32) -> Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request((60_000 / per_min as u64).max(1))
        .burst_size(per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Arc::new(Governor::new(&cfg))
}

fn advance_routes(kind: AdvanceKind) -> actix_web::Scope {
    let (path, list, request, get, history, update) = match kind {
        AdvanceKind::Payroll => (
            "/payroll-advances",
            web::get().to(advance::list_payroll_advances),
            web::post().to(advance::request_payroll_advance),
            web::get().to(advance::get_payroll_advance),
            web::get().to(advance::payroll_advance_history),
            web::put().to(advance::update_payroll_advance),
        ),
        AdvanceKind::Premium => (
            "/premium-advances",
            web::get().to(advance::list_premium_advances),
            web::post().to(advance::request_premium_advance),
            web::get().to(advance::get_premium_advance),
            web::get().to(advance::premium_advance_history),
            web::put().to(advance::update_premium_advance),
        ),
    };

    web::scope(path)
        .service(web::resource("").route(list).route(request))
        .service(web::resource("/{id}").route(get).route(update))
        .service(web::resource("/{id}/history").route(history))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = build_limiter(config.rate_login_per_min);
    let register_limiter = build_limiter(config.rate_register_per_min);
    let refresh_limiter = build_limiter(config.rate_refresh_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter)
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter)
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(advance_routes(AdvanceKind::Payroll))
            .service(advance_routes(AdvanceKind::Premium))
            .service(
                web::scope("/companies")
                    .service(
                        web::resource("")
                            .route(web::post().to(company::create_company))
                            .route(web::get().to(company::list_companies)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(company::get_company))
                            .route(web::put().to(company::update_company))
                            .route(web::delete().to(company::deactivate_company)),
                    )
                    .service(
                        web::resource("/{id}/taxes")
                            .route(web::get().to(company::list_company_taxes))
                            .route(web::post().to(company::create_company_tax)),
                    )
                    .service(
                        web::resource("/{id}/taxes/{tax_id}")
                            .route(web::delete().to(company::delete_company_tax)),
                    )
                    .service(
                        web::resource("/{id}/debts")
                            .route(web::get().to(debt::list_company_debts)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(web::resource("/debts/{id}").route(web::get().to(debt::get_debt)))
            .service(
                web::scope("/taxes")
                    .service(
                        web::resource("")
                            .route(web::get().to(tax::list_global_taxes))
                            .route(web::post().to(tax::create_global_tax)),
                    )
                    .service(
                        web::resource("/{id}").route(web::delete().to(tax::delete_global_tax)),
                    ),
            )
            .service(
                web::scope("/banks")
                    .service(
                        web::resource("")
                            .route(web::get().to(bank::list_banks))
                            .route(web::post().to(bank::create_bank)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(bank::get_bank))
                            .route(web::put().to(bank::update_bank)),
                    )
                    .service(
                        web::resource("/{id}/fee")
                            .route(web::get().to(tax::get_bank_fee))
                            .route(web::put().to(tax::set_bank_fee)),
                    ),
            )
            .service(
                web::scope("/indicators")
                    .service(
                        web::resource("")
                            .route(web::get().to(indicator::list_indicators))
                            .route(web::post().to(indicator::create_indicator)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::delete().to(indicator::delete_indicator)),
                    )
                    .service(
                        web::resource("/{code}/current")
                            .route(web::get().to(indicator::current_indicator)),
                    ),
            )
            .service(
                web::resource("/permissions")
                    .route(web::get().to(permission::list_permissions))
                    .route(web::post().to(permission::grant_permission))
                    .route(web::delete().to(permission::revoke_permission)),
            ),
    );
}

// LOGIN
//  ├─ access_token
//  └─ refresh_token

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns a new pair, the old refresh token is revoked
