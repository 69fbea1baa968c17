use crate::advance::service::{AdvanceFilter, NewAdvanceRequest};
use crate::advance::status::Subaction;
use crate::api::advance::{AdvanceDetail, AdvanceListResponse, TransitionReq};
use crate::api::company::CompanyListResponse;
use crate::api::employee::EmployeeListResponse;
use crate::api::permission::{PermissionChange, PermissionGrant};
use crate::auth::handlers::LoginResponse;
use crate::model::advance::{Actor, Advance, AdvanceHistory, AdvanceStatus, AdvanceTax, PaymentMethod};
use crate::model::bank::Bank;
use crate::model::company::{Company, PayFrequency};
use crate::model::debt::{CompanyDebt, CompanyDebtPart};
use crate::model::employee::{Employee, EmployeeStatus};
use crate::model::indicator::Indicator;
use crate::model::role::Role;
use crate::model::tax::{BankFee, CompanyTax, FeeKind, GlobalTax};
use crate::models::{LoginReqDto, UserReq};
use crate::permission::PermissionCode;
use crate::service::bank::BankReq;
use crate::service::company::{CreateCompany, UpdateCompany};
use crate::service::debt::DebtDetail;
use crate::service::employee::{CreateEmployee, UpdateEmployee};
use crate::service::indicator::IndicatorReq;
use crate::service::tax::FeeReq;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Salary Advance API",
        version = "1.0.0",
        description = r#"
## Salary advances for companies and their employees

Employees request part of their upcoming salary (**payroll advances**) or of
their accrued semester bonus (**premium advances**). Company HR approves,
rejects or cancels requests and platform administrators mark them paid.

### Key features
- **Advances**: request, approve, reject, cancel, pay and an audit history of every status change
- **Fees**: global taxes, company taxes and bank fees snapshotted on each advance
- **Company debt**: monthly totals owed by each company, split into fiat and crypto
- **Administration**: companies, employees, banks, indicators and role permissions

### Security
Every `/dashboard` endpoint requires a **JWT Bearer** access token and the
permission code listed in its description.

### Errors
Failures are returned as `{ "errorData": { "message": ..., "redirect": ... } }`.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::advance::list_payroll_advances,
        crate::api::advance::request_payroll_advance,
        crate::api::advance::get_payroll_advance,
        crate::api::advance::payroll_advance_history,
        crate::api::advance::update_payroll_advance,

        crate::api::advance::list_premium_advances,
        crate::api::advance::request_premium_advance,
        crate::api::advance::get_premium_advance,
        crate::api::advance::premium_advance_history,
        crate::api::advance::update_premium_advance,

        crate::api::company::create_company,
        crate::api::company::list_companies,
        crate::api::company::get_company,
        crate::api::company::update_company,
        crate::api::company::deactivate_company,
        crate::api::company::list_company_taxes,
        crate::api::company::create_company_tax,
        crate::api::company::delete_company_tax,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::debt::list_company_debts,
        crate::api::debt::get_debt,

        crate::api::tax::list_global_taxes,
        crate::api::tax::create_global_tax,
        crate::api::tax::delete_global_tax,
        crate::api::tax::get_bank_fee,
        crate::api::tax::set_bank_fee,

        crate::api::bank::list_banks,
        crate::api::bank::create_bank,
        crate::api::bank::get_bank,
        crate::api::bank::update_bank,

        crate::api::indicator::list_indicators,
        crate::api::indicator::current_indicator,
        crate::api::indicator::create_indicator,
        crate::api::indicator::delete_indicator,

        crate::api::permission::list_permissions,
        crate::api::permission::grant_permission,
        crate::api::permission::revoke_permission
    ),
    components(
        schemas(
            UserReq,
            LoginReqDto,
            LoginResponse,
            Role,
            PermissionCode,
            PermissionGrant,
            PermissionChange,
            Advance,
            AdvanceDetail,
            AdvanceHistory,
            AdvanceTax,
            AdvanceStatus,
            AdvanceFilter,
            AdvanceListResponse,
            Actor,
            PaymentMethod,
            NewAdvanceRequest,
            Subaction,
            TransitionReq,
            Company,
            PayFrequency,
            CreateCompany,
            UpdateCompany,
            CompanyListResponse,
            Employee,
            EmployeeStatus,
            CreateEmployee,
            UpdateEmployee,
            EmployeeListResponse,
            CompanyDebt,
            CompanyDebtPart,
            DebtDetail,
            FeeKind,
            FeeReq,
            GlobalTax,
            CompanyTax,
            BankFee,
            Bank,
            BankReq,
            Indicator,
            IndicatorReq
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, token refresh and user registration"),
        (name = "Payroll advances", description = "Advances on the next salary payment"),
        (name = "Premium advances", description = "Advances on the semester bonus"),
        (name = "Company", description = "Company management and company taxes"),
        (name = "Employee", description = "Employee management"),
        (name = "Debt", description = "Monthly company debt"),
        (name = "Tax", description = "Global taxes and bank fees"),
        (name = "Bank", description = "Payout banks"),
        (name = "Indicator", description = "Economic indicators"),
        (name = "Permission", description = "Role permissions"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
