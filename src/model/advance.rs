use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::model::tax::FeeKind;

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
pub enum AdvanceStatus {
    Requested,
    Approved,
    Rejected,
    Cancelled,
    Paid,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Settled in fiat to the employee's bank account.
    BankAccount,
    /// Settled in crypto to the employee's wallet.
    CryptoWallet,
}

/// Who performed a status change.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Actor {
    Employee,
    Admin,
}

/// Row shared by `payroll_advances` and `premium_advances`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 10,
        "employee_id": 1,
        "company_id": 1,
        "company_debt_id": 4,
        "requested_amount": "100000.00",
        "total_amount": "107500.00",
        "status": "REQUESTED",
        "payment_method": "BANK_ACCOUNT",
        "reason": "Medical bill",
        "payment_date": "2026-01-31",
        "payment_term": 16,
        "paid_at": null,
        "created_at": "2026-01-15T10:00:00Z"
    })
)]
pub struct Advance {
    pub id: u64,
    pub employee_id: u64,
    pub company_id: u64,
    pub company_debt_id: u64,
    #[schema(value_type = String)]
    pub requested_amount: Decimal,
    /// Requested amount plus every fee evaluated when the advance was created.
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    #[sqlx(try_from = "String")]
    pub status: AdvanceStatus,
    #[sqlx(try_from = "String")]
    pub payment_method: PaymentMethod,
    pub reason: Option<String>,
    #[schema(value_type = String, format = "date")]
    pub payment_date: NaiveDate,
    /// Days between the request and the payment date.
    pub payment_term: u16,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub paid_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AdvanceHistory {
    pub id: u64,
    pub advance_id: u64,
    #[sqlx(try_from = "String")]
    pub status: AdvanceStatus,
    #[sqlx(try_from = "String")]
    pub actor: Actor,
    pub actor_user_id: Option<u64>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

/// Fee snapshot taken when the advance was created.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AdvanceTax {
    pub id: u64,
    pub advance_id: u64,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub kind: FeeKind,
    #[schema(value_type = String)]
    pub rate: Decimal,
    #[schema(value_type = String)]
    pub amount: Decimal,
}
