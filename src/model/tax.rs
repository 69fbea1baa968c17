use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeKind {
    /// `value` is a fixed amount.
    Flat,
    /// `value` is a percentage of the requested amount.
    Percentage,
}

/// Applies to every advance on the platform.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct GlobalTax {
    pub id: u64,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub kind: FeeKind,
    #[schema(value_type = String, example = "2.50")]
    pub value: Decimal,
    pub is_active: bool,
}

/// Applies to every advance of one company.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CompanyTax {
    pub id: u64,
    pub company_id: u64,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub kind: FeeKind,
    #[schema(value_type = String, example = "5000.00")]
    pub value: Decimal,
    pub is_active: bool,
}

/// Transfer fee charged when the advance is paid into an account of this bank.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct BankFee {
    pub id: u64,
    pub bank_id: u64,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub kind: FeeKind,
    #[schema(value_type = String, example = "7500.00")]
    pub value: Decimal,
}
