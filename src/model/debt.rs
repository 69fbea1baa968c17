use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What a company owes for the advances falling due in one month.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CompanyDebt {
    pub id: u64,
    pub company_id: u64,
    pub month: u8,
    pub year: u16,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    #[schema(value_type = String)]
    pub paid_amount: Decimal,
}

/// Fiat or crypto share of a [`CompanyDebt`].
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CompanyDebtPart {
    pub id: u64,
    pub company_debt_id: u64,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    #[schema(value_type = String)]
    pub paid_amount: Decimal,
}
