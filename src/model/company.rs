use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, EnumString, Display, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PayFrequency {
    /// Paid on the last day of the month.
    Monthly,
    /// Paid on the 15th and on the last day of the month.
    Biweekly,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Acme S.A.S",
        "nit": "900123456-7",
        "max_salary_percentage": "50.00",
        "min_request_amount": "50000.00",
        "request_start_day": 1,
        "request_end_day": 25,
        "pay_frequency": "MONTHLY",
        "is_active": true,
        "created_at": "2026-01-01T00:00:00Z"
    })
)]
pub struct Company {
    pub id: u64,
    pub name: String,
    /// Tax identification number.
    pub nit: String,
    /// Share of the salary an employee may have outstanding in advances.
    #[schema(value_type = String)]
    pub max_salary_percentage: Decimal,
    #[schema(value_type = String)]
    pub min_request_amount: Decimal,
    /// First day of the month on which requests are accepted.
    pub request_start_day: u8,
    /// Last day of the month on which requests are accepted.
    pub request_end_day: u8,
    #[sqlx(try_from = "String")]
    pub pay_frequency: PayFrequency,
    pub is_active: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}
