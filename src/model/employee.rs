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
pub enum EmployeeStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "company_id": 1,
        "document_number": "1020304050",
        "first_name": "John",
        "last_name": "Doe",
        "email": "john.doe@company.com",
        "phone": "+573001234567",
        "salary": "3000000.00",
        "bank_id": 1,
        "bank_account_number": "12345678901",
        "wallet_address": null,
        "status": "ACTIVE",
        "created_at": "2026-01-01T00:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub company_id: u64,

    #[schema(example = "1020304050")]
    pub document_number: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    #[schema(example = "+573001234567", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "3000000.00", value_type = String)]
    pub salary: Decimal,

    #[schema(example = 1, nullable = true)]
    pub bank_id: Option<u64>,

    #[schema(example = "12345678901", nullable = true)]
    pub bank_account_number: Option<String>,

    #[schema(nullable = true)]
    pub wallet_address: Option<String>,

    #[sqlx(try_from = "String")]
    pub status: EmployeeStatus,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }
}
