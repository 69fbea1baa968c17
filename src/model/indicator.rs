use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Economic reference value (minimum wage, UVT, exchange rate...) that
/// administrators publish with a validity start date.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Indicator {
    pub id: u64,
    #[schema(example = "SMMLV")]
    pub code: String,
    #[schema(example = "Minimum monthly wage")]
    pub name: String,
    #[schema(example = "1423500.0000", value_type = String)]
    pub value: Decimal,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub valid_from: NaiveDate,
}
