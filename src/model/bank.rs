use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Bank {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Bancolombia")]
    pub name: String,
    #[schema(example = "007")]
    pub code: String,
    pub is_active: bool,
}
