use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UserReq {
    #[schema(example = "ana.rios")]
    pub username: String,
    pub password: String,
    /// Role ids: 1 admin, 2 hr, 3 employee
    #[schema(example = json!([3]))]
    pub roles: Vec<u8>,
    /// Links the login to an employee; its company is taken from the employee.
    pub employee_id: Option<u64>,
    /// Company of an HR user without an employee record.
    pub company_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    pub username: String,
    pub password: String
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub roles: Vec<u8>,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
    /// Absent for platform administrators
    pub company_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
