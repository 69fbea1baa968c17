pub mod advance;
pub mod bank;
pub mod company;
pub mod debt;
pub mod employee;
pub mod indicator;
pub mod role;
pub mod tax;
pub mod user;

/// Lets `#[sqlx(try_from = "String")]` decode VARCHAR columns into strum enums.
macro_rules! string_column {
    ($($ty:ty),* $(,)?) => {$(
        impl TryFrom<String> for $ty {
            type Error = strum::ParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    )*};
}

string_column!(
    advance::AdvanceStatus,
    advance::PaymentMethod,
    advance::Actor,
    company::PayFrequency,
    employee::EmployeeStatus,
    tax::FeeKind,
);
