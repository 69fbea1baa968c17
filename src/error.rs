use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde::Serialize;
use sqlx::error::ErrorKind;

use crate::model::advance::AdvanceStatus;

/// Every handler error ends up here and is rendered as
/// `{ "errorData": { "message": ..., "redirect": ... } }`.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "cannot move advance from {} to {}", from, to)]
    InvalidTransition {
        from: AdvanceStatus,
        to: AdvanceStatus,
    },

    #[display(fmt = "{}", _0)]
    Unauthorized(String),

    #[display(fmt = "{}", _0)]
    Forbidden(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),

    #[display(fmt = "internal error: {}", _0)]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Serialize)]
struct ErrorData<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'a str>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    #[serde(rename = "errorData")]
    error_data: ErrorData<'a>,
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    /// Where the dashboard should send the user after this error.
    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            AppError::Unauthorized(_) => Some("/login"),
            AppError::Forbidden(_) => Some("/unauthorized"),
            AppError::NotFound(_) => Some("/dashboard"),
            _ => None,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Internal Server Error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error_data: ErrorData {
                message,
                redirect: self.redirect(),
            },
        })
    }
}

/// Column named in a MySQL foreign key message such as
/// "... FOREIGN KEY (`bank_id`) REFERENCES `banks` (`id`))".
fn foreign_key_column(message: &str) -> Option<&str> {
    let rest = &message[message.find("FOREIGN KEY (`")? + "FOREIGN KEY (`".len()..];
    rest.split('`').next().filter(|c| !c.is_empty())
}

fn constraint_error(kind: ErrorKind, message: &str) -> Option<AppError> {
    match kind {
        ErrorKind::UniqueViolation => Some(AppError::Conflict("Record already exists".into())),
        ErrorKind::ForeignKeyViolation => Some(AppError::Validation(
            match foreign_key_column(message) {
                Some(column) => format!("Referenced {column} does not exist"),
                None => "Referenced record does not exist".to_string(),
            },
        )),
        _ => None,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if let Some(mapped) = constraint_error(db_err.kind(), db_err.message()) {
                return mapped;
            }
        }
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            other => AppError::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn forbidden_carries_redirect() {
        let (status, body) = body_json(AppError::forbidden("Missing permission ADVANCE_PAY")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["errorData"]["message"], "Missing permission ADVANCE_PAY");
        assert_eq!(body["errorData"]["redirect"], "/unauthorized");
    }

    #[actix_web::test]
    async fn validation_has_no_redirect() {
        let (status, body) = body_json(AppError::validation("amount must be positive")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errorData"].get("redirect").is_none());
    }

    #[actix_web::test]
    async fn invalid_transition_is_bad_request() {
        let err = AppError::InvalidTransition {
            from: AdvanceStatus::Paid,
            to: AdvanceStatus::Cancelled,
        };
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["errorData"]["message"],
            "cannot move advance from PAID to CANCELLED"
        );
    }

    #[actix_web::test]
    async fn database_errors_are_hidden() {
        let (status, body) = body_json(AppError::Database(sqlx::Error::PoolTimedOut)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errorData"]["message"], "Internal Server Error");
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.redirect(), Some("/dashboard"));
    }

    #[test]
    fn duplicate_key_is_conflict() {
        let err = constraint_error(
            ErrorKind::UniqueViolation,
            "Duplicate entry '900123456-7' for key 'companies.nit'",
        )
        .unwrap();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Record already exists");
    }

    #[test]
    fn missing_reference_is_validation() {
        let err = constraint_error(
            ErrorKind::ForeignKeyViolation,
            "Cannot add or update a child row: a foreign key constraint fails \
             (`hr`.`employees`, CONSTRAINT `employees_ibfk_2` FOREIGN KEY (`bank_id`) \
             REFERENCES `banks` (`id`))",
        )
        .unwrap();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Referenced bank_id does not exist");

        let bare = constraint_error(ErrorKind::ForeignKeyViolation, "constraint fails").unwrap();
        assert_eq!(bare.to_string(), "Referenced record does not exist");
    }

    #[test]
    fn other_constraints_stay_internal() {
        assert!(constraint_error(ErrorKind::CheckViolation, "check failed").is_none());
        assert!(constraint_error(ErrorKind::Other, "deadlock").is_none());
    }
}
