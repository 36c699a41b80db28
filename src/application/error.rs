use thiserror::Error;

use crate::domain::{AccountId, FieldError};

use super::ResponseMessage;

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed input, detected before anything is written
    #[error("Invalid input: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account {0} is already linked to this user")]
    DuplicateLink(AccountId),

    #[error("Account {0} is not linked to this user")]
    AccountNotLinked(AccountId),

    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),

    /// The store could not be read or written. Nothing partial was committed.
    #[error("Store unavailable: {0:#}")]
    Unavailable(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        tracing::error!("store operation failed: {error:#}");
        AppError::Unavailable(error)
    }
}

impl From<Vec<FieldError>> for AppError {
    fn from(errors: Vec<FieldError>) -> Self {
        AppError::Validation(errors)
    }
}

impl AppError {
    /// HTTP status an API layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_)
            | AppError::UserAlreadyExists(_)
            | AppError::DuplicateLink(_)
            | AppError::AccountNotLinked(_) => 400,
            AppError::Unauthorized(_) => 401,
            AppError::UserNotFound(_)
            | AppError::AccountNotFound(_)
            | AppError::ExpenseNotFound(_) => 404,
            AppError::Unavailable(_) => 503,
        }
    }

    /// Client-facing message: the field list for validation failures and a
    /// single sentence otherwise. Store details stay in the logs.
    pub fn message(&self) -> ResponseMessage {
        match self {
            AppError::Validation(errors) => ResponseMessage::Fields(errors.clone()),
            AppError::Unavailable(_) => {
                ResponseMessage::Text("Something went wrong, please try again later.".into())
            }
            other => ResponseMessage::Text(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::domain::Field;

    #[test]
    fn test_status_codes() {
        let id = Uuid::new_v4();
        assert_eq!(AppError::Validation(vec![]).status_code(), 400);
        assert_eq!(AppError::DuplicateLink(id).status_code(), 400);
        assert_eq!(AppError::AccountNotLinked(id).status_code(), 400);
        assert_eq!(AppError::Unauthorized("a@b.c".into()).status_code(), 401);
        assert_eq!(AppError::UserNotFound("x".into()).status_code(), 404);
        assert_eq!(
            AppError::Unavailable(anyhow::anyhow!("disk I/O error")).status_code(),
            503
        );
    }

    #[test]
    fn test_validation_message_is_a_field_list() {
        let error = AppError::Validation(vec![
            FieldError::new(Field::Credit, "credit must not be negative"),
            FieldError::new(Field::Category, "category cannot be empty"),
        ]);

        assert_eq!(
            error.to_string(),
            "Invalid input: credit: credit must not be negative, category: category cannot be empty"
        );
        match error.message() {
            ResponseMessage::Fields(fields) => assert_eq!(fields.len(), 2),
            ResponseMessage::Text(text) => panic!("expected field list, got {text}"),
        }
    }

    #[test]
    fn test_unavailable_hides_store_details() {
        let error = AppError::Unavailable(anyhow::anyhow!("database is locked"));
        assert_eq!(
            error.message(),
            ResponseMessage::Text("Something went wrong, please try again later.".into())
        );
    }
}
