use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// The one message both failed-login paths share, so an unknown username and a
/// wrong password are indistinguishable to the caller.
pub const BAD_CREDENTIALS: &str = "Incorrect username or password.";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Action has failed due to some validation errors")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    Authentication(&'static str),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_credentials() -> Self {
        AppError::Authentication(BAD_CREDENTIALS)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            fields: Option<Vec<FieldError>>,
        }

        let (status, message, fields) = match self {
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                "Action has failed due to some validation errors".to_string(),
                Some(fields),
            ),
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg.to_string(), None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            AppError::Internal(err) => {
                // log the cause chain, never leak it to the client
                error!(error = ?err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                fields,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_error_kinds() {
        let cases = [
            (
                AppError::Validation(vec![FieldError::new("name", "Name cannot be empty")]),
                StatusCode::BAD_REQUEST,
            ),
            (AppError::bad_credentials(), StatusCode::UNAUTHORIZED),
            (
                AppError::Forbidden("not yours".into()),
                StatusCode::FORBIDDEN,
            ),
            (AppError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("taken".into()), StatusCode::CONFLICT),
            (
                AppError::Internal(anyhow::anyhow!("pool exhausted")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn bad_credentials_message_is_generic() {
        let err = AppError::bad_credentials();
        assert_eq!(err.to_string(), BAD_CREDENTIALS);
    }

    #[tokio::test]
    async fn internal_error_body_hides_cause() {
        let response =
            AppError::Internal(anyhow::anyhow!("connection refused (127.0.0.1:5432)"))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("Internal server error"));
        assert!(!body.contains("5432"));
    }

    #[tokio::test]
    async fn validation_body_lists_every_field() {
        let response = AppError::Validation(vec![
            FieldError::new("username", "A username is required."),
            FieldError::new("email", "Provide a valid email address."),
        ])
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("A username is required."));
        assert!(body.contains("Provide a valid email address."));
    }
}
