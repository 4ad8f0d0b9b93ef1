use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("invalid transition from {from} to {requested}")]
    InvalidTransition {
        from: &'static str,
        requested: &'static str,
    },

    #[error("trip has already been accepted")]
    AlreadyAccepted,

    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("environment variable error")]
    Var(#[from] env::VarError),

    #[error("authorization engine error")]
    Authorizor(#[from] oso::OsoError),

    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code, also used by clients to tell an accept
    /// race loss apart from a generic conflict.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::AlreadyAccepted => "already_accepted",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Delivery(_) => "delivery",
            Self::Database(_) => "database",
            Self::Var(_) => "config",
            Self::Authorizor(_) => "authorizor",
            Self::Internal(_) => "internal",
        }
    }

    /// True for Postgres unique-constraint violations (SQLSTATE 23505),
    /// the signal settlement uses to retry reference allocation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::Database(db)) => db.code().as_deref() == Some("23505"),
            _ => false,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidTransition { .. } | Self::AlreadyAccepted => StatusCode::CONFLICT,
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Delivery(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // internal errors keep their detail out of the response body
        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "internal server error".to_string(),
            _ => self.to_string(),
        };

        let body = Json(json!({
            "code": self.kind(),
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    #[derive(Debug)]
    struct DuplicateKey;

    impl std::fmt::Display for DuplicateKey {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "duplicate key value violates unique constraint")
        }
    }

    impl std::error::Error for DuplicateKey {}

    impl sqlx::error::DatabaseError for DuplicateKey {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some("23505".into())
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    pub(crate) fn unique_violation() -> super::Error {
        super::Error::Database(sqlx::Error::Database(Box::new(DuplicateKey)))
    }
}
