//! Error conversions
//!
//! Maps SQLite failures to [`AppError`] and renders [`AppError`] as an
//! RFC 7807 problem document.

#[cfg(any(feature = "sqlx", feature = "axum"))]
use super::app_error::AppError;

// ============================================================================
// SQLx conversions (feature-gated)
// ============================================================================

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        use super::kind::ErrorKind;
        use sqlx::error::ErrorKind as DbErrorKind;

        let (kind, message) = match &err {
            sqlx::Error::RowNotFound => (ErrorKind::NotFound, "Record not found"),
            sqlx::Error::PoolTimedOut => (
                ErrorKind::ServiceUnavailable,
                "Database connection pool exhausted",
            ),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                DbErrorKind::UniqueViolation => (ErrorKind::Conflict, "Duplicate key value"),
                DbErrorKind::ForeignKeyViolation => (ErrorKind::Conflict, "Foreign key violation"),
                DbErrorKind::NotNullViolation => (ErrorKind::BadRequest, "Required field is null"),
                DbErrorKind::CheckViolation => (ErrorKind::BadRequest, "Check constraint violation"),
                // SQLite result codes, https://www.sqlite.org/rescode.html
                _ => match db_err.code().as_deref() {
                    // SQLITE_BUSY / SQLITE_BUSY_SNAPSHOT / SQLITE_LOCKED
                    Some("5") | Some("517") | Some("6") => {
                        (ErrorKind::ServiceUnavailable, "Database is locked")
                    }
                    // SQLITE_READONLY / SQLITE_FULL
                    Some("8") | Some("13") => {
                        (ErrorKind::ServiceUnavailable, "Database is not writable")
                    }
                    _ => (ErrorKind::InternalServerError, "Database error"),
                },
            },
            sqlx::Error::Io(_) => (ErrorKind::ServiceUnavailable, "Database file error"),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => (
                ErrorKind::InternalServerError,
                "Stored record could not be decoded",
            ),
            _ => (ErrorKind::InternalServerError, "Database error"),
        };

        AppError::new(kind, message).with_source(err)
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // RFC 7807 Problem Details for HTTP APIs
        let body = serde_json::json!({
            "type": format!("https://httpstatuses.io/{}", self.status_code()),
            "title": self.kind().as_str(),
            "status": self.status_code(),
            "detail": self.message(),
            "action": self.action(),
            "retryable": self.is_retryable(),
        });

        (status, Json(body)).into_response()
    }
}
