//! Tracker Error Types
//!
//! Tracker-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use kernel::id::TicketId;
use thiserror::Error;

use crate::domain::draw_source::DrawSourceError;
use crate::domain::value_object::{lottery_numbers::NumbersError, ticket_status::TicketStatus};

/// Tracker-specific result type alias
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Shown when a check could not complete and the ticket will be retried
pub const ACTION_WILL_RETRY: &str = "could not verify yet, will retry";

/// Shown when a ticket is left in `Error` until someone re-checks it
pub const ACTION_RETRY_MANUALLY: &str = "verification failed, please retry manually";

/// Tracker-specific error variants
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Ticket request violates the lottery's rules
    #[error("Invalid ticket: {0}")]
    Validation(String),

    /// No ticket with that id
    #[error("Ticket {0} not found")]
    TicketNotFound(TicketId),

    /// Status change not allowed from the stored status
    #[error("Ticket cannot move from {from} to {to}")]
    InvalidTransition { from: TicketStatus, to: TicketStatus },

    /// Draw source failure outside of a ticket check
    #[error(transparent)]
    DrawSource(#[from] DrawSourceError),

    /// Draw source failure while checking a ticket
    ///
    /// `will_retry` tells whether the next sweep picks the ticket up again.
    #[error("Ticket {ticket_id} could not be checked: {source}")]
    CheckFailed {
        ticket_id: TicketId,
        source: DrawSourceError,
        will_retry: bool,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored row could not be turned back into a ticket
    #[error("Corrupted ticket record: {0}")]
    Corrupted(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrackerError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackerError::Validation(_) => ErrorKind::UnprocessableEntity,
            TrackerError::TicketNotFound(_) => ErrorKind::NotFound,
            TrackerError::InvalidTransition { .. } => ErrorKind::Conflict,
            TrackerError::DrawSource(e) | TrackerError::CheckFailed { source: e, .. } => {
                draw_source_kind(e)
            }
            TrackerError::Database(_)
            | TrackerError::Corrupted(_)
            | TrackerError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// What the user should do about this error, if anything
    pub fn action(&self) -> Option<&'static str> {
        match self {
            TrackerError::DrawSource(_) => Some(ACTION_WILL_RETRY),
            TrackerError::CheckFailed { will_retry, .. } => Some(if *will_retry {
                ACTION_WILL_RETRY
            } else {
                ACTION_RETRY_MANUALLY
            }),
            _ => None,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            TrackerError::Database(e) => {
                tracing::error!(error = %e, "Tracker database error");
            }
            TrackerError::Corrupted(msg) => {
                tracing::error!(message = %msg, "Tracker corrupted record");
            }
            TrackerError::Internal(msg) => {
                tracing::error!(message = %msg, "Tracker internal error");
            }
            TrackerError::DrawSource(e) => {
                tracing::warn!(error = %e, "Draw source failure");
            }
            TrackerError::CheckFailed {
                ticket_id, source, ..
            } => {
                tracing::warn!(ticket_id = %ticket_id, error = %source, "Ticket check failed");
            }
            _ => {
                tracing::debug!(error = %self, "Tracker error");
            }
        }
    }
}

fn draw_source_kind(err: &DrawSourceError) -> ErrorKind {
    match err {
        DrawSourceError::Timeout => ErrorKind::GatewayTimeout,
        DrawSourceError::Unavailable(_) | DrawSourceError::Malformed(_) => ErrorKind::BadGateway,
    }
}

impl From<NumbersError> for TrackerError {
    fn from(err: NumbersError) -> Self {
        TrackerError::Validation(err.to_string())
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        let action = err.action();
        let app = match err {
            TrackerError::Database(e) => AppError::from(e),
            other => {
                let kind = other.kind();
                AppError::new(kind, other.to_string())
            }
        };
        match action {
            Some(action) => app.with_action(action),
            None => app,
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        self.log();
        AppError::from(self).into_response()
    }
}
