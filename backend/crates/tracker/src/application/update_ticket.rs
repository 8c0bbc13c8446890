//! Update Ticket Use Cases
//!
//! Manual status changes and deletion. Automatic status changes come from
//! [`crate::application::check_results`].

use crate::domain::entity::ticket::{Ticket, now_ms};
use crate::domain::repository::{StatusUpdate, TicketRepository};
use crate::domain::value_object::ticket_status::TicketStatus;
use crate::error::{TrackerError, TrackerResult};
use kernel::id::TicketId;
use std::sync::Arc;

/// Update Ticket Use Case
pub struct UpdateTicketUseCase<R>
where
    R: TicketRepository,
{
    ticket_repo: Arc<R>,
}

impl<R> UpdateTicketUseCase<R>
where
    R: TicketRepository,
{
    pub fn new(ticket_repo: Arc<R>) -> Self {
        Self { ticket_repo }
    }

    /// Move a ticket to `status`, stamping `checked_at`
    ///
    /// `prize` is written in the same update; `None` keeps the stored one.
    pub async fn update_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
        prize: Option<f64>,
    ) -> TrackerResult<Ticket> {
        if let Some(p) = prize {
            if !p.is_finite() || p < 0.0 {
                return Err(TrackerError::Validation(format!(
                    "Prize must be a non-negative amount, got {p}"
                )));
            }
            if status != TicketStatus::Checked {
                return Err(TrackerError::Validation(
                    "A prize can only be set on a checked ticket".to_string(),
                ));
            }
        }

        let update = StatusUpdate {
            status,
            prize,
            checked_at: now_ms(),
        };
        let ticket = self.ticket_repo.update_status(ticket_id, &update).await?;

        tracing::info!(
            ticket_id = %ticket_id,
            status = %ticket.status,
            prize = ticket.prize,
            "Ticket status updated"
        );

        Ok(ticket)
    }

    pub async fn delete(&self, ticket_id: TicketId) -> TrackerResult<()> {
        self.ticket_repo.delete(ticket_id).await?;
        tracing::info!(ticket_id = %ticket_id, "Ticket deleted");
        Ok(())
    }
}
