//! Ticket Query Use Cases

use crate::domain::entity::ticket::Ticket;
use crate::domain::repository::{TicketFilter, TicketRepository, TicketStats};
use crate::error::{TrackerError, TrackerResult};
use kernel::id::TicketId;
use std::sync::Arc;

/// Query Tickets Use Case
pub struct QueryTicketsUseCase<R>
where
    R: TicketRepository,
{
    ticket_repo: Arc<R>,
}

impl<R> QueryTicketsUseCase<R>
where
    R: TicketRepository,
{
    pub fn new(ticket_repo: Arc<R>) -> Self {
        Self { ticket_repo }
    }

    /// Ticket by id
    pub async fn get(&self, ticket_id: TicketId) -> TrackerResult<Ticket> {
        self.ticket_repo
            .find_by_id(ticket_id)
            .await?
            .ok_or(TrackerError::TicketNotFound(ticket_id))
    }

    /// Tickets matching `filter`, newest first
    pub async fn list(&self, filter: &TicketFilter) -> TrackerResult<Vec<Ticket>> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(TrackerError::Validation(format!(
                    "Date range is empty: {from} is after {to}"
                )));
            }
        }
        self.ticket_repo.list(filter).await
    }

    /// Tickets still waiting for their draw
    pub async fn list_pending(&self) -> TrackerResult<Vec<Ticket>> {
        self.ticket_repo.list(&TicketFilter::pending()).await
    }

    pub async fn stats(&self) -> TrackerResult<TicketStats> {
        self.ticket_repo.stats().await
    }
}
