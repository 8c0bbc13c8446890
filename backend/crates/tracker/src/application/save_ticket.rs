//! Save Ticket Use Case

use crate::domain::entity::ticket::{NewTicket, Ticket};
use crate::domain::repository::TicketRepository;
use crate::domain::rules::RulesRegistry;
use crate::error::TrackerResult;
use std::sync::Arc;

/// Save Ticket Use Case
///
/// Numbers are validated here, against the lottery's rules, before anything
/// is written.
pub struct SaveTicketUseCase<R>
where
    R: TicketRepository,
{
    ticket_repo: Arc<R>,
    rules: Arc<RulesRegistry>,
}

impl<R> SaveTicketUseCase<R>
where
    R: TicketRepository,
{
    pub fn new(ticket_repo: Arc<R>, rules: Arc<RulesRegistry>) -> Self {
        Self { ticket_repo, rules }
    }

    pub async fn execute(&self, request: NewTicket) -> TrackerResult<Ticket> {
        let rules = self.rules.get(request.lottery_type);
        let ticket = match Ticket::create(request, rules) {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::info!(error = %e, "Ticket rejected");
                return Err(e);
            }
        };

        self.ticket_repo.create(&ticket).await?;

        tracing::info!(
            ticket_id = %ticket.ticket_id,
            lottery = %ticket.lottery_type,
            contest_number = ticket.contest_number,
            numbers = %ticket.numbers,
            "Ticket saved"
        );

        Ok(ticket)
    }
}
