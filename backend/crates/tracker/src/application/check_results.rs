//! Check Results Use Case
//!
//! Brings tickets up to date with official draws: fetch the draw for the
//! ticket's contest, match, and record the outcome in one status update.
//!
//! - Draw not published yet: nothing changes, the ticket stays pending.
//! - Fetch failure: the ticket moves to `Error` (a `Checked` ticket is left
//!   as is) and the failure is reported for that ticket only.

use crate::application::config::TrackerConfig;
use crate::domain::draw_source::{DrawSource, DrawSourceError};
use crate::domain::entity::draw::{DrawResult, GameResult};
use crate::domain::entity::ticket::{Ticket, now_ms};
use crate::domain::repository::{StatusUpdate, TicketFilter, TicketRepository};
use crate::domain::rules::RulesRegistry;
use crate::domain::services::matcher::match_ticket;
use crate::domain::value_object::{lottery_type::LotteryType, ticket_status::TicketStatus};
use crate::error::{TrackerError, TrackerResult};
use kernel::id::TicketId;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

type Fetched = Result<Option<DrawResult>, DrawSourceError>;

/// One ticket a sweep could not check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepFailure {
    pub ticket_id: TicketId,
    pub error: String,
}

/// Summary of one sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Tickets looked at
    pub examined: usize,
    /// Tickets resolved against a draw
    pub checked: usize,
    /// Resolved tickets that won a prize tier
    pub winners: usize,
    /// Tickets whose draw is not published yet
    pub still_pending: usize,
    pub failed: Vec<SweepFailure>,
}

/// What a single check left behind
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    /// Stored status after the check
    pub status: TicketStatus,
    /// User-facing message for `status`
    pub message: &'static str,
    /// `None` when the draw is not published yet
    pub result: Option<GameResult>,
}

/// Check Results Use Case
pub struct CheckResultsUseCase<R, D>
where
    R: TicketRepository,
    D: DrawSource,
{
    ticket_repo: Arc<R>,
    draw_source: Arc<D>,
    rules: Arc<RulesRegistry>,
    config: Arc<TrackerConfig>,
}

impl<R, D> CheckResultsUseCase<R, D>
where
    R: TicketRepository,
    D: DrawSource,
{
    pub fn new(
        ticket_repo: Arc<R>,
        draw_source: Arc<D>,
        rules: Arc<RulesRegistry>,
        config: Arc<TrackerConfig>,
    ) -> Self {
        Self {
            ticket_repo,
            draw_source,
            rules,
            config,
        }
    }

    /// Check one ticket
    ///
    /// When the draw has not happened yet the ticket keeps its stored status,
    /// which is `Error` for a ticket whose previous check failed.
    pub async fn check_one(&self, ticket_id: TicketId) -> TrackerResult<CheckOutcome> {
        let ticket = self
            .ticket_repo
            .find_by_id(ticket_id)
            .await?
            .ok_or(TrackerError::TicketNotFound(ticket_id))?;

        let fetched = self.fetch(ticket.lottery_type, ticket.contest_number).await;
        let result = self.apply(&ticket, fetched).await?;

        let status = match result {
            Some(_) => TicketStatus::Checked,
            None => ticket.status,
        };
        Ok(CheckOutcome {
            status,
            message: self.status_message(status),
            result,
        })
    }

    fn status_message(&self, status: TicketStatus) -> &'static str {
        match status {
            // The next sweep picks it up like a pending ticket
            TicketStatus::Error if self.config.errored_ticket_policy.retries_in_sweep() => {
                TicketStatus::Pending.user_message()
            }
            other => other.user_message(),
        }
    }

    /// Check every pending ticket, one at a time
    ///
    /// Per-ticket failures are collected in the report. Only failing to list
    /// the tickets aborts the sweep. Errored tickets are included when the
    /// configured policy retries them.
    pub async fn check_all_pending(&self) -> TrackerResult<SweepReport> {
        let mut tickets = self.ticket_repo.list(&TicketFilter::pending()).await?;
        if self.config.errored_ticket_policy.retries_in_sweep() {
            tickets.extend(
                self.ticket_repo
                    .list(&TicketFilter::with_status(TicketStatus::Error))
                    .await?,
            );
        }

        let mut report = SweepReport {
            examined: tickets.len(),
            ..Default::default()
        };
        // Tickets of the same contest share one fetch
        let mut draws: HashMap<(LotteryType, u32), Fetched> = HashMap::new();

        for ticket in &tickets {
            let key = (ticket.lottery_type, ticket.contest_number);
            let fetched = match draws.get(&key) {
                Some(fetched) => fetched.clone(),
                None => {
                    let fetched = self.fetch(key.0, key.1).await;
                    draws.insert(key, fetched.clone());
                    fetched
                }
            };

            match self.apply(ticket, fetched).await {
                Ok(Some(result)) => {
                    report.checked += 1;
                    if result.is_winner {
                        report.winners += 1;
                    }
                }
                Ok(None) => report.still_pending += 1,
                Err(e) => {
                    tracing::warn!(
                        ticket_id = %ticket.ticket_id,
                        error = %e,
                        "Sweep could not check ticket"
                    );
                    report.failed.push(SweepFailure {
                        ticket_id: ticket.ticket_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            examined = report.examined,
            checked = report.checked,
            winners = report.winners,
            still_pending = report.still_pending,
            failed = report.failed.len(),
            "Sweep finished"
        );

        Ok(report)
    }

    async fn fetch(&self, lottery_type: LotteryType, contest_number: u32) -> Fetched {
        let fetched = self
            .draw_source
            .fetch_draw(lottery_type, contest_number)
            .await?;
        match fetched {
            Some(draw) if draw.contest_number != contest_number => {
                Err(DrawSourceError::Malformed(format!(
                    "asked for contest {contest_number}, got {}",
                    draw.contest_number
                )))
            }
            other => Ok(other),
        }
    }

    /// Record what a fetch means for `ticket`
    async fn apply(&self, ticket: &Ticket, fetched: Fetched) -> TrackerResult<Option<GameResult>> {
        match fetched {
            Ok(None) => {
                tracing::debug!(
                    ticket_id = %ticket.ticket_id,
                    contest_number = ticket.contest_number,
                    "Draw not available yet"
                );
                Ok(None)
            }
            Ok(Some(draw)) => {
                let result = match_ticket(ticket, &draw, self.rules.get(ticket.lottery_type));
                let update = StatusUpdate {
                    status: TicketStatus::Checked,
                    prize: Some(result.prize),
                    checked_at: now_ms(),
                };
                self.ticket_repo
                    .update_status(ticket.ticket_id, &update)
                    .await?;

                tracing::info!(
                    ticket_id = %ticket.ticket_id,
                    contest_number = result.contest_number,
                    hit_count = result.hit_count,
                    tier = %result.tier_label,
                    prize = result.prize,
                    "Ticket checked"
                );
                Ok(Some(result))
            }
            Err(source) if ticket.status == TicketStatus::Checked => {
                tracing::warn!(
                    ticket_id = %ticket.ticket_id,
                    error = %source,
                    "Re-check failed, keeping previous result"
                );
                Err(TrackerError::DrawSource(source))
            }
            Err(source) => {
                let update = StatusUpdate {
                    status: TicketStatus::Error,
                    prize: None,
                    checked_at: now_ms(),
                };
                match self
                    .ticket_repo
                    .update_status(ticket.ticket_id, &update)
                    .await
                {
                    // Checked concurrently by someone else
                    Ok(_) | Err(TrackerError::InvalidTransition { .. }) => {}
                    Err(e) => return Err(e),
                }

                Err(TrackerError::CheckFailed {
                    ticket_id: ticket.ticket_id,
                    source,
                    will_retry: self.config.errored_ticket_policy.retries_in_sweep(),
                })
            }
        }
    }
}
