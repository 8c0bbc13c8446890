//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::TicketId;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::entity::ticket::Ticket;
use crate::domain::value_object::{lottery_type::LotteryType, ticket_status::TicketStatus};
use crate::error::TrackerResult;

/// Ticket query; unset fields do not constrain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub lottery_type: Option<LotteryType>,
    pub status: Option<TicketStatus>,
    /// Earliest expected draw date, inclusive
    pub from: Option<NaiveDate>,
    /// Latest expected draw date, inclusive
    pub to: Option<NaiveDate>,
}

impl TicketFilter {
    pub fn with_status(status: TicketStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn pending() -> Self {
        Self::with_status(TicketStatus::Pending)
    }
}

/// Verification outcome written in one atomic update
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub status: TicketStatus,
    /// `None` keeps the stored prize
    pub prize: Option<f64>,
    pub checked_at: DateTime<Utc>,
}

/// Ticket counts per lottery and status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    pub total: u64,
    pub by_lottery: BTreeMap<LotteryType, BTreeMap<TicketStatus, u64>>,
}

impl TicketStats {
    pub fn add(&mut self, lottery_type: LotteryType, status: TicketStatus, count: u64) {
        self.total += count;
        *self
            .by_lottery
            .entry(lottery_type)
            .or_default()
            .entry(status)
            .or_insert(0) += count;
    }

    pub fn count(&self, lottery_type: LotteryType, status: TicketStatus) -> u64 {
        self.by_lottery
            .get(&lottery_type)
            .and_then(|m| m.get(&status))
            .copied()
            .unwrap_or(0)
    }
}

/// Saved ticket repository trait
#[trait_variant::make(TicketRepository: Send)]
pub trait LocalTicketRepository {
    /// Persist a new ticket
    async fn create(&self, ticket: &Ticket) -> TrackerResult<()>;

    /// Find ticket by ID
    async fn find_by_id(&self, ticket_id: TicketId) -> TrackerResult<Option<Ticket>>;

    /// Tickets matching `filter`, newest first
    async fn list(&self, filter: &TicketFilter) -> TrackerResult<Vec<Ticket>>;

    /// Apply a status transition atomically and return the updated ticket
    ///
    /// Fails with `TicketNotFound` for an unknown id and `InvalidTransition`
    /// when the stored status may not move to `update.status`.
    async fn update_status(
        &self,
        ticket_id: TicketId,
        update: &StatusUpdate,
    ) -> TrackerResult<Ticket>;

    /// Hard delete; fails with `TicketNotFound` for an unknown id
    async fn delete(&self, ticket_id: TicketId) -> TrackerResult<()>;

    /// Counts per (lottery, status) plus a grand total
    async fn stats(&self) -> TrackerResult<TicketStats>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_constructors() {
        assert_eq!(TicketFilter::default().status, None);
        assert_eq!(TicketFilter::pending().status, Some(TicketStatus::Pending));

        let errored = TicketFilter::with_status(TicketStatus::Error);
        assert_eq!(errored.status, Some(TicketStatus::Error));
        assert!(errored.lottery_type.is_none() && errored.from.is_none() && errored.to.is_none());
    }

    #[test]
    fn test_stats_accumulate() {
        let mut stats = TicketStats::default();
        stats.add(LotteryType::MegaSena, TicketStatus::Pending, 2);
        stats.add(LotteryType::MegaSena, TicketStatus::Checked, 1);
        stats.add(LotteryType::Lotofacil, TicketStatus::Pending, 4);
        assert_eq!(stats.total, 7);
        assert_eq!(stats.count(LotteryType::MegaSena, TicketStatus::Pending), 2);
        assert_eq!(stats.count(LotteryType::Lotofacil, TicketStatus::Error), 0);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["byLottery"]["lotofacil"]["pending"], 4);
    }
}
