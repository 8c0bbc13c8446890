//! Performance Use Case
//!
//! Reads the current ticket set on every call; nothing is cached.

use crate::application::config::TrackerConfig;
use crate::domain::repository::{TicketFilter, TicketRepository};
use crate::domain::rules::RulesRegistry;
use crate::domain::services::frequency::{NumberFrequency, number_frequency};
use crate::domain::services::performance::{PerformanceMetrics, compute_metrics};
use crate::domain::value_object::lottery_type::LotteryType;
use crate::error::TrackerResult;
use chrono::Utc;
use std::sync::Arc;

/// Performance Use Case
pub struct PerformanceUseCase<R>
where
    R: TicketRepository,
{
    ticket_repo: Arc<R>,
    rules: Arc<RulesRegistry>,
    config: Arc<TrackerConfig>,
}

impl<R> PerformanceUseCase<R>
where
    R: TicketRepository,
{
    pub fn new(ticket_repo: Arc<R>, rules: Arc<RulesRegistry>, config: Arc<TrackerConfig>) -> Self {
        Self {
            ticket_repo,
            rules,
            config,
        }
    }

    pub async fn compute_metrics(&self) -> TrackerResult<PerformanceMetrics> {
        let tickets = self.ticket_repo.list(&TicketFilter::default()).await?;
        let metrics = compute_metrics(&tickets, Utc::now(), self.config.streak_order);

        tracing::debug!(
            tickets = metrics.totals.tickets,
            roi = metrics.totals.roi,
            "Performance metrics computed"
        );

        Ok(metrics)
    }

    pub async fn number_frequency(
        &self,
        lottery_type: LotteryType,
    ) -> TrackerResult<Vec<NumberFrequency>> {
        let filter = TicketFilter {
            lottery_type: Some(lottery_type),
            ..Default::default()
        };
        let tickets = self.ticket_repo.list(&filter).await?;
        Ok(number_frequency(&tickets, self.rules.get(lottery_type)))
    }
}
