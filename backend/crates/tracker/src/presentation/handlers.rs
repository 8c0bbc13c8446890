//! HTTP Handlers

use crate::application::check_results::{CheckResultsUseCase, SweepReport};
use crate::application::config::TrackerConfig;
use crate::application::performance::PerformanceUseCase;
use crate::application::query_tickets::QueryTicketsUseCase;
use crate::application::save_ticket::SaveTicketUseCase;
use crate::application::update_ticket::UpdateTicketUseCase;
use crate::domain::draw_source::DrawSource;
use crate::domain::repository::{TicketRepository, TicketStats};
use crate::domain::rules::RulesRegistry;
use crate::domain::services::frequency::NumberFrequency;
use crate::domain::services::performance::PerformanceMetrics;
use crate::domain::value_object::lottery_type::LotteryType;
use crate::error::{TrackerError, TrackerResult};
use crate::presentation::dto::{
    CheckResponse, CreateTicketRequest, ListTicketsQuery, TicketResponse, UpdateStatusRequest,
};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use kernel::id::TicketId;
use std::sync::Arc;

/// Shared state for tracker handlers
pub struct TrackerAppState<R, D>
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub draw_source: Arc<D>,
    pub rules: Arc<RulesRegistry>,
    pub config: Arc<TrackerConfig>,
}

// Manual impl: only the Arcs are cloned
impl<R, D> Clone for TrackerAppState<R, D>
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            draw_source: self.draw_source.clone(),
            rules: self.rules.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R, D> TrackerAppState<R, D>
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    pub fn check_results(&self) -> CheckResultsUseCase<R, D> {
        CheckResultsUseCase::new(
            self.repo.clone(),
            self.draw_source.clone(),
            self.rules.clone(),
            self.config.clone(),
        )
    }
}

/// POST /api/tickets
pub async fn create_ticket<R, D>(
    State(state): State<TrackerAppState<R, D>>,
    Json(req): Json<CreateTicketRequest>,
) -> TrackerResult<impl IntoResponse>
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    let use_case = SaveTicketUseCase::new(state.repo.clone(), state.rules.clone());
    let ticket = use_case.execute(req.into()).await?;

    Ok((StatusCode::CREATED, Json(TicketResponse::from(ticket))))
}

/// GET /api/tickets
pub async fn list_tickets<R, D>(
    State(state): State<TrackerAppState<R, D>>,
    Query(query): Query<ListTicketsQuery>,
) -> TrackerResult<Json<Vec<TicketResponse>>>
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    let use_case = QueryTicketsUseCase::new(state.repo.clone());
    let tickets = use_case.list(&query.into()).await?;

    Ok(Json(tickets.into_iter().map(TicketResponse::from).collect()))
}

/// GET /api/tickets/stats
pub async fn ticket_stats<R, D>(
    State(state): State<TrackerAppState<R, D>>,
) -> TrackerResult<Json<TicketStats>>
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    let use_case = QueryTicketsUseCase::new(state.repo.clone());
    Ok(Json(use_case.stats().await?))
}

/// GET /api/tickets/{id}
pub async fn get_ticket<R, D>(
    State(state): State<TrackerAppState<R, D>>,
    Path(ticket_id): Path<TicketId>,
) -> TrackerResult<Json<TicketResponse>>
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    let use_case = QueryTicketsUseCase::new(state.repo.clone());
    let ticket = use_case.get(ticket_id).await?;

    Ok(Json(ticket.into()))
}

/// DELETE /api/tickets/{id}
pub async fn delete_ticket<R, D>(
    State(state): State<TrackerAppState<R, D>>,
    Path(ticket_id): Path<TicketId>,
) -> TrackerResult<StatusCode>
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    let use_case = UpdateTicketUseCase::new(state.repo.clone());
    use_case.delete(ticket_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/tickets/{id}/status
pub async fn update_status<R, D>(
    State(state): State<TrackerAppState<R, D>>,
    Path(ticket_id): Path<TicketId>,
    Json(req): Json<UpdateStatusRequest>,
) -> TrackerResult<Json<TicketResponse>>
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    let use_case = UpdateTicketUseCase::new(state.repo.clone());
    let ticket = use_case
        .update_status(ticket_id, req.status, req.prize)
        .await?;

    Ok(Json(ticket.into()))
}

/// POST /api/tickets/{id}/check
pub async fn check_ticket<R, D>(
    State(state): State<TrackerAppState<R, D>>,
    Path(ticket_id): Path<TicketId>,
) -> TrackerResult<impl IntoResponse>
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    let outcome = state.check_results().check_one(ticket_id).await?;

    let code = if outcome.result.is_some() {
        StatusCode::OK
    } else {
        StatusCode::ACCEPTED
    };
    Ok((
        code,
        Json(CheckResponse {
            ticket_id,
            status: outcome.status,
            message: outcome.message,
            result: outcome.result,
        }),
    ))
}

/// POST /api/tickets/check
pub async fn check_all_pending<R, D>(
    State(state): State<TrackerAppState<R, D>>,
) -> TrackerResult<Json<SweepReport>>
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    Ok(Json(state.check_results().check_all_pending().await?))
}

/// GET /api/performance
pub async fn performance<R, D>(
    State(state): State<TrackerAppState<R, D>>,
) -> TrackerResult<Json<PerformanceMetrics>>
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    let use_case = PerformanceUseCase::new(
        state.repo.clone(),
        state.rules.clone(),
        state.config.clone(),
    );
    Ok(Json(use_case.compute_metrics().await?))
}

/// GET /api/performance/frequency/{lottery}
pub async fn number_frequency<R, D>(
    State(state): State<TrackerAppState<R, D>>,
    Path(lottery): Path<String>,
) -> TrackerResult<Json<Vec<NumberFrequency>>>
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    let lottery_type = LotteryType::from_code(&lottery)
        .ok_or_else(|| TrackerError::Validation(format!("Unknown lottery '{lottery}'")))?;

    let use_case = PerformanceUseCase::new(
        state.repo.clone(),
        state.rules.clone(),
        state.config.clone(),
    );
    Ok(Json(use_case.number_frequency(lottery_type).await?))
}
