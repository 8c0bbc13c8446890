//! Tracker Router

use crate::application::config::TrackerConfig;
use crate::domain::draw_source::DrawSource;
use crate::domain::repository::TicketRepository;
use crate::domain::rules::RulesRegistry;
use crate::infra::caixa::CaixaDrawSource;
use crate::infra::sqlite::SqliteTicketRepository;
use crate::presentation::handlers::{self, TrackerAppState};
use axum::{
    Router,
    routing::{get, patch, post},
};
use std::sync::Arc;

/// Create the tracker router with the SQLite repository and Caixa draw source
pub fn tracker_router(
    repo: Arc<SqliteTicketRepository>,
    draw_source: Arc<CaixaDrawSource>,
    rules: Arc<RulesRegistry>,
    config: Arc<TrackerConfig>,
) -> Router {
    tracker_router_generic(repo, draw_source, rules, config)
}

/// Create a generic tracker router for any repository and draw source
pub fn tracker_router_generic<R, D>(
    repo: Arc<R>,
    draw_source: Arc<D>,
    rules: Arc<RulesRegistry>,
    config: Arc<TrackerConfig>,
) -> Router
where
    R: TicketRepository + Send + Sync + 'static,
    D: DrawSource + Send + Sync + 'static,
{
    let state = TrackerAppState {
        repo,
        draw_source,
        rules,
        config,
    };

    Router::new()
        .route(
            "/tickets",
            get(handlers::list_tickets::<R, D>).post(handlers::create_ticket::<R, D>),
        )
        .route("/tickets/stats", get(handlers::ticket_stats::<R, D>))
        .route("/tickets/check", post(handlers::check_all_pending::<R, D>))
        .route(
            "/tickets/{id}",
            get(handlers::get_ticket::<R, D>).delete(handlers::delete_ticket::<R, D>),
        )
        .route(
            "/tickets/{id}/status",
            patch(handlers::update_status::<R, D>),
        )
        .route("/tickets/{id}/check", post(handlers::check_ticket::<R, D>))
        .route("/performance", get(handlers::performance::<R, D>))
        .route(
            "/performance/frequency/{lottery}",
            get(handlers::number_frequency::<R, D>),
        )
        .with_state(state)
}
