//! Lottery Ticket Tracker
//!
//! Saves lottery plays, reconciles them against official draw results and
//! reports how the portfolio is doing.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, lottery rules, matching and metrics, repository traits
//! - `application/` - Use cases and configuration
//! - `infra/` - SQLite repository, Caixa draw source
//! - `presentation/` - HTTP handlers
//!
//! ## Ticket lifecycle
//! - Saved as `pending` once its numbers pass the lottery's rules
//! - Moves to `checked` when its draw is published, with the prize recorded in
//!   the same update
//! - Moves to `error` when the draw could not be fetched; a later check may
//!   still resolve it

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::check_results::{CheckOutcome, CheckResultsUseCase, SweepFailure, SweepReport};
pub use application::config::{ErroredTicketPolicy, StreakOrder, TrackerConfig};
pub use application::scheduler::schedule_recurring;
pub use domain::rules::RulesRegistry;
pub use error::{TrackerError, TrackerResult};
pub use infra::caixa::CaixaDrawSource;
pub use infra::sqlite::{MIGRATOR, SqliteTicketRepository, connect};
pub use presentation::router::{tracker_router, tracker_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[cfg(test)]
mod tests;
