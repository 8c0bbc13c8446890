//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains use case implementations.

pub mod check_results;
pub mod config;
pub mod performance;
pub mod query_tickets;
pub mod save_ticket;
pub mod scheduler;
pub mod update_ticket;
