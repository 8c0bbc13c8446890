//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Ticket, DrawResult, GameResult)
//! - Domain value objects (LotteryType, LotteryNumbers, TicketStatus)
//! - Lottery rules (number constraints, prize-tier label tables)
//! - Domain services (result matching, performance metrics, number frequency)
//! - Repository and draw source traits (interfaces)

pub mod draw_source;
pub mod entity;
pub mod repository;
pub mod rules;
pub mod services;
pub mod value_object;
