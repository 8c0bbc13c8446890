//! Domain Entities

pub mod draw;
pub mod ticket;
