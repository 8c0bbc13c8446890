//! Infrastructure Layer
//!
//! SQLite persistence and the HTTP draw source.

pub mod caixa;
pub mod sqlite;
