//! Domain Services
//!
//! Pure computations over tickets and draws. No I/O.

pub mod frequency;
pub mod matcher;
pub mod performance;
