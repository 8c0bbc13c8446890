//! Draw Source Trait
//!
//! Where official draw results come from. The HTTP implementation lives in
//! the infrastructure layer; tests plug in their own.

use thiserror::Error;

use crate::domain::entity::draw::DrawResult;
use crate::domain::value_object::lottery_type::LotteryType;

/// Failure to obtain a draw result
///
/// A draw that has not happened yet is not an error: sources return
/// `Ok(None)` for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawSourceError {
    /// The request did not complete in time
    #[error("Draw source timed out")]
    Timeout,

    /// Transport failure or unexpected status
    #[error("Draw source unavailable: {0}")]
    Unavailable(String),

    /// The response could not be read as a draw result
    #[error("Malformed draw data: {0}")]
    Malformed(String),
}

/// Draw data source trait
#[trait_variant::make(DrawSource: Send)]
pub trait LocalDrawSource {
    /// Official result of `contest_number`, or `None` if it has not been drawn yet
    async fn fetch_draw(
        &self,
        lottery_type: LotteryType,
        contest_number: u32,
    ) -> Result<Option<DrawResult>, DrawSourceError>;
}
