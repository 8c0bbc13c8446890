//! Draw Entities
//!
//! `DrawResult` is the authoritative outcome of a draw as reported by the
//! draw data source. `GameResult` is what one ticket made of it; it is
//! derived on demand and never stored.

use chrono::NaiveDate;
use serde::Serialize;

/// One prize bracket as reported by the draw data source
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeTier {
    /// Label as reported ("Sena", "14 acertos", "Faixa 2 (14 pontos)", ...)
    pub label: String,
    pub winners: u32,
    /// Amount paid to each winner
    pub prize: f64,
}

/// Official result of one draw
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawResult {
    pub contest_number: u32,
    pub draw_date: NaiveDate,
    /// Drawn numbers in the order they were drawn
    pub numbers: Vec<u8>,
    pub tiers: Vec<PrizeTier>,
}

/// Outcome of one ticket against one draw
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub contest_number: u32,
    pub draw_date: NaiveDate,
    /// Ticket numbers that were drawn, ascending
    pub matches: Vec<u8>,
    pub hit_count: usize,
    pub tier_label: String,
    pub prize: f64,
    pub is_winner: bool,
}
