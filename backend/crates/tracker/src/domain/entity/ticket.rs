//! Ticket Entity
//!
//! A saved lottery play. Everything except the verification state
//! (`status`, `prize`, `checked_at`) is fixed at creation.

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use kernel::id::TicketId;

use crate::domain::rules::LotteryRules;
use crate::domain::value_object::{
    lottery_numbers::LotteryNumbers, lottery_type::LotteryType, ticket_status::TicketStatus,
};
use crate::error::{TrackerError, TrackerResult};

/// Request to save a new ticket
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub lottery_type: LotteryType,
    /// Raw picked numbers, in any order
    pub numbers: Vec<u32>,
    pub expected_draw_date: NaiveDate,
    pub contest_number: u32,
    /// Amount paid; derived from the lottery's price table when absent
    pub cost: Option<f64>,
}

/// Ticket entity
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub ticket_id: TicketId,
    pub lottery_type: LotteryType,
    /// Validated at creation, ascending
    pub numbers: LotteryNumbers,
    /// Informational date of the target draw
    pub expected_draw_date: NaiveDate,
    /// Target draw
    pub contest_number: u32,
    pub status: TicketStatus,
    pub cost: f64,
    /// 0 until checked
    pub prize: f64,
    /// Millisecond precision
    pub created_at: DateTime<Utc>,
    /// Set when the ticket leaves `Pending`
    pub checked_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Validate a request against the lottery's rules and build a pending ticket
    pub fn create(request: NewTicket, rules: &LotteryRules) -> TrackerResult<Self> {
        if rules.lottery_type != request.lottery_type {
            return Err(TrackerError::Internal(format!(
                "rules for {} used to validate a {} ticket",
                rules.lottery_type, request.lottery_type
            )));
        }
        if request.contest_number == 0 {
            return Err(TrackerError::Validation(
                "Contest number must be positive".to_string(),
            ));
        }

        let numbers = LotteryNumbers::new(&request.numbers, rules)?;

        let cost = match request.cost {
            Some(cost) if !cost.is_finite() || cost < 0.0 => {
                return Err(TrackerError::Validation(format!(
                    "Cost must be a non-negative amount, got {cost}"
                )));
            }
            Some(cost) => cost,
            None => rules.ticket_cost(numbers.len()),
        };

        Ok(Self {
            ticket_id: TicketId::new(),
            lottery_type: request.lottery_type,
            numbers,
            expected_draw_date: request.expected_draw_date,
            contest_number: request.contest_number,
            status: TicketStatus::Pending,
            cost,
            prize: 0.0,
            created_at: now_ms(),
            checked_at: None,
        })
    }

    /// Checked with a positive prize
    #[inline]
    pub fn is_win(&self) -> bool {
        self.status == TicketStatus::Checked && self.prize > 0.0
    }

    #[inline]
    pub fn is_checked(&self) -> bool {
        self.status == TicketStatus::Checked
    }
}

/// Current time truncated to what storage keeps
pub fn now_ms() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
