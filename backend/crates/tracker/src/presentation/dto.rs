//! API DTOs (Data Transfer Objects)

use crate::domain::entity::draw::GameResult;
use crate::domain::entity::ticket::{NewTicket, Ticket};
use crate::domain::repository::TicketFilter;
use crate::domain::value_object::{lottery_type::LotteryType, ticket_status::TicketStatus};
use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::TicketId;
use serde::{Deserialize, Serialize};

/// Request for POST /api/tickets
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub lottery_type: LotteryType,
    pub numbers: Vec<u32>,
    pub expected_draw_date: NaiveDate,
    pub contest_number: u32,
    #[serde(default)]
    pub cost: Option<f64>,
}

impl From<CreateTicketRequest> for NewTicket {
    fn from(req: CreateTicketRequest) -> Self {
        NewTicket {
            lottery_type: req.lottery_type,
            numbers: req.numbers,
            expected_draw_date: req.expected_draw_date,
            contest_number: req.contest_number,
            cost: req.cost,
        }
    }
}

/// Query for GET /api/tickets
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTicketsQuery {
    #[serde(default)]
    pub lottery_type: Option<LotteryType>,
    #[serde(default)]
    pub status: Option<TicketStatus>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl From<ListTicketsQuery> for TicketFilter {
    fn from(q: ListTicketsQuery) -> Self {
        TicketFilter {
            lottery_type: q.lottery_type,
            status: q.status,
            from: q.from,
            to: q.to,
        }
    }
}

/// Request for PATCH /api/tickets/{id}/status
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: TicketStatus,
    #[serde(default)]
    pub prize: Option<f64>,
}

/// A saved ticket as returned by the API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: TicketId,
    pub lottery_type: LotteryType,
    pub numbers: Vec<u8>,
    pub expected_draw_date: NaiveDate,
    pub contest_number: u32,
    pub status: TicketStatus,
    pub status_message: &'static str,
    pub cost: f64,
    pub prize: f64,
    pub created_at: DateTime<Utc>,
    pub checked_at: Option<DateTime<Utc>>,
}

impl From<Ticket> for TicketResponse {
    fn from(t: Ticket) -> Self {
        TicketResponse {
            id: t.ticket_id,
            lottery_type: t.lottery_type,
            numbers: t.numbers.as_slice().to_vec(),
            expected_draw_date: t.expected_draw_date,
            contest_number: t.contest_number,
            status: t.status,
            status_message: t.status.user_message(),
            cost: t.cost,
            prize: t.prize,
            created_at: t.created_at,
            checked_at: t.checked_at,
        }
    }
}

/// Response for POST /api/tickets/{id}/check
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub ticket_id: TicketId,
    pub status: TicketStatus,
    pub message: &'static str,
    pub result: Option<GameResult>,
}
