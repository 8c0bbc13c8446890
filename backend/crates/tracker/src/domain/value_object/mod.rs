//! Value Object Module

pub mod lottery_numbers;
pub mod lottery_type;
pub mod ticket_status;
