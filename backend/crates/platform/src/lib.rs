//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Outbound JSON HTTP client with a mandatory timeout and classified errors
//! - Jitter helpers for periodic background jobs

pub mod http;
pub mod jitter;
