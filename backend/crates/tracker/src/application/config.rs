//! Application Configuration
//!
//! Configuration for the tracker application layer, read from the
//! environment by the binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use crate::domain::services::performance::StreakOrder;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://lottery_tracker.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:31113";
pub const DEFAULT_DRAW_API_BASE_URL: &str = "https://servicebus2.caixa.gov.br/portaldeloterias/api";
pub const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

/// What sweeps do with tickets whose last check failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErroredTicketPolicy {
    /// Only an explicit check moves an errored ticket forward
    #[default]
    ManualOnly,
    /// Sweeps re-check errored tickets along with pending ones
    RetryInSweep,
}

impl ErroredTicketPolicy {
    pub fn from_flag(retry: bool) -> Self {
        if retry {
            Self::RetryInSweep
        } else {
            Self::ManualOnly
        }
    }

    #[inline]
    pub fn retries_in_sweep(&self) -> bool {
        matches!(self, Self::RetryInSweep)
    }
}

/// Invalid configuration value
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid value for {var}: '{value}' ({reason})")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: &'static str,
}

/// Tracker application configuration
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// SQLite connection string
    pub database_url: String,
    /// HTTP listen address
    pub bind_addr: SocketAddr,
    /// Origins allowed by CORS
    pub frontend_origins: Vec<String>,
    /// Period of the recurring sweep
    pub sweep_interval: Duration,
    /// Max random delay added before each sweep
    pub sweep_jitter: Duration,
    /// Timeout of one draw fetch
    pub draw_fetch_timeout: Duration,
    /// Base URL of the draw results API
    pub draw_api_base_url: String,
    pub errored_ticket_policy: ErroredTicketPolicy,
    pub streak_order: StreakOrder,
    /// JSON file with extra prize-tier label spellings
    pub tier_labels_path: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 31113)),
            frontend_origins: split_list(DEFAULT_FRONTEND_ORIGINS),
            sweep_interval: Duration::from_secs(6 * 60 * 60),
            sweep_jitter: Duration::ZERO,
            draw_fetch_timeout: Duration::from_secs(30),
            draw_api_base_url: DEFAULT_DRAW_API_BASE_URL.to_string(),
            errored_ticket_policy: ErroredTicketPolicy::default(),
            streak_order: StreakOrder::default(),
            tier_labels_path: None,
        }
    }
}

impl TrackerConfig {
    /// Read configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; missing or blank values use defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(addr) = get("BIND_ADDR") {
            config.bind_addr = addr.trim().parse().map_err(|_| ConfigError {
                var: "BIND_ADDR",
                value: addr.clone(),
                reason: "expected host:port",
            })?;
        }
        if let Some(origins) = get("FRONTEND_ORIGINS") {
            config.frontend_origins = split_list(&origins);
        }
        if let Some(v) = get("SWEEP_INTERVAL_SECS") {
            let secs = parse_secs("SWEEP_INTERVAL_SECS", &v)?;
            if secs == 0 {
                return Err(ConfigError {
                    var: "SWEEP_INTERVAL_SECS",
                    value: v,
                    reason: "must be positive",
                });
            }
            config.sweep_interval = Duration::from_secs(secs);
        }
        if let Some(v) = get("SWEEP_JITTER_SECS") {
            config.sweep_jitter = Duration::from_secs(parse_secs("SWEEP_JITTER_SECS", &v)?);
        }
        if let Some(v) = get("DRAW_FETCH_TIMEOUT_SECS") {
            let secs = parse_secs("DRAW_FETCH_TIMEOUT_SECS", &v)?;
            if secs == 0 {
                return Err(ConfigError {
                    var: "DRAW_FETCH_TIMEOUT_SECS",
                    value: v,
                    reason: "must be positive",
                });
            }
            config.draw_fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(url) = get("DRAW_API_BASE_URL") {
            config.draw_api_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(v) = get("RETRY_ERRORED_IN_SWEEP") {
            let retry = parse_bool(&v).ok_or(ConfigError {
                var: "RETRY_ERRORED_IN_SWEEP",
                value: v.clone(),
                reason: "expected true or false",
            })?;
            config.errored_ticket_policy = ErroredTicketPolicy::from_flag(retry);
        }
        if let Some(v) = get("STREAK_ORDER") {
            config.streak_order = StreakOrder::from_code(&v).ok_or(ConfigError {
                var: "STREAK_ORDER",
                value: v.clone(),
                reason: "expected created_at or draw_date",
            })?;
        }
        config.tier_labels_path = get("TIER_LABELS_PATH").map(PathBuf::from);

        Ok(config)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_secs(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError {
        var,
        value: value.to_string(),
        reason: "expected whole seconds",
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
