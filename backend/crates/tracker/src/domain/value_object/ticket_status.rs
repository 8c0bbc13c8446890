//! Ticket Status Value Object
//!
//! Verification state of a saved ticket.
//!
//! ## Transitions
//! - `Pending` → `Checked` | `Error`
//! - `Error` → `Checked` | `Error` (manual or policy-driven retry)
//! - `Checked` → `Checked` (re-check of an already resolved ticket)
//!
//! Nothing moves back to `Pending`, and a resolved ticket is never
//! downgraded to `Error`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticket verification status
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// Saved, draw not verified yet
    #[default]
    Pending,
    /// Verified against the official draw
    Checked,
    /// Last verification attempt failed
    Error,
}

impl TicketStatus {
    /// Get string code for database storage and the API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Checked => "checked",
            Self::Error => "error",
        }
    }

    /// Create from string code
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pending" => Some(Self::Pending),
            "checked" => Some(Self::Checked),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Check if a transition to `next` is allowed
    #[inline]
    pub const fn can_transition_to(&self, next: TicketStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Checked)
                | (Self::Pending, Self::Error)
                | (Self::Error, Self::Checked)
                | (Self::Error, Self::Error)
                | (Self::Checked, Self::Checked)
        )
    }

    /// States a ticket may be in when moving to `self`
    pub const fn predecessors(&self) -> &'static [TicketStatus] {
        match self {
            Self::Pending => &[],
            Self::Checked => &[Self::Pending, Self::Error, Self::Checked],
            Self::Error => &[Self::Pending, Self::Error],
        }
    }

    /// Get user-facing message for this status
    #[inline]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Pending => "Could not verify yet, will retry.",
            Self::Checked => "Verified against the official draw.",
            Self::Error => "Verification failed, please retry manually.",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
