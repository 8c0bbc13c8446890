//! Lottery Type Value Object
//!
//! The lottery games a ticket can be played on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported lottery games
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LotteryType {
    /// Mega-Sena: 6 numbers drawn from 1..=60
    MegaSena,
    /// Lotofácil: 15 numbers drawn from 1..=25
    Lotofacil,
}

impl LotteryType {
    /// Every supported lottery, in display order
    pub const ALL: [LotteryType; 2] = [Self::MegaSena, Self::Lotofacil];

    /// Get string code for database storage and the API
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MegaSena => "megasena",
            Self::Lotofacil => "lotofacil",
        }
    }

    /// Create from string code
    ///
    /// Accepts a few common spellings ("mega-sena", "mega_sena") besides the
    /// canonical code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "megasena" | "mega-sena" | "mega_sena" => Some(Self::MegaSena),
            "lotofacil" | "lotofácil" => Some(Self::Lotofacil),
            _ => None,
        }
    }
}

impl fmt::Display for LotteryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
