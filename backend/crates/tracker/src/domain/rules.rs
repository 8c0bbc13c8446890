//! Lottery Rules
//!
//! Per-lottery constraints (how many numbers, which values) and the prize-tier
//! table used to read draw results.
//!
//! The tier table maps a hit count to every label the results API has used
//! for that tier over the years. New spellings are data: they can be added
//! with [`RulesRegistry::with_extra_labels_json`] without touching the
//! matcher.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use crate::domain::value_object::lottery_type::LotteryType;

// ============================================================================
// Error Types
// ============================================================================

/// Error returned when rule overrides cannot be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    /// Override document is not valid JSON of the expected shape
    InvalidDocument(String),
    /// Override names a lottery we do not know
    UnknownLottery(String),
    /// Override names a hit count that is not a prize tier
    UnknownTier { lottery: LotteryType, hits: String },
}

impl fmt::Display for RulesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDocument(msg) => write!(f, "Invalid tier label document: {msg}"),
            Self::UnknownLottery(code) => write!(f, "Unknown lottery '{code}'"),
            Self::UnknownTier { lottery, hits } => {
                write!(f, "'{hits}' is not a prize tier of {lottery}")
            }
        }
    }
}

impl std::error::Error for RulesError {}

// ============================================================================
// Tier table
// ============================================================================

/// A prize tier: the exact hit count it pays and the labels it is reported under
#[derive(Debug, Clone, PartialEq)]
pub struct TierRule {
    pub hits: usize,
    /// Label shown to the user
    pub canonical_label: String,
    /// Every accepted spelling, canonical one included
    pub labels: Vec<String>,
}

impl TierRule {
    pub fn new(hits: usize, canonical_label: impl Into<String>) -> Self {
        let canonical_label = canonical_label.into();
        Self {
            hits,
            labels: vec![canonical_label.clone()],
            canonical_label,
        }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for alias in aliases {
            self.add_label(alias);
        }
        self
    }

    pub fn add_label(&mut self, label: impl Into<String>) {
        let label = label.into();
        if !self.matches(&label) {
            self.labels.push(label);
        }
    }

    /// Whether a label reported by the results API names this tier
    pub fn matches(&self, reported: &str) -> bool {
        let reported = normalize_label(reported);
        self.labels.iter().any(|l| normalize_label(l) == reported)
    }
}

/// Case-insensitive, whitespace-collapsed form of a tier label
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ============================================================================
// LotteryRules
// ============================================================================

/// Constraints and prize table of one lottery
#[derive(Debug, Clone, PartialEq)]
pub struct LotteryRules {
    pub lottery_type: LotteryType,
    /// Fewest numbers a ticket may carry
    pub min_numbers: usize,
    /// Most numbers a ticket may carry
    pub max_numbers: usize,
    pub lowest_number: u8,
    pub highest_number: u8,
    /// Price of the cheapest ticket (exactly `min_numbers` numbers)
    pub base_price: f64,
    /// Prize tiers, best first
    pub tiers: Vec<TierRule>,
}

impl LotteryRules {
    /// Mega-Sena: 6 to 20 numbers out of 1..=60, pays Sena/Quina/Quadra
    pub fn mega_sena() -> Self {
        Self {
            lottery_type: LotteryType::MegaSena,
            min_numbers: 6,
            max_numbers: 20,
            lowest_number: 1,
            highest_number: 60,
            base_price: 5.0,
            tiers: vec![
                TierRule::new(6, "Sena"),
                TierRule::new(5, "Quina"),
                TierRule::new(4, "Quadra"),
            ],
        }
    }

    /// Lotofácil: 15 to 20 numbers out of 1..=25, pays 11 to 15 hits
    pub fn lotofacil() -> Self {
        let tiers = (11..=15usize)
            .rev()
            .map(|hits| {
                let band = 16 - hits;
                TierRule::new(hits, format!("{hits} acertos")).with_aliases([
                    format!("{hits} pontos"),
                    format!("Faixa {band} ({hits} pontos)"),
                    format!("Faixa {band} ({hits} acertos)"),
                    format!("Faixa {band} - {hits} acertos"),
                ])
            })
            .collect();

        Self {
            lottery_type: LotteryType::Lotofacil,
            min_numbers: 15,
            max_numbers: 20,
            lowest_number: 1,
            highest_number: 25,
            base_price: 3.0,
            tiers,
        }
    }

    /// Built-in rules for a lottery
    pub fn builtin(lottery_type: LotteryType) -> Self {
        match lottery_type {
            LotteryType::MegaSena => Self::mega_sena(),
            LotteryType::Lotofacil => Self::lotofacil(),
        }
    }

    #[inline]
    pub fn number_range(&self) -> RangeInclusive<u8> {
        self.lowest_number..=self.highest_number
    }

    /// Prize tier paying exactly `hits`, if any
    pub fn tier_for_hits(&self, hits: usize) -> Option<&TierRule> {
        self.tiers.iter().find(|t| t.hits == hits)
    }

    /// Price of a ticket carrying `count` numbers.
    ///
    /// A ticket with more than `min_numbers` numbers covers every simple bet
    /// it contains, so it costs `base_price × C(count, min_numbers)`.
    pub fn ticket_cost(&self, count: usize) -> f64 {
        self.base_price * binomial(count, self.min_numbers)
    }

    fn tier_mut(&mut self, hits: usize) -> Option<&mut TierRule> {
        self.tiers.iter_mut().find(|t| t.hits == hits)
    }
}

fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64).round()
}

// ============================================================================
// RulesRegistry
// ============================================================================

/// Label overrides document:
/// `{ "megasena": { "6": ["6 acertos"] }, "lotofacil": { "15": ["..."] } }`
type LabelOverrides = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Rules for every supported lottery
#[derive(Debug, Clone, PartialEq)]
pub struct RulesRegistry {
    mega_sena: LotteryRules,
    lotofacil: LotteryRules,
}

impl Default for RulesRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RulesRegistry {
    pub fn builtin() -> Self {
        Self {
            mega_sena: LotteryRules::mega_sena(),
            lotofacil: LotteryRules::lotofacil(),
        }
    }

    /// Rules of one lottery
    pub fn get(&self, lottery_type: LotteryType) -> &LotteryRules {
        match lottery_type {
            LotteryType::MegaSena => &self.mega_sena,
            LotteryType::Lotofacil => &self.lotofacil,
        }
    }

    fn get_mut(&mut self, lottery_type: LotteryType) -> &mut LotteryRules {
        match lottery_type {
            LotteryType::MegaSena => &mut self.mega_sena,
            LotteryType::Lotofacil => &mut self.lotofacil,
        }
    }

    /// Add tier label spellings from a JSON document
    pub fn with_extra_labels_json(mut self, json: &str) -> Result<Self, RulesError> {
        let overrides: LabelOverrides =
            serde_json::from_str(json).map_err(|e| RulesError::InvalidDocument(e.to_string()))?;

        for (lottery_code, tiers) in overrides {
            let lottery = LotteryType::from_code(&lottery_code)
                .ok_or_else(|| RulesError::UnknownLottery(lottery_code.clone()))?;
            let rules = self.get_mut(lottery);

            for (hits_key, labels) in tiers {
                let tier = hits_key
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|hits| rules.tier_mut(hits))
                    .ok_or_else(|| RulesError::UnknownTier {
                        lottery,
                        hits: hits_key.clone(),
                    })?;
                for label in labels {
                    tier.add_label(label);
                }
            }
        }

        Ok(self)
    }
}
