//! Lottery Numbers Value Object
//!
//! The numbers a user picked for one ticket.
//!
//! ## Invariants
//! - Count between the lottery's `min_numbers` and `max_numbers`
//! - Every value inside the lottery's number range
//! - No duplicates
//! - Stored in ascending order

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::rules::LotteryRules;

// ============================================================================
// Error Types
// ============================================================================

/// Error returned when a pick violates the lottery's rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumbersError {
    /// Fewer numbers than the lottery allows
    TooFew { count: usize, min: usize },

    /// More numbers than the lottery allows
    TooMany { count: usize, max: usize },

    /// A number outside the lottery's range
    OutOfRange { number: u32, lowest: u8, highest: u8 },

    /// The same number picked twice
    Duplicate { number: u32 },
}

impl fmt::Display for NumbersError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFew { count, min } => {
                write!(f, "Too few numbers ({count} picked, minimum {min})")
            }
            Self::TooMany { count, max } => {
                write!(f, "Too many numbers ({count} picked, maximum {max})")
            }
            Self::OutOfRange {
                number,
                lowest,
                highest,
            } => write!(f, "Number {number} is outside {lowest}..={highest}"),
            Self::Duplicate { number } => write!(f, "Number {number} was picked more than once"),
        }
    }
}

impl std::error::Error for NumbersError {}

// ============================================================================
// LotteryNumbers
// ============================================================================

/// Validated, ascending set of picked numbers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotteryNumbers(Vec<u8>);

impl LotteryNumbers {
    /// Validate raw user input against the lottery's rules
    pub fn new(raw: &[u32], rules: &LotteryRules) -> Result<Self, NumbersError> {
        let count = raw.len();
        if count < rules.min_numbers {
            return Err(NumbersError::TooFew {
                count,
                min: rules.min_numbers,
            });
        }
        if count > rules.max_numbers {
            return Err(NumbersError::TooMany {
                count,
                max: rules.max_numbers,
            });
        }

        let mut numbers = Vec::with_capacity(count);
        for &n in raw {
            let value = u8::try_from(n)
                .ok()
                .filter(|v| rules.number_range().contains(v))
                .ok_or(NumbersError::OutOfRange {
                    number: n,
                    lowest: rules.lowest_number,
                    highest: rules.highest_number,
                })?;
            numbers.push(value);
        }

        numbers.sort_unstable();
        if let Some(pair) = numbers.windows(2).find(|w| w[0] == w[1]) {
            return Err(NumbersError::Duplicate {
                number: u32::from(pair[0]),
            });
        }

        Ok(Self(numbers))
    }

    /// Create from database values (assumes already validated)
    pub fn from_db(mut numbers: Vec<u8>) -> Self {
        numbers.sort_unstable();
        numbers.dedup();
        Self(numbers)
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn contains(&self, number: u8) -> bool {
        self.0.binary_search(&number).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for LotteryNumbers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|n| format!("{n:02}")).collect();
        f.write_str(&parts.join("-"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_pick_is_sorted() {
        let rules = LotteryRules::mega_sena();
        let numbers = LotteryNumbers::new(&[42, 7, 1, 60, 13, 28], &rules).unwrap();
        assert_eq!(numbers.as_slice(), &[1, 7, 13, 28, 42, 60]);
        assert_eq!(numbers.to_string(), "01-07-13-28-42-60");
        assert!(numbers.contains(42));
        assert!(!numbers.contains(43));
    }

    #[test]
    fn test_count_limits() {
        let rules = LotteryRules::mega_sena();
        assert_eq!(
            LotteryNumbers::new(&[1, 2, 3, 4, 5], &rules),
            Err(NumbersError::TooFew { count: 5, min: 6 })
        );

        let too_many: Vec<u32> = (1..=21).collect();
        assert_eq!(
            LotteryNumbers::new(&too_many, &rules),
            Err(NumbersError::TooMany { count: 21, max: 20 })
        );
    }

    #[test]
    fn test_range() {
        let rules = LotteryRules::lotofacil();
        let mut pick: Vec<u32> = (1..=14).collect();
        pick.push(26);
        assert_eq!(
            LotteryNumbers::new(&pick, &rules),
            Err(NumbersError::OutOfRange {
                number: 26,
                lowest: 1,
                highest: 25
            })
        );

        let mut pick: Vec<u32> = (1..=14).collect();
        pick.push(0);
        assert!(matches!(
            LotteryNumbers::new(&pick, &rules),
            Err(NumbersError::OutOfRange { number: 0, .. })
        ));

        let mut pick: Vec<u32> = (1..=14).collect();
        pick.push(1000);
        assert!(matches!(
            LotteryNumbers::new(&pick, &rules),
            Err(NumbersError::OutOfRange { number: 1000, .. })
        ));
    }

    #[test]
    fn test_duplicates_rejected() {
        let rules = LotteryRules::mega_sena();
        assert_eq!(
            LotteryNumbers::new(&[1, 2, 3, 4, 5, 5], &rules),
            Err(NumbersError::Duplicate { number: 5 })
        );
    }

    #[test]
    fn test_serde_is_plain_array() {
        let numbers = LotteryNumbers::from_db(vec![3, 1, 2]);
        assert_eq!(serde_json::to_string(&numbers).unwrap(), "[1,2,3]");
    }
}
