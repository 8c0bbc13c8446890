//! Number Frequency Analysis
//!
//! How often each number of a lottery appears across the user's tickets,
//! classified hot/cold at one standard deviation from the mean.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::entity::ticket::Ticket;
use crate::domain::rules::LotteryRules;

/// Classification of a number's pick frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    /// Picked more than one standard deviation above the mean
    Hot,
    Neutral,
    /// Picked more than one standard deviation below the mean
    Cold,
}

/// Frequency of one number
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberFrequency {
    pub number: u8,
    /// Tickets containing the number
    pub count: usize,
    /// Share of the lottery's tickets containing the number, in percent
    pub frequency: f64,
    pub temperature: Temperature,
}

/// How many times each number was picked
pub fn count_numbers<'a, I>(tickets: I) -> BTreeMap<u8, usize>
where
    I: IntoIterator<Item = &'a Ticket>,
{
    let mut counts = BTreeMap::new();
    for ticket in tickets {
        for n in ticket.numbers.iter() {
            *counts.entry(n).or_insert(0) += 1;
        }
    }
    counts
}

/// Frequency of every number in the lottery's range, most picked first
///
/// Tickets of other lotteries are ignored. Numbers never picked are included
/// with a zero count. Ties are ordered by number.
pub fn number_frequency(tickets: &[Ticket], rules: &LotteryRules) -> Vec<NumberFrequency> {
    let relevant: Vec<&Ticket> = tickets
        .iter()
        .filter(|t| t.lottery_type == rules.lottery_type)
        .collect();
    let counts = count_numbers(relevant.iter().copied());

    let per_number: Vec<(u8, usize)> = rules
        .number_range()
        .map(|n| (n, counts.get(&n).copied().unwrap_or(0)))
        .collect();

    let (mean, sd) = mean_and_stddev(per_number.iter().map(|&(_, c)| c as f64));
    let ticket_count = relevant.len();

    let mut result: Vec<NumberFrequency> = per_number
        .into_iter()
        .map(|(number, count)| {
            let c = count as f64;
            let temperature = if c > mean + sd {
                Temperature::Hot
            } else if c < mean - sd {
                Temperature::Cold
            } else {
                Temperature::Neutral
            };
            NumberFrequency {
                number,
                count,
                frequency: if ticket_count == 0 {
                    0.0
                } else {
                    c / ticket_count as f64 * 100.0
                },
                temperature,
            }
        })
        .collect();

    result.sort_by(|a, b| b.count.cmp(&a.count).then(a.number.cmp(&b.number)));
    result
}

/// Population mean and standard deviation
fn mean_and_stddev(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let n = values.clone().count();
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    let variance = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    (mean, variance.sqrt())
}
