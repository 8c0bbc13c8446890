//! Result Matcher
//!
//! Pure mapping of (ticket, draw) to a `GameResult`. The prize tier is read
//! from the draw's own tier list through the lottery's label table, so a
//! data source that renames a tier only needs a new label entry.

use crate::domain::entity::draw::{DrawResult, GameResult};
use crate::domain::entity::ticket::Ticket;
use crate::domain::rules::LotteryRules;

/// Numbers present in both lists, ascending and without duplicates
pub fn matched_numbers(picked: &[u8], drawn: &[u8]) -> Vec<u8> {
    let mut matches: Vec<u8> = picked
        .iter()
        .copied()
        .filter(|n| drawn.contains(n))
        .collect();
    matches.sort_unstable();
    matches.dedup();
    matches
}

/// Compute what `ticket` won in `draw`
///
/// A hit count below the lottery's lowest prize tier is a plain loss labelled
/// `"<n> acertos"`. A prize-eligible hit count whose tier is missing from the
/// draw's tier list is also a zero-prize loss; it is logged, not raised.
pub fn match_ticket(ticket: &Ticket, draw: &DrawResult, rules: &LotteryRules) -> GameResult {
    let matches = matched_numbers(ticket.numbers.as_slice(), &draw.numbers);
    let hit_count = matches.len();

    let (tier_label, prize, is_winner) = match rules.tier_for_hits(hit_count) {
        None => (format!("{hit_count} acertos"), 0.0, false),
        Some(rule) => match draw.tiers.iter().find(|t| rule.matches(&t.label)) {
            Some(tier) => (rule.canonical_label.clone(), tier.prize, true),
            None => {
                tracing::warn!(
                    ticket_id = %ticket.ticket_id,
                    lottery = %ticket.lottery_type,
                    contest_number = draw.contest_number,
                    hit_count,
                    tier = %rule.canonical_label,
                    "Prize tier missing from draw result, recording zero prize"
                );
                (rule.canonical_label.clone(), 0.0, false)
            }
        },
    };

    GameResult {
        contest_number: draw.contest_number,
        draw_date: draw.draw_date,
        matches,
        hit_count,
        tier_label,
        prize,
        is_winner,
    }
}
