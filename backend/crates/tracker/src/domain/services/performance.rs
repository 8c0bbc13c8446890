//! Performance Aggregation
//!
//! Portfolio metrics computed from the full ticket set on every request:
//! totals and ROI, streaks, trailing windows, per-lottery breakdowns and
//! daily/monthly series. Percentages are already multiplied by 100.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::entity::ticket::Ticket;
use crate::domain::services::frequency::count_numbers;
use crate::domain::value_object::{lottery_type::LotteryType, ticket_status::TicketStatus};

/// Trailing windows reported, in days
pub const PERIOD_WINDOWS: [i64; 3] = [30, 90, 365];

/// How many favorite numbers are reported per lottery
pub const FAVORITE_NUMBERS: usize = 10;

/// Order in which resolved tickets are walked to compute streaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakOrder {
    /// When the ticket was saved
    #[default]
    CreatedAt,
    /// Expected draw date, then contest number
    DrawDate,
}

impl StreakOrder {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "created_at" | "created" => Some(Self::CreatedAt),
            "draw_date" | "draw" => Some(Self::DrawDate),
            _ => None,
        }
    }
}

// ============================================================================
// Metrics
// ============================================================================

/// Aggregate shape shared by every breakdown
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub tickets: usize,
    pub investment: f64,
    pub winnings: f64,
    pub roi: f64,
    pub roi_percentage: f64,
    pub wins: usize,
    pub win_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Streaks {
    pub current_win_streak: usize,
    pub current_loss_streak: usize,
    pub longest_win_streak: usize,
    pub longest_loss_streak: usize,
}

/// Totals over tickets created within the last `days` days
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMetrics {
    pub days: i64,
    #[serde(flatten)]
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberCount {
    pub number: u8,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LotteryMetrics {
    pub lottery_type: LotteryType,
    #[serde(flatten)]
    pub totals: Totals,
    /// Most picked numbers, most frequent first
    pub favorite_numbers: Vec<NumberCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub tickets: usize,
    pub investment: f64,
    pub winnings: f64,
    pub roi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    /// `YYYY-MM`
    pub month: String,
    pub tickets: usize,
    pub investment: f64,
    pub winnings: f64,
    pub roi: f64,
    /// Change of `roi` against the previous month, in percent
    pub growth: f64,
}

/// Everything the performance view shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    #[serde(flatten)]
    pub totals: Totals,
    pub checked_tickets: usize,
    pub pending_tickets: usize,
    pub errored_tickets: usize,
    pub average_win: f64,
    pub largest_win: f64,
    pub streak_order: StreakOrder,
    pub streaks: Streaks,
    pub periods: Vec<PeriodMetrics>,
    pub by_lottery: Vec<LotteryMetrics>,
    pub daily: Vec<DailyPoint>,
    pub monthly: Vec<MonthlyPoint>,
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// Computation
// ============================================================================

#[derive(Default)]
struct Tally {
    tickets: usize,
    investment: f64,
    winnings: f64,
    wins: usize,
}

impl Tally {
    fn add(&mut self, ticket: &Ticket) {
        self.tickets += 1;
        self.investment += ticket.cost;
        if ticket.is_win() {
            self.wins += 1;
            self.winnings += ticket.prize;
        }
    }

    fn roi(&self) -> f64 {
        self.winnings - self.investment
    }

    fn totals(&self) -> Totals {
        Totals {
            tickets: self.tickets,
            investment: self.investment,
            winnings: self.winnings,
            roi: self.roi(),
            roi_percentage: percent(self.roi(), self.investment),
            wins: self.wins,
            win_rate: percent(self.wins as f64, self.tickets as f64),
        }
    }
}

fn tally<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> Tally {
    let mut tally = Tally::default();
    for ticket in tickets {
        tally.add(ticket);
    }
    tally
}

/// `part / whole × 100`, or 0 when `whole` is 0
fn percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 { 0.0 } else { part / whole * 100.0 }
}

/// Aggregate totals of any ticket subset
pub fn totals<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> Totals {
    tally(tickets).totals()
}

/// Win/loss streaks over checked tickets; unchecked ones are skipped
pub fn streaks(tickets: &[Ticket], order: StreakOrder) -> Streaks {
    let mut resolved: Vec<&Ticket> = tickets.iter().filter(|t| t.is_checked()).collect();
    match order {
        StreakOrder::CreatedAt => resolved.sort_by_key(|t| t.created_at),
        StreakOrder::DrawDate => {
            resolved.sort_by_key(|t| (t.expected_draw_date, t.contest_number, t.created_at))
        }
    }

    let mut streaks = Streaks::default();
    for ticket in resolved {
        if ticket.prize > 0.0 {
            streaks.current_win_streak += 1;
            streaks.current_loss_streak = 0;
            streaks.longest_win_streak = streaks.longest_win_streak.max(streaks.current_win_streak);
        } else {
            streaks.current_loss_streak += 1;
            streaks.current_win_streak = 0;
            streaks.longest_loss_streak =
                streaks.longest_loss_streak.max(streaks.current_loss_streak);
        }
    }
    streaks
}

/// Totals over tickets created strictly after `now - days`
pub fn period(tickets: &[Ticket], now: DateTime<Utc>, days: i64) -> PeriodMetrics {
    let since = now - Duration::days(days);
    PeriodMetrics {
        days,
        totals: totals(tickets.iter().filter(|t| t.created_at > since)),
    }
}

/// Top picked numbers: count descending, then number ascending
pub fn favorite_numbers<'a>(
    tickets: impl IntoIterator<Item = &'a Ticket>,
    limit: usize,
) -> Vec<NumberCount> {
    let mut counts: Vec<NumberCount> = count_numbers(tickets)
        .into_iter()
        .map(|(number, count)| NumberCount { number, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.number.cmp(&b.number)));
    counts.truncate(limit);
    counts
}

pub fn by_lottery(tickets: &[Ticket]) -> Vec<LotteryMetrics> {
    let mut groups: BTreeMap<LotteryType, Vec<&Ticket>> = BTreeMap::new();
    for ticket in tickets {
        groups.entry(ticket.lottery_type).or_default().push(ticket);
    }

    groups
        .into_iter()
        .map(|(lottery_type, group)| LotteryMetrics {
            lottery_type,
            totals: totals(group.iter().copied()),
            favorite_numbers: favorite_numbers(group.iter().copied(), FAVORITE_NUMBERS),
        })
        .collect()
}

/// One point per calendar day (UTC) with at least one ticket, oldest first
pub fn daily_series(tickets: &[Ticket]) -> Vec<DailyPoint> {
    let mut buckets: BTreeMap<NaiveDate, Tally> = BTreeMap::new();
    for ticket in tickets {
        buckets
            .entry(ticket.created_at.date_naive())
            .or_default()
            .add(ticket);
    }

    buckets
        .into_iter()
        .map(|(date, t)| DailyPoint {
            date,
            tickets: t.tickets,
            investment: t.investment,
            winnings: t.winnings,
            roi: t.roi(),
        })
        .collect()
}

/// One point per calendar month (UTC) with at least one ticket, oldest first
pub fn monthly_series(tickets: &[Ticket]) -> Vec<MonthlyPoint> {
    let mut buckets: BTreeMap<String, Tally> = BTreeMap::new();
    for ticket in tickets {
        buckets
            .entry(ticket.created_at.format("%Y-%m").to_string())
            .or_default()
            .add(ticket);
    }

    let mut series: Vec<MonthlyPoint> = Vec::with_capacity(buckets.len());
    for (month, t) in buckets {
        let roi = t.roi();
        let growth = match series.last() {
            Some(prev) if prev.roi != 0.0 => (roi - prev.roi) / prev.roi.abs() * 100.0,
            _ => 0.0,
        };
        series.push(MonthlyPoint {
            month,
            tickets: t.tickets,
            investment: t.investment,
            winnings: t.winnings,
            roi,
            growth,
        });
    }
    series
}

/// Compute every metric from the full ticket set
pub fn compute_metrics(
    tickets: &[Ticket],
    now: DateTime<Utc>,
    streak_order: StreakOrder,
) -> PerformanceMetrics {
    let overall = tally(tickets);
    let count_status = |s: TicketStatus| tickets.iter().filter(|t| t.status == s).count();
    let largest_win = tickets
        .iter()
        .filter(|t| t.is_win())
        .map(|t| t.prize)
        .fold(0.0, f64::max);

    PerformanceMetrics {
        totals: overall.totals(),
        checked_tickets: count_status(TicketStatus::Checked),
        pending_tickets: count_status(TicketStatus::Pending),
        errored_tickets: count_status(TicketStatus::Error),
        average_win: if overall.wins == 0 {
            0.0
        } else {
            overall.winnings / overall.wins as f64
        },
        largest_win,
        streak_order,
        streaks: streaks(tickets, streak_order),
        periods: PERIOD_WINDOWS
            .iter()
            .map(|&days| period(tickets, now, days))
            .collect(),
        by_lottery: by_lottery(tickets),
        daily: daily_series(tickets),
        monthly: monthly_series(tickets),
        generated_at: now,
    }
}
