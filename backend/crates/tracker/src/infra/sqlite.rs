//! SQLite Repository Implementation

use crate::domain::entity::ticket::Ticket;
use crate::domain::repository::{StatusUpdate, TicketFilter, TicketRepository, TicketStats};
use crate::domain::value_object::{
    lottery_numbers::LotteryNumbers, lottery_type::LotteryType, ticket_status::TicketStatus,
};
use crate::error::{TrackerError, TrackerResult};
use chrono::{DateTime, NaiveDate, Utc};
use kernel::id::TicketId;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use std::str::FromStr;
use std::time::Duration;

/// Embedded schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("../../../database/migrations");

const TICKET_COLUMNS: &str = "ticket_id, lottery_type, numbers, expected_draw_date, \
     contest_number, ticket_status, cost, prize, created_at_ms, checked_at_ms";

/// Open (creating if missing) the SQLite database at `database_url`
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// SQLite-backed repository
#[derive(Clone)]
pub struct SqliteTicketRepository {
    pool: SqlitePool,
}

impl SqliteTicketRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Explain why a guarded update touched no row
    async fn reject_transition<T>(&self, ticket_id: TicketId, to: TicketStatus) -> TrackerResult<T> {
        let current = sqlx::query_scalar::<_, String>(
            "SELECT ticket_status FROM saved_tickets WHERE ticket_id = ?1",
        )
        .bind(ticket_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match current {
            None => {
                tracing::warn!(ticket_id = %ticket_id, "Ticket not found");
                Err(TrackerError::TicketNotFound(ticket_id))
            }
            Some(code) => {
                let from = TicketStatus::from_code(&code).ok_or_else(|| {
                    TrackerError::Corrupted(format!("ticket {ticket_id}: unknown status '{code}'"))
                })?;
                tracing::warn!(
                    ticket_id = %ticket_id,
                    from = %from,
                    to = %to,
                    "Status transition rejected"
                );
                Err(TrackerError::InvalidTransition { from, to })
            }
        }
    }
}

impl TicketRepository for SqliteTicketRepository {
    async fn create(&self, ticket: &Ticket) -> TrackerResult<()> {
        let numbers = serde_json::to_string(ticket.numbers.as_slice())
            .map_err(|e| TrackerError::Internal(format!("numbers encoding: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO saved_tickets (
                ticket_id,
                lottery_type,
                numbers,
                expected_draw_date,
                contest_number,
                ticket_status,
                cost,
                prize,
                created_at_ms,
                checked_at_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(ticket.ticket_id.to_string())
        .bind(ticket.lottery_type.code())
        .bind(numbers)
        .bind(ticket.expected_draw_date)
        .bind(i64::from(ticket.contest_number))
        .bind(ticket.status.code())
        .bind(ticket.cost)
        .bind(ticket.prize)
        .bind(ticket.created_at.timestamp_millis())
        .bind(ticket.checked_at.map(|t| t.timestamp_millis()))
        .execute(&self.pool)
        .await?;

        tracing::debug!(ticket_id = %ticket.ticket_id, "Ticket row inserted");
        Ok(())
    }

    async fn find_by_id(&self, ticket_id: TicketId) -> TrackerResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM saved_tickets WHERE ticket_id = ?1"
        ))
        .bind(ticket_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TicketRow::into_ticket).transpose()
    }

    async fn list(&self, filter: &TicketFilter) -> TrackerResult<Vec<Ticket>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {TICKET_COLUMNS} FROM saved_tickets WHERE 1 = 1"));

        if let Some(lottery_type) = filter.lottery_type {
            qb.push(" AND lottery_type = ").push_bind(lottery_type.code());
        }
        if let Some(status) = filter.status {
            qb.push(" AND ticket_status = ").push_bind(status.code());
        }
        if let Some(from) = filter.from {
            qb.push(" AND expected_draw_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND expected_draw_date <= ").push_bind(to);
        }
        qb.push(" ORDER BY created_at_ms DESC, rowid DESC");

        let rows = qb
            .build_query_as::<TicketRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TicketRow::into_ticket).collect()
    }

    async fn update_status(
        &self,
        ticket_id: TicketId,
        update: &StatusUpdate,
    ) -> TrackerResult<Ticket> {
        let allowed_from = update.status.predecessors();
        if allowed_from.is_empty() {
            return self.reject_transition(ticket_id, update.status).await;
        }

        // Status, prize and checked_at change together, guarded by the
        // current status, in one statement.
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE saved_tickets SET ticket_status = ");
        qb.push_bind(update.status.code());
        qb.push(", prize = COALESCE(")
            .push_bind(update.prize)
            .push(", prize)");
        qb.push(", checked_at_ms = ")
            .push_bind(update.checked_at.timestamp_millis());
        qb.push(" WHERE ticket_id = ")
            .push_bind(ticket_id.to_string());
        qb.push(" AND ticket_status IN (");
        let mut statuses = qb.separated(", ");
        for status in allowed_from {
            statuses.push_bind(status.code());
        }
        statuses.push_unseparated(")");
        qb.push(format!(" RETURNING {TICKET_COLUMNS}"));

        let row = qb
            .build_query_as::<TicketRow>()
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => row.into_ticket(),
            None => self.reject_transition(ticket_id, update.status).await,
        }
    }

    async fn delete(&self, ticket_id: TicketId) -> TrackerResult<()> {
        let deleted = sqlx::query("DELETE FROM saved_tickets WHERE ticket_id = ?1")
            .bind(ticket_id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(TrackerError::TicketNotFound(ticket_id));
        }
        Ok(())
    }

    async fn stats(&self) -> TrackerResult<TicketStats> {
        let rows = sqlx::query_as::<_, (String, String, i64)>(
            r#"
            SELECT lottery_type, ticket_status, COUNT(*)
            FROM saved_tickets
            GROUP BY lottery_type, ticket_status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut stats = TicketStats::default();
        for (lottery_code, status_code, count) in rows {
            let lottery_type = LotteryType::from_code(&lottery_code).ok_or_else(|| {
                TrackerError::Corrupted(format!("unknown lottery '{lottery_code}'"))
            })?;
            let status = TicketStatus::from_code(&status_code).ok_or_else(|| {
                TrackerError::Corrupted(format!("unknown status '{status_code}'"))
            })?;
            stats.add(lottery_type, status, count.max(0) as u64);
        }
        Ok(stats)
    }
}

// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct TicketRow {
    ticket_id: String,
    lottery_type: String,
    numbers: String,
    expected_draw_date: NaiveDate,
    contest_number: i64,
    ticket_status: String,
    cost: f64,
    prize: f64,
    created_at_ms: i64,
    checked_at_ms: Option<i64>,
}

impl TicketRow {
    fn into_ticket(self) -> TrackerResult<Ticket> {
        let id = &self.ticket_id;
        let corrupted = |what: String| TrackerError::Corrupted(format!("ticket {id}: {what}"));

        let ticket_id = TicketId::from_str(id).map_err(|e| corrupted(format!("id: {e}")))?;
        let lottery_type = LotteryType::from_code(&self.lottery_type)
            .ok_or_else(|| corrupted(format!("unknown lottery '{}'", self.lottery_type)))?;
        let numbers: Vec<u8> =
            serde_json::from_str(&self.numbers).map_err(|e| corrupted(format!("numbers: {e}")))?;
        let contest_number = u32::try_from(self.contest_number)
            .map_err(|_| corrupted(format!("contest number {}", self.contest_number)))?;
        let status = TicketStatus::from_code(&self.ticket_status)
            .ok_or_else(|| corrupted(format!("unknown status '{}'", self.ticket_status)))?;
        let created_at = from_millis(self.created_at_ms)
            .ok_or_else(|| corrupted(format!("created_at {}", self.created_at_ms)))?;
        let checked_at = match self.checked_at_ms {
            Some(ms) => Some(from_millis(ms).ok_or_else(|| corrupted(format!("checked_at {ms}")))?),
            None => None,
        };

        Ok(Ticket {
            ticket_id,
            lottery_type,
            numbers: LotteryNumbers::from_db(numbers),
            expected_draw_date: self.expected_draw_date,
            contest_number,
            status,
            cost: self.cost,
            prize: self.prize,
            created_at,
            checked_at,
        })
    }
}

fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}
