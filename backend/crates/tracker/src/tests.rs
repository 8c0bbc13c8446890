//! Integration tests for the tracker crate
//!
//! Repository and use cases run against an in-memory SQLite database with
//! the real migrations applied; draws come from a scripted stub.

#[cfg(test)]
mod support {
    use crate::domain::draw_source::{DrawSource, DrawSourceError};
    use crate::domain::entity::draw::{DrawResult, PrizeTier};
    use crate::domain::entity::ticket::NewTicket;
    use crate::domain::value_object::lottery_type::LotteryType;
    use crate::infra::sqlite::{MIGRATOR, SqliteTicketRepository};
    use chrono::NaiveDate;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub async fn memory_pool() -> SqlitePool {
        // One connection that never closes: every connection to
        // `sqlite::memory:` is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    pub async fn repo() -> SqliteTicketRepository {
        SqliteTicketRepository::new(memory_pool().await)
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn mega(numbers: &[u32], contest_number: u32) -> NewTicket {
        NewTicket {
            lottery_type: LotteryType::MegaSena,
            numbers: numbers.to_vec(),
            expected_draw_date: date(2025, 3, 15),
            contest_number,
            cost: None,
        }
    }

    pub fn lotofacil(numbers: &[u32], contest_number: u32) -> NewTicket {
        NewTicket {
            lottery_type: LotteryType::Lotofacil,
            numbers: numbers.to_vec(),
            expected_draw_date: date(2025, 3, 17),
            contest_number,
            cost: None,
        }
    }

    pub fn mega_draw(contest_number: u32, numbers: &[u8]) -> DrawResult {
        DrawResult {
            contest_number,
            draw_date: date(2025, 3, 15),
            numbers: numbers.to_vec(),
            tiers: vec![
                PrizeTier {
                    label: "Sena".to_string(),
                    winners: 1,
                    prize: 10_000_000.0,
                },
                PrizeTier {
                    label: "Quina".to_string(),
                    winners: 20,
                    prize: 50_000.0,
                },
                PrizeTier {
                    label: "Quadra".to_string(),
                    winners: 1500,
                    prize: 1_000.0,
                },
            ],
        }
    }

    type Outcome = Result<Option<DrawResult>, DrawSourceError>;

    /// Draw source answering from a script; unknown contests are not drawn yet
    #[derive(Default)]
    pub struct StubDrawSource {
        outcomes: Mutex<HashMap<(LotteryType, u32), Outcome>>,
        calls: AtomicUsize,
    }

    impl StubDrawSource {
        pub fn with(self, lottery_type: LotteryType, contest_number: u32, outcome: Outcome) -> Self {
            self.set(lottery_type, contest_number, outcome);
            self
        }

        pub fn set(&self, lottery_type: LotteryType, contest_number: u32, outcome: Outcome) {
            self.outcomes
                .lock()
                .unwrap()
                .insert((lottery_type, contest_number), outcome);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DrawSource for StubDrawSource {
        async fn fetch_draw(
            &self,
            lottery_type: LotteryType,
            contest_number: u32,
        ) -> Result<Option<DrawResult>, DrawSourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .get(&(lottery_type, contest_number))
                .cloned()
                .unwrap_or(Ok(None))
        }
    }
}

#[cfg(test)]
mod repository_tests {
    use super::support::*;
    use crate::domain::entity::ticket::{Ticket, now_ms};
    use crate::domain::repository::{StatusUpdate, TicketFilter, TicketRepository};
    use crate::domain::rules::LotteryRules;
    use crate::domain::value_object::{lottery_type::LotteryType, ticket_status::TicketStatus};
    use crate::error::TrackerError;
    use chrono::Duration;
    use kernel::id::TicketId;

    fn ticket(req: crate::domain::entity::ticket::NewTicket) -> Ticket {
        let rules = LotteryRules::builtin(req.lottery_type);
        Ticket::create(req, &rules).unwrap()
    }

    fn checked(prize: f64) -> StatusUpdate {
        StatusUpdate {
            status: TicketStatus::Checked,
            prize: Some(prize),
            checked_at: now_ms(),
        }
    }

    #[tokio::test]
    async fn test_round_trip() {
        let repo = repo().await;
        let original = ticket(mega(&[60, 1, 33, 12, 7, 45], 2840));
        repo.create(&original).await.unwrap();

        let loaded = repo.find_by_id(original.ticket_id).await.unwrap().unwrap();
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn test_find_unknown_is_none() {
        let repo = repo().await;
        assert!(repo.find_by_id(TicketId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_order() {
        let repo = repo().await;

        let mut a = ticket(mega(&[1, 2, 3, 4, 5, 6], 1));
        a.expected_draw_date = date(2025, 1, 10);
        let mut b = ticket(lotofacil(&(1..=15).collect::<Vec<u32>>(), 2));
        b.expected_draw_date = date(2025, 2, 10);
        b.created_at = a.created_at + Duration::seconds(1);
        let mut c = ticket(mega(&[7, 8, 9, 10, 11, 12], 3));
        c.expected_draw_date = date(2025, 3, 10);
        c.created_at = a.created_at + Duration::seconds(2);

        for t in [&a, &b, &c] {
            repo.create(t).await.unwrap();
        }
        repo.update_status(c.ticket_id, &checked(0.0)).await.unwrap();

        let all = repo.list(&TicketFilter::default()).await.unwrap();
        let ids: Vec<TicketId> = all.iter().map(|t| t.ticket_id).collect();
        assert_eq!(ids, vec![c.ticket_id, b.ticket_id, a.ticket_id]);

        let megasena = repo
            .list(&TicketFilter {
                lottery_type: Some(LotteryType::MegaSena),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(megasena.len(), 2);

        let pending = repo.list(&TicketFilter::pending()).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|t| t.status == TicketStatus::Pending));

        let window = repo
            .list(&TicketFilter {
                from: Some(date(2025, 2, 10)),
                to: Some(date(2025, 3, 10)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(window.len(), 2);

        let none = repo
            .list(&TicketFilter {
                lottery_type: Some(LotteryType::Lotofacil),
                status: Some(TicketStatus::Checked),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_status_sets_prize_and_checked_at_together() {
        let repo = repo().await;
        let t = ticket(mega(&[1, 2, 3, 4, 5, 6], 10));
        repo.create(&t).await.unwrap();

        let updated = repo.update_status(t.ticket_id, &checked(1_000.0)).await.unwrap();
        assert_eq!(updated.status, TicketStatus::Checked);
        assert_eq!(updated.prize, 1_000.0);
        assert!(updated.checked_at.is_some());

        let loaded = repo.find_by_id(t.ticket_id).await.unwrap().unwrap();
        assert_eq!(loaded, updated);
    }

    #[tokio::test]
    async fn test_error_update_keeps_prize() {
        let repo = repo().await;
        let t = ticket(mega(&[1, 2, 3, 4, 5, 6], 10));
        repo.create(&t).await.unwrap();

        let update = StatusUpdate {
            status: TicketStatus::Error,
            prize: None,
            checked_at: now_ms(),
        };
        let errored = repo.update_status(t.ticket_id, &update).await.unwrap();
        assert_eq!(errored.status, TicketStatus::Error);
        assert_eq!(errored.prize, 0.0);
        assert!(errored.checked_at.is_some());

        // Error -> Checked is a retry
        let resolved = repo.update_status(t.ticket_id, &checked(5.0)).await.unwrap();
        assert_eq!(resolved.status, TicketStatus::Checked);
    }

    #[tokio::test]
    async fn test_rejected_transitions() {
        let repo = repo().await;
        let t = ticket(mega(&[1, 2, 3, 4, 5, 6], 10));
        repo.create(&t).await.unwrap();
        repo.update_status(t.ticket_id, &checked(0.0)).await.unwrap();

        let to_error = StatusUpdate {
            status: TicketStatus::Error,
            prize: None,
            checked_at: now_ms(),
        };
        let err = repo.update_status(t.ticket_id, &to_error).await.unwrap_err();
        assert!(matches!(
            err,
            TrackerError::InvalidTransition {
                from: TicketStatus::Checked,
                to: TicketStatus::Error
            }
        ));

        let to_pending = StatusUpdate {
            status: TicketStatus::Pending,
            prize: None,
            checked_at: now_ms(),
        };
        let err = repo.update_status(t.ticket_id, &to_pending).await.unwrap_err();
        assert!(matches!(err, TrackerError::InvalidTransition { .. }));

        let stored = repo.find_by_id(t.ticket_id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Checked);
    }

    #[tokio::test]
    async fn test_unknown_ticket_is_not_found() {
        let repo = repo().await;
        let id = TicketId::new();

        let err = repo.update_status(id, &checked(0.0)).await.unwrap_err();
        assert!(matches!(err, TrackerError::TicketNotFound(x) if x == id));

        let err = repo.delete(id).await.unwrap_err();
        assert!(matches!(err, TrackerError::TicketNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repo().await;
        let t = ticket(mega(&[1, 2, 3, 4, 5, 6], 10));
        repo.create(&t).await.unwrap();

        repo.delete(t.ticket_id).await.unwrap();
        assert!(repo.find_by_id(t.ticket_id).await.unwrap().is_none());
        assert!(repo.delete(t.ticket_id).await.is_err());
    }

    #[tokio::test]
    async fn test_stats() {
        let repo = repo().await;
        let a = ticket(mega(&[1, 2, 3, 4, 5, 6], 1));
        let b = ticket(mega(&[1, 2, 3, 4, 5, 7], 1));
        let c = ticket(lotofacil(&(1..=15).collect::<Vec<u32>>(), 1));
        for t in [&a, &b, &c] {
            repo.create(t).await.unwrap();
        }
        repo.update_status(a.ticket_id, &checked(0.0)).await.unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.count(LotteryType::MegaSena, TicketStatus::Checked), 1);
        assert_eq!(stats.count(LotteryType::MegaSena, TicketStatus::Pending), 1);
        assert_eq!(stats.count(LotteryType::Lotofacil, TicketStatus::Pending), 1);
        assert_eq!(stats.count(LotteryType::Lotofacil, TicketStatus::Checked), 0);
    }

    #[tokio::test]
    async fn test_schema_rejects_checked_without_timestamp() {
        let pool = memory_pool().await;
        let result = sqlx::query(
            r#"
            INSERT INTO saved_tickets (
                ticket_id, lottery_type, numbers, expected_draw_date, contest_number,
                ticket_status, cost, prize, created_at_ms, checked_at_ms
            ) VALUES ('x', 'megasena', '[1,2,3,4,5,6]', '2025-01-01', 1, 'checked', 5, 0, 0, NULL)
            "#,
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }
}

#[cfg(test)]
mod use_case_tests {
    use super::support::*;
    use crate::application::check_results::CheckResultsUseCase;
    use crate::application::config::{ErroredTicketPolicy, TrackerConfig};
    use crate::application::performance::PerformanceUseCase;
    use crate::application::query_tickets::QueryTicketsUseCase;
    use crate::application::save_ticket::SaveTicketUseCase;
    use crate::application::update_ticket::UpdateTicketUseCase;
    use crate::domain::draw_source::DrawSourceError;
    use crate::domain::repository::{TicketFilter, TicketRepository};
    use crate::domain::rules::RulesRegistry;
    use crate::domain::value_object::{lottery_type::LotteryType, ticket_status::TicketStatus};
    use crate::error::{ACTION_RETRY_MANUALLY, ACTION_WILL_RETRY, TrackerError};
    use crate::infra::sqlite::SqliteTicketRepository;
    use kernel::error::app_error::AppError;
    use kernel::id::TicketId;
    use std::sync::Arc;

    struct Fixture {
        repo: Arc<SqliteTicketRepository>,
        draws: Arc<StubDrawSource>,
        rules: Arc<RulesRegistry>,
        config: Arc<TrackerConfig>,
    }

    impl Fixture {
        async fn new() -> Self {
            Self::with_config(TrackerConfig::default()).await
        }

        async fn with_config(config: TrackerConfig) -> Self {
            Self {
                repo: Arc::new(repo().await),
                draws: Arc::new(StubDrawSource::default()),
                rules: Arc::new(RulesRegistry::builtin()),
                config: Arc::new(config),
            }
        }

        fn save(&self) -> SaveTicketUseCase<SqliteTicketRepository> {
            SaveTicketUseCase::new(self.repo.clone(), self.rules.clone())
        }

        fn query(&self) -> QueryTicketsUseCase<SqliteTicketRepository> {
            QueryTicketsUseCase::new(self.repo.clone())
        }

        fn check(&self) -> CheckResultsUseCase<SqliteTicketRepository, StubDrawSource> {
            CheckResultsUseCase::new(
                self.repo.clone(),
                self.draws.clone(),
                self.rules.clone(),
                self.config.clone(),
            )
        }

        fn performance(&self) -> PerformanceUseCase<SqliteTicketRepository> {
            PerformanceUseCase::new(self.repo.clone(), self.rules.clone(), self.config.clone())
        }
    }

    #[tokio::test]
    async fn test_save_starts_pending() {
        let fx = Fixture::new().await;
        let ticket = fx.save().execute(mega(&[6, 5, 4, 3, 2, 1], 2840)).await.unwrap();

        assert_eq!(ticket.status, TicketStatus::Pending);
        assert!(ticket.checked_at.is_none());

        let loaded = fx.query().get(ticket.ticket_id).await.unwrap();
        assert_eq!(loaded, ticket);
        assert_eq!(fx.query().list_pending().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_numbers() {
        let fx = Fixture::new().await;

        for numbers in [&[1, 2, 3, 4, 5][..], &[1, 2, 3, 4, 5, 61], &[1, 1, 2, 3, 4, 5]] {
            let err = fx.save().execute(mega(numbers, 1)).await.unwrap_err();
            assert!(matches!(err, TrackerError::Validation(_)), "{numbers:?}");
        }
        assert_eq!(fx.repo.stats().await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let fx = Fixture::new().await;
        let err = fx.query().get(TicketId::new()).await.unwrap_err();
        assert!(matches!(err, TrackerError::TicketNotFound(_)));
    }

    #[tokio::test]
    async fn test_list_rejects_inverted_range() {
        let fx = Fixture::new().await;
        let filter = TicketFilter {
            from: Some(date(2025, 2, 1)),
            to: Some(date(2025, 1, 1)),
            ..Default::default()
        };
        assert!(matches!(
            fx.query().list(&filter).await,
            Err(TrackerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_check_one_winner() {
        let fx = Fixture::new().await;
        let ticket = fx.save().execute(mega(&[1, 2, 3, 4, 5, 6], 2840)).await.unwrap();
        fx.draws.set(
            LotteryType::MegaSena,
            2840,
            Ok(Some(mega_draw(2840, &[6, 5, 4, 3, 2, 1]))),
        );

        let result = fx.check().check_one(ticket.ticket_id).await.unwrap().result.unwrap();
        assert_eq!(result.hit_count, 6);
        assert_eq!(result.matches, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(result.tier_label, "Sena");
        assert!(result.is_winner);

        let stored = fx.query().get(ticket.ticket_id).await.unwrap();
        assert_eq!(stored.status, TicketStatus::Checked);
        assert_eq!(stored.prize, 10_000_000.0);
        assert!(stored.checked_at.is_some());
    }

    #[tokio::test]
    async fn test_check_one_loser() {
        let fx = Fixture::new().await;
        let ticket = fx.save().execute(mega(&[1, 2, 3, 7, 8, 9], 2840)).await.unwrap();
        fx.draws.set(
            LotteryType::MegaSena,
            2840,
            Ok(Some(mega_draw(2840, &[1, 2, 3, 4, 5, 6]))),
        );

        let result = fx.check().check_one(ticket.ticket_id).await.unwrap().result.unwrap();
        assert_eq!(result.hit_count, 3);
        assert_eq!(result.matches, vec![1, 2, 3]);
        assert!(!result.is_winner);
        assert_eq!(result.prize, 0.0);

        let stored = fx.query().get(ticket.ticket_id).await.unwrap();
        assert_eq!(stored.status, TicketStatus::Checked);
        assert_eq!(stored.prize, 0.0);
    }

    #[tokio::test]
    async fn test_check_one_not_drawn_yet_stays_pending() {
        let fx = Fixture::new().await;
        let ticket = fx.save().execute(mega(&[1, 2, 3, 4, 5, 6], 9000)).await.unwrap();

        let outcome = fx.check().check_one(ticket.ticket_id).await.unwrap();
        assert!(outcome.result.is_none());
        assert_eq!(outcome.status, TicketStatus::Pending);
        assert_eq!(outcome.message, TicketStatus::Pending.user_message());

        let stored = fx.query().get(ticket.ticket_id).await.unwrap();
        assert_eq!(stored, ticket);
    }

    #[tokio::test]
    async fn test_errored_ticket_not_drawn_yet_keeps_error() {
        let fx = Fixture::new().await;
        let ticket = fx.save().execute(mega(&[1, 2, 3, 4, 5, 6], 2840)).await.unwrap();
        fx.draws
            .set(LotteryType::MegaSena, 2840, Err(DrawSourceError::Timeout));
        fx.check().check_one(ticket.ticket_id).await.unwrap_err();

        fx.draws.set(LotteryType::MegaSena, 2840, Ok(None));
        let outcome = fx.check().check_one(ticket.ticket_id).await.unwrap();
        assert!(outcome.result.is_none());
        assert_eq!(outcome.status, TicketStatus::Error);
        assert!(outcome.message.contains("retry manually"));

        let stored = fx.query().get(ticket.ticket_id).await.unwrap();
        assert_eq!(stored.status, TicketStatus::Error);
    }

    #[tokio::test]
    async fn test_errored_ticket_message_follows_retry_policy() {
        let fx = Fixture::with_config(TrackerConfig {
            errored_ticket_policy: ErroredTicketPolicy::RetryInSweep,
            ..TrackerConfig::default()
        })
        .await;
        let ticket = fx.save().execute(mega(&[1, 2, 3, 4, 5, 6], 2840)).await.unwrap();
        fx.draws
            .set(LotteryType::MegaSena, 2840, Err(DrawSourceError::Timeout));
        fx.check().check_one(ticket.ticket_id).await.unwrap_err();

        fx.draws.set(LotteryType::MegaSena, 2840, Ok(None));
        let outcome = fx.check().check_one(ticket.ticket_id).await.unwrap();
        assert_eq!(outcome.status, TicketStatus::Error);
        assert!(outcome.message.contains("will retry"));
    }

    #[tokio::test]
    async fn test_check_one_fetch_failure_marks_error() {
        let fx = Fixture::new().await;
        let ticket = fx.save().execute(mega(&[1, 2, 3, 4, 5, 6], 2840)).await.unwrap();
        fx.draws
            .set(LotteryType::MegaSena, 2840, Err(DrawSourceError::Timeout));

        let err = fx.check().check_one(ticket.ticket_id).await.unwrap_err();
        assert!(matches!(
            err,
            TrackerError::CheckFailed {
                source: DrawSourceError::Timeout,
                will_retry: false,
                ..
            }
        ));
        let app: AppError = err.into();
        assert_eq!(app.action(), Some(ACTION_RETRY_MANUALLY));

        let stored = fx.query().get(ticket.ticket_id).await.unwrap();
        assert_eq!(stored.status, TicketStatus::Error);
        assert!(stored.checked_at.is_some());

        // Manual retry once the source recovers
        fx.draws.set(
            LotteryType::MegaSena,
            2840,
            Ok(Some(mega_draw(2840, &[1, 2, 3, 4, 50, 60]))),
        );
        let result = fx.check().check_one(ticket.ticket_id).await.unwrap().result.unwrap();
        assert_eq!(result.tier_label, "Quadra");
        let stored = fx.query().get(ticket.ticket_id).await.unwrap();
        assert_eq!(stored.status, TicketStatus::Checked);
        assert_eq!(stored.prize, 1_000.0);
    }

    #[tokio::test]
    async fn test_recheck_failure_keeps_checked_result() {
        let fx = Fixture::new().await;
        let ticket = fx.save().execute(mega(&[1, 2, 3, 4, 5, 6], 2840)).await.unwrap();
        fx.draws.set(
            LotteryType::MegaSena,
            2840,
            Ok(Some(mega_draw(2840, &[1, 2, 3, 4, 5, 60]))),
        );
        fx.check().check_one(ticket.ticket_id).await.unwrap();

        fx.draws.set(
            LotteryType::MegaSena,
            2840,
            Err(DrawSourceError::Unavailable("503".into())),
        );
        let err = fx.check().check_one(ticket.ticket_id).await.unwrap_err();
        assert_eq!(err.action(), Some(ACTION_WILL_RETRY));

        let stored = fx.query().get(ticket.ticket_id).await.unwrap();
        assert_eq!(stored.status, TicketStatus::Checked);
        assert_eq!(stored.prize, 50_000.0);
    }

    #[tokio::test]
    async fn test_check_one_wrong_contest_is_malformed() {
        let fx = Fixture::new().await;
        let ticket = fx.save().execute(mega(&[1, 2, 3, 4, 5, 6], 2840)).await.unwrap();
        fx.draws.set(
            LotteryType::MegaSena,
            2840,
            Ok(Some(mega_draw(2839, &[1, 2, 3, 4, 5, 6]))),
        );

        let err = fx.check().check_one(ticket.ticket_id).await.unwrap_err();
        assert!(matches!(
            err,
            TrackerError::CheckFailed {
                source: DrawSourceError::Malformed(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_check_one_unknown_ticket() {
        let fx = Fixture::new().await;
        let err = fx.check().check_one(TicketId::new()).await.unwrap_err();
        assert!(matches!(err, TrackerError::TicketNotFound(_)));
        assert_eq!(fx.draws.calls(), 0);
    }

    #[tokio::test]
    async fn test_sweep_collects_failures_and_continues() {
        let fx = Fixture::new().await;
        let save = fx.save();
        let winner = save.execute(mega(&[1, 2, 3, 4, 5, 6], 100)).await.unwrap();
        let loser = save.execute(mega(&[10, 20, 30, 40, 50, 60], 100)).await.unwrap();
        let broken = save.execute(mega(&[1, 2, 3, 4, 5, 6], 101)).await.unwrap();
        let future = save.execute(mega(&[1, 2, 3, 4, 5, 6], 102)).await.unwrap();

        fx.draws.set(
            LotteryType::MegaSena,
            100,
            Ok(Some(mega_draw(100, &[1, 2, 3, 4, 5, 6]))),
        );
        fx.draws.set(
            LotteryType::MegaSena,
            101,
            Err(DrawSourceError::Malformed("bad json".into())),
        );

        let report = fx.check().check_all_pending().await.unwrap();
        assert_eq!(report.examined, 4);
        assert_eq!(report.checked, 2);
        assert_eq!(report.winners, 1);
        assert_eq!(report.still_pending, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].ticket_id, broken.ticket_id);

        // Contest 100 fetched once for both of its tickets
        assert_eq!(fx.draws.calls(), 3);

        let q = fx.query();
        assert_eq!(q.get(winner.ticket_id).await.unwrap().status, TicketStatus::Checked);
        assert_eq!(q.get(loser.ticket_id).await.unwrap().status, TicketStatus::Checked);
        assert_eq!(q.get(broken.ticket_id).await.unwrap().status, TicketStatus::Error);
        assert_eq!(q.get(future.ticket_id).await.unwrap().status, TicketStatus::Pending);
    }

    #[tokio::test]
    async fn test_sweep_skips_errored_tickets_by_default() {
        let fx = Fixture::new().await;
        let ticket = fx.save().execute(mega(&[1, 2, 3, 4, 5, 6], 100)).await.unwrap();
        fx.draws
            .set(LotteryType::MegaSena, 100, Err(DrawSourceError::Timeout));
        fx.check().check_all_pending().await.unwrap();

        fx.draws.set(
            LotteryType::MegaSena,
            100,
            Ok(Some(mega_draw(100, &[1, 2, 3, 4, 5, 6]))),
        );
        let report = fx.check().check_all_pending().await.unwrap();
        assert_eq!(report.examined, 0);
        assert_eq!(
            fx.query().get(ticket.ticket_id).await.unwrap().status,
            TicketStatus::Error
        );
    }

    #[tokio::test]
    async fn test_sweep_retries_errored_tickets_when_configured() {
        let fx = Fixture::with_config(TrackerConfig {
            errored_ticket_policy: ErroredTicketPolicy::RetryInSweep,
            ..TrackerConfig::default()
        })
        .await;
        let ticket = fx.save().execute(mega(&[1, 2, 3, 4, 5, 6], 100)).await.unwrap();
        fx.draws
            .set(LotteryType::MegaSena, 100, Err(DrawSourceError::Timeout));

        let err = fx.check().check_one(ticket.ticket_id).await.unwrap_err();
        assert_eq!(err.action(), Some(ACTION_WILL_RETRY));

        fx.draws.set(
            LotteryType::MegaSena,
            100,
            Ok(Some(mega_draw(100, &[1, 2, 3, 4, 5, 6]))),
        );
        let report = fx.check().check_all_pending().await.unwrap();
        assert_eq!(report.examined, 1);
        assert_eq!(report.winners, 1);
        assert_eq!(
            fx.query().get(ticket.ticket_id).await.unwrap().status,
            TicketStatus::Checked
        );
    }

    #[tokio::test]
    async fn test_sweep_on_empty_store() {
        let fx = Fixture::new().await;
        let report = fx.check().check_all_pending().await.unwrap();
        assert_eq!(report, Default::default());
    }

    #[tokio::test]
    async fn test_manual_status_update() {
        let fx = Fixture::new().await;
        let ticket = fx.save().execute(mega(&[1, 2, 3, 4, 5, 6], 100)).await.unwrap();
        let update = UpdateTicketUseCase::new(fx.repo.clone());

        let err = update
            .update_status(ticket.ticket_id, TicketStatus::Error, Some(5.0))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));

        let err = update
            .update_status(ticket.ticket_id, TicketStatus::Checked, Some(-5.0))
            .await
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));

        let updated = update
            .update_status(ticket.ticket_id, TicketStatus::Checked, Some(25.0))
            .await
            .unwrap();
        assert_eq!(updated.prize, 25.0);

        update.delete(ticket.ticket_id).await.unwrap();
        assert!(matches!(
            update.delete(ticket.ticket_id).await,
            Err(TrackerError::TicketNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_metrics_read_current_state() {
        let fx = Fixture::new().await;
        let mut first = mega(&[1, 2, 3, 4, 5, 6], 100);
        first.cost = Some(10.0);
        let mut second = mega(&[7, 8, 9, 10, 11, 12], 100);
        second.cost = Some(20.0);
        let a = fx.save().execute(first).await.unwrap();
        let b = fx.save().execute(second).await.unwrap();

        let before = fx.performance().compute_metrics().await.unwrap();
        assert_eq!(before.totals.investment, 30.0);
        assert_eq!(before.totals.winnings, 0.0);
        assert_eq!(before.pending_tickets, 2);

        let update = UpdateTicketUseCase::new(fx.repo.clone());
        update
            .update_status(a.ticket_id, TicketStatus::Checked, Some(0.0))
            .await
            .unwrap();
        update
            .update_status(b.ticket_id, TicketStatus::Checked, Some(50.0))
            .await
            .unwrap();

        let after = fx.performance().compute_metrics().await.unwrap();
        assert_eq!(after.totals.investment, 30.0);
        assert_eq!(after.totals.winnings, 50.0);
        assert_eq!(after.totals.roi, 20.0);
        assert!((after.totals.roi_percentage - 66.67).abs() < 0.01);
        assert_eq!(after.checked_tickets, 2);
        assert_eq!(after.by_lottery.len(), 1);
    }

    #[tokio::test]
    async fn test_metrics_on_empty_store() {
        let fx = Fixture::new().await;
        let metrics = fx.performance().compute_metrics().await.unwrap();
        assert_eq!(metrics.totals.tickets, 0);
        assert_eq!(metrics.totals.roi_percentage, 0.0);
        assert_eq!(metrics.totals.win_rate, 0.0);
    }

    #[tokio::test]
    async fn test_number_frequency_per_lottery() {
        let fx = Fixture::new().await;
        fx.save().execute(mega(&[1, 2, 3, 4, 5, 6], 1)).await.unwrap();
        fx.save()
            .execute(lotofacil(&(1..=15).collect::<Vec<u32>>(), 1))
            .await
            .unwrap();

        let mega = fx
            .performance()
            .number_frequency(LotteryType::MegaSena)
            .await
            .unwrap();
        assert_eq!(mega.len(), 60);
        assert_eq!(mega.iter().map(|f| f.count).sum::<usize>(), 6);

        let loto = fx
            .performance()
            .number_frequency(LotteryType::Lotofacil)
            .await
            .unwrap();
        assert_eq!(loto.len(), 25);
        assert_eq!(loto.iter().map(|f| f.count).sum::<usize>(), 15);
    }
}

#[cfg(test)]
mod race_tests {
    use super::support::*;
    use crate::application::check_results::CheckResultsUseCase;
    use crate::application::config::TrackerConfig;
    use crate::application::save_ticket::SaveTicketUseCase;
    use crate::domain::draw_source::DrawSourceError;
    use crate::domain::entity::ticket::{Ticket, now_ms};
    use crate::domain::repository::{StatusUpdate, TicketFilter, TicketRepository, TicketStats};
    use crate::domain::rules::RulesRegistry;
    use crate::domain::value_object::{lottery_type::LotteryType, ticket_status::TicketStatus};
    use crate::error::{TrackerError, TrackerResult};
    use crate::infra::sqlite::SqliteTicketRepository;
    use kernel::id::TicketId;
    use std::sync::Arc;

    /// Another check resolves the ticket just before an `Error` update lands
    struct RacingRepository {
        inner: SqliteTicketRepository,
    }

    impl TicketRepository for RacingRepository {
        async fn create(&self, ticket: &Ticket) -> TrackerResult<()> {
            self.inner.create(ticket).await
        }

        async fn find_by_id(&self, ticket_id: TicketId) -> TrackerResult<Option<Ticket>> {
            self.inner.find_by_id(ticket_id).await
        }

        async fn list(&self, filter: &TicketFilter) -> TrackerResult<Vec<Ticket>> {
            self.inner.list(filter).await
        }

        async fn update_status(
            &self,
            ticket_id: TicketId,
            update: &StatusUpdate,
        ) -> TrackerResult<Ticket> {
            if update.status == TicketStatus::Error {
                let concurrent = StatusUpdate {
                    status: TicketStatus::Checked,
                    prize: Some(1_000.0),
                    checked_at: now_ms(),
                };
                self.inner.update_status(ticket_id, &concurrent).await?;
            }
            self.inner.update_status(ticket_id, update).await
        }

        async fn delete(&self, ticket_id: TicketId) -> TrackerResult<()> {
            self.inner.delete(ticket_id).await
        }

        async fn stats(&self) -> TrackerResult<TicketStats> {
            self.inner.stats().await
        }
    }

    async fn setup() -> (
        Arc<RacingRepository>,
        CheckResultsUseCase<RacingRepository, StubDrawSource>,
        SaveTicketUseCase<RacingRepository>,
    ) {
        let repo = Arc::new(RacingRepository { inner: repo().await });
        let draws = Arc::new(StubDrawSource::default().with(
            LotteryType::MegaSena,
            100,
            Err(DrawSourceError::Timeout),
        ));
        let rules = Arc::new(RulesRegistry::builtin());
        let check = CheckResultsUseCase::new(
            repo.clone(),
            draws,
            rules.clone(),
            Arc::new(TrackerConfig::default()),
        );
        let save = SaveTicketUseCase::new(repo.clone(), rules);
        (repo, check, save)
    }

    #[tokio::test]
    async fn test_failed_check_keeps_concurrent_result() {
        let (repo, check, save) = setup().await;
        let ticket = save.execute(mega(&[1, 2, 3, 4, 5, 6], 100)).await.unwrap();

        let err = check.check_one(ticket.ticket_id).await.unwrap_err();
        assert!(matches!(
            err,
            TrackerError::CheckFailed {
                source: DrawSourceError::Timeout,
                ..
            }
        ));

        let stored = repo.find_by_id(ticket.ticket_id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Checked);
        assert_eq!(stored.prize, 1_000.0);
    }

    #[tokio::test]
    async fn test_sweep_survives_lost_race() {
        let (repo, check, save) = setup().await;
        let first = save.execute(mega(&[1, 2, 3, 4, 5, 6], 100)).await.unwrap();
        let second = save.execute(mega(&[7, 8, 9, 10, 11, 12], 100)).await.unwrap();

        let report = check.check_all_pending().await.unwrap();
        assert_eq!(report.examined, 2);
        assert_eq!(report.failed.len(), 2);

        for id in [first.ticket_id, second.ticket_id] {
            let stored = repo.find_by_id(id).await.unwrap().unwrap();
            assert_eq!(stored.status, TicketStatus::Checked);
        }
    }
}

#[cfg(test)]
mod scheduler_tests {
    use super::support::*;
    use crate::application::check_results::CheckResultsUseCase;
    use crate::application::config::TrackerConfig;
    use crate::application::save_ticket::SaveTicketUseCase;
    use crate::application::scheduler::schedule_recurring;
    use crate::domain::rules::RulesRegistry;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_first_sweep_runs_immediately() {
        let repo = Arc::new(repo().await);
        let draws = Arc::new(StubDrawSource::default());
        let rules = Arc::new(RulesRegistry::builtin());
        SaveTicketUseCase::new(repo.clone(), rules.clone())
            .execute(mega(&[1, 2, 3, 4, 5, 6], 100))
            .await
            .unwrap();

        let use_case = Arc::new(CheckResultsUseCase::new(
            repo,
            draws.clone(),
            rules,
            Arc::new(TrackerConfig::default()),
        ));
        let handle = schedule_recurring(use_case, Duration::from_secs(3600), Duration::ZERO);

        let mut waited = Duration::ZERO;
        while draws.calls() == 0 && waited < Duration::from_secs(5) {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += Duration::from_millis(10);
        }
        handle.abort();

        assert_eq!(draws.calls(), 1);
    }
}

#[cfg(test)]
mod router_tests {
    use super::support::*;
    use crate::application::config::TrackerConfig;
    use crate::domain::draw_source::DrawSourceError;
    use crate::domain::rules::RulesRegistry;
    use crate::domain::value_object::lottery_type::LotteryType;
    use crate::presentation::router::tracker_router_generic;
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app() -> (Router, Arc<StubDrawSource>) {
        let draws = Arc::new(StubDrawSource::default());
        let router = tracker_router_generic(
            Arc::new(repo().await),
            draws.clone(),
            Arc::new(RulesRegistry::builtin()),
            Arc::new(TrackerConfig::default()),
        );
        (router, draws)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn create_body(contest: u32) -> Value {
        json!({
            "lotteryType": "megasena",
            "numbers": [6, 5, 4, 3, 2, 1],
            "expectedDrawDate": "2025-03-15",
            "contestNumber": contest
        })
    }

    #[tokio::test]
    async fn test_create_get_delete() {
        let (app, _) = app().await;

        let (status, created) = send(&app, Method::POST, "/tickets", Some(create_body(2840))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "pending");
        assert_eq!(created["numbers"], json!([1, 2, 3, 4, 5, 6]));
        assert_eq!(created["cost"], 5.0);
        assert!(created["checkedAt"].is_null());

        let id = created["id"].as_str().unwrap().to_string();
        let (status, fetched) = send(&app, Method::GET, &format!("/tickets/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, list) = send(&app, Method::GET, "/tickets?status=pending", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Method::DELETE, &format!("/tickets/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, problem) = send(&app, Method::GET, &format!("/tickets/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(problem["status"], 404);
    }

    #[tokio::test]
    async fn test_create_invalid_is_unprocessable() {
        let (app, _) = app().await;
        let body = json!({
            "lotteryType": "megasena",
            "numbers": [1, 2, 3],
            "expectedDrawDate": "2025-03-15",
            "contestNumber": 1
        });
        let (status, problem) = send(&app, Method::POST, "/tickets", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(problem["detail"].as_str().unwrap().contains("Too few"));
    }

    #[tokio::test]
    async fn test_check_endpoints() {
        let (app, draws) = app().await;
        let (_, created) = send(&app, Method::POST, "/tickets", Some(create_body(2840))).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, pending) =
            send(&app, Method::POST, &format!("/tickets/{id}/check"), None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(pending["status"], "pending");
        assert!(pending["result"].is_null());

        draws.set(
            LotteryType::MegaSena,
            2840,
            Ok(Some(mega_draw(2840, &[1, 2, 3, 4, 5, 6]))),
        );
        let (status, checked) =
            send(&app, Method::POST, &format!("/tickets/{id}/check"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(checked["result"]["tierLabel"], "Sena");
        assert_eq!(checked["result"]["isWinner"], true);

        let (status, report) = send(&app, Method::POST, "/tickets/check", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["examined"], 0);

        let (status, stats) = send(&app, Method::GET, "/tickets/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total"], 1);
        assert_eq!(stats["byLottery"]["megasena"]["checked"], 1);
    }

    #[tokio::test]
    async fn test_check_reports_stored_error_status() {
        let (app, draws) = app().await;
        let (_, created) = send(&app, Method::POST, "/tickets", Some(create_body(2840))).await;
        let id = created["id"].as_str().unwrap().to_string();

        draws.set(LotteryType::MegaSena, 2840, Err(DrawSourceError::Timeout));
        let (status, problem) =
            send(&app, Method::POST, &format!("/tickets/{id}/check"), None).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(problem["action"].as_str().unwrap().contains("retry manually"));

        draws.set(LotteryType::MegaSena, 2840, Ok(None));
        let (status, body) = send(&app, Method::POST, &format!("/tickets/{id}/check"), None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Verification failed, please retry manually.");
        assert!(body["result"].is_null());

        let (_, stored) = send(&app, Method::GET, &format!("/tickets/{id}"), None).await;
        assert_eq!(stored["status"], body["status"]);
    }

    #[tokio::test]
    async fn test_status_transition_conflict() {
        let (app, _) = app().await;
        let (_, created) = send(&app, Method::POST, "/tickets", Some(create_body(1))).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("/tickets/{id}/status"),
            Some(json!({ "status": "pending" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, updated) = send(
            &app,
            Method::PATCH,
            &format!("/tickets/{id}/status"),
            Some(json!({ "status": "checked", "prize": 12.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["prize"], 12.5);
        assert!(!updated["checkedAt"].is_null());
    }

    #[tokio::test]
    async fn test_performance_endpoints() {
        let (app, _) = app().await;
        send(&app, Method::POST, "/tickets", Some(create_body(1))).await;

        let (status, metrics) = send(&app, Method::GET, "/performance", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(metrics["tickets"], 1);
        assert_eq!(metrics["investment"], 5.0);
        assert_eq!(metrics["periods"].as_array().unwrap().len(), 3);

        let (status, freq) =
            send(&app, Method::GET, "/performance/frequency/megasena", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(freq.as_array().unwrap().len(), 60);
        assert_eq!(freq[0]["number"], 1);

        let (status, _) = send(&app, Method::GET, "/performance/frequency/quina", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
