//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres database.
//! Cell occupancy is enforced by a partial unique index over
//! `(version_id, day_of_week, period_id)`, which is also the conflict target
//! of the atomic placement upsert.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel::upsert::{excluded, DecoratableTarget};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task;

use crate::api::{BatchId, EventId, OfferingId, PeriodId, RoomId, TemplateId, VersionId};
use crate::db::capabilities::{CapabilityReport, StoreCapabilities};
use crate::db::repository::{
    ErrorContext, EventRepository, OfferingRepository, RepositoryError, RepositoryResult,
    TemplateRepository, VersionRepository,
};
use crate::models::event::{CellKey, DayOfWeek, NewScheduledEvent, PeriodKey, ScheduledEvent};
use crate::models::offering::CourseOffering;
use crate::models::period::{NewPeriodTemplate, PeriodTemplate, RawPeriodSlot};
use crate::models::version::{NewTimetableVersion, PublishOutcome, TimetableVersion, VersionStatus};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    /// - `PG_MAX_RETRIES`: Maximum retry attempts (default: 3)
    /// - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
///
/// This repository implementation provides:
/// - Connection pooling with configurable limits
/// - Automatic retry for transient failures
/// - Health monitoring and statistics
/// - Automatic schema migrations
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// This method will retry the operation up to `max_retries` times if a
    /// retryable error occurs (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                // Execute the operation
                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    ///
    /// Returns current pool state and query statistics for monitoring.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Check if the database connection is healthy.
    ///
    /// Performs a simple query to verify connectivity.
    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }

    /// Get detailed health information.
    ///
    /// Returns a tuple of (is_healthy, latency_ms, error_message).
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        match self.health_check().await {
            Ok(true) => (true, Some(start.elapsed().as_millis() as u64), None),
            Ok(false) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some("Health check returned false".to_string()),
            ),
            Err(e) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some(e.to_string()),
            ),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn row_to_version(row: VersionRow) -> RepositoryResult<TimetableVersion> {
    let status = row
        .status
        .parse::<VersionStatus>()
        .map_err(|e| RepositoryError::internal(format!("Stored status is corrupt: {}", e)))?;

    Ok(TimetableVersion {
        id: VersionId::new(row.id),
        batch_id: BatchId::new(row.batch_id),
        status,
        name: row.name,
        created_at: row.created_at,
        published_at: row.published_at,
    })
}

fn row_to_event(row: EventRow) -> RepositoryResult<ScheduledEvent> {
    let day = u8::try_from(row.day_of_week)
        .ok()
        .and_then(DayOfWeek::new)
        .ok_or_else(|| {
            RepositoryError::internal(format!(
                "Stored day_of_week {} is out of range",
                row.day_of_week
            ))
        })?;

    Ok(ScheduledEvent {
        id: EventId::new(row.id),
        version_id: VersionId::new(row.version_id),
        day_of_week: day,
        period_id: row.period_id.map(PeriodId::from),
        start_time: row.start_time,
        end_time: row.end_time,
        offering_id: OfferingId::new(row.offering_id),
        room_id: row.room_id.map(RoomId::new),
    })
}

fn row_to_template(row: TemplateRow) -> RepositoryResult<PeriodTemplate> {
    let slots: Vec<RawPeriodSlot> = serde_json::from_value(row.slots_json).map_err(|e| {
        RepositoryError::internal(format!("Failed to parse template slots JSON: {}", e))
    })?;

    Ok(PeriodTemplate {
        id: TemplateId::new(row.id),
        name: row.name,
        slots,
        updated_at: row.updated_at,
    })
}

fn row_to_offering(row: OfferingRow) -> CourseOffering {
    CourseOffering {
        id: OfferingId::new(row.id),
        batch_id: BatchId::new(row.batch_id),
        subject_name: row.subject_name,
        subject_code: row.subject_code,
        faculty_name: row.faculty_name,
        default_room_id: row.default_room_id.map(RoomId::new),
    }
}

fn event_to_row(event: &NewScheduledEvent) -> NewEventRow {
    NewEventRow {
        version_id: event.version_id.value(),
        day_of_week: i16::from(event.day_of_week.index()),
        period_id: event.period_id.as_ref().map(|p| p.as_str().to_string()),
        start_time: event.start_time,
        end_time: event.end_time,
        offering_id: event.offering_id.value(),
        room_id: event.room_id.map(|r| r.value()),
    }
}

#[async_trait]
impl VersionRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn get_version(&self, version_id: VersionId) -> RepositoryResult<TimetableVersion> {
        self.with_conn(move |conn| {
            let row = timetable_versions::table
                .filter(timetable_versions::id.eq(version_id.value()))
                .select(VersionRow::as_select())
                .first::<VersionRow>(conn)
                .map_err(map_diesel_error)?;
            row_to_version(row)
        })
        .await
    }

    async fn latest_draft(&self, batch_id: BatchId) -> RepositoryResult<Option<TimetableVersion>> {
        self.with_conn(move |conn| {
            timetable_versions::table
                .filter(timetable_versions::batch_id.eq(batch_id.value()))
                .filter(timetable_versions::status.eq(VersionStatus::Draft.as_str()))
                .order((
                    timetable_versions::created_at.desc(),
                    timetable_versions::id.desc(),
                ))
                .select(VersionRow::as_select())
                .first::<VersionRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_version)
                .transpose()
        })
        .await
    }

    async fn latest_published(
        &self,
        batch_id: BatchId,
    ) -> RepositoryResult<Option<TimetableVersion>> {
        self.with_conn(move |conn| {
            timetable_versions::table
                .filter(timetable_versions::batch_id.eq(batch_id.value()))
                .filter(timetable_versions::status.eq(VersionStatus::Published.as_str()))
                .order(timetable_versions::published_at.desc())
                .select(VersionRow::as_select())
                .first::<VersionRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_version)
                .transpose()
        })
        .await
    }

    async fn list_versions(&self, batch_id: BatchId) -> RepositoryResult<Vec<TimetableVersion>> {
        self.with_conn(move |conn| {
            let rows = timetable_versions::table
                .filter(timetable_versions::batch_id.eq(batch_id.value()))
                .order((
                    timetable_versions::created_at.desc(),
                    timetable_versions::id.desc(),
                ))
                .select(VersionRow::as_select())
                .load::<VersionRow>(conn)
                .map_err(map_diesel_error)?;

            rows.into_iter().map(row_to_version).collect()
        })
        .await
    }

    async fn insert_version(
        &self,
        version: NewTimetableVersion,
    ) -> RepositoryResult<TimetableVersion> {
        self.with_conn(move |conn| {
            let row = NewVersionRow {
                batch_id: version.batch_id.value(),
                status: version.status.as_str().to_string(),
                name: version.name.clone(),
            };

            let inserted: VersionRow = diesel::insert_into(timetable_versions::table)
                .values(&row)
                .returning(VersionRow::as_returning())
                .get_result(conn)
                .map_err(map_diesel_error)?;

            row_to_version(inserted)
        })
        .await
    }

    async fn update_version_status(
        &self,
        version_id: VersionId,
        status: VersionStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<TimetableVersion> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let current: VersionRow = timetable_versions::table
                    .filter(timetable_versions::id.eq(version_id.value()))
                    .select(VersionRow::as_select())
                    .first(tx)
                    .map_err(map_diesel_error)?;

                let current_status = current.status.parse::<VersionStatus>().map_err(|e| {
                    RepositoryError::internal(format!("Stored status is corrupt: {}", e))
                })?;
                if !current_status.can_transition_to(status) {
                    return Err(RepositoryError::validation(format!(
                        "Illegal status transition: {} -> {}",
                        current_status.as_str(),
                        status.as_str()
                    )));
                }

                let target = timetable_versions::table
                    .filter(timetable_versions::id.eq(version_id.value()));
                let updated: VersionRow = if let Some(ts) = published_at {
                    diesel::update(target)
                        .set((
                            timetable_versions::status.eq(status.as_str()),
                            timetable_versions::published_at.eq(ts),
                        ))
                        .returning(VersionRow::as_returning())
                        .get_result(tx)
                        .map_err(map_diesel_error)?
                } else {
                    diesel::update(target)
                        .set(timetable_versions::status.eq(status.as_str()))
                        .returning(VersionRow::as_returning())
                        .get_result(tx)
                        .map_err(map_diesel_error)?
                };

                row_to_version(updated)
            })
        })
        .await
    }

    async fn publish_draft(
        &self,
        batch_id: BatchId,
        draft_id: VersionId,
        published_at: DateTime<Utc>,
    ) -> RepositoryResult<PublishOutcome> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let draft: VersionRow = timetable_versions::table
                    .filter(timetable_versions::id.eq(draft_id.value()))
                    .select(VersionRow::as_select())
                    .first(tx)
                    .map_err(map_diesel_error)?;

                if draft.batch_id != batch_id.value()
                    || draft.status != VersionStatus::Draft.as_str()
                {
                    return Err(RepositoryError::validation(format!(
                        "Version {} is not a draft of batch {}",
                        draft_id, batch_id
                    )));
                }

                // Archive whichever version is currently published
                diesel::update(
                    timetable_versions::table
                        .filter(timetable_versions::batch_id.eq(batch_id.value()))
                        .filter(
                            timetable_versions::status.eq(VersionStatus::Published.as_str()),
                        ),
                )
                .set(timetable_versions::status.eq(VersionStatus::Archived.as_str()))
                .execute(tx)
                .map_err(map_diesel_error)?;

                // Promote the draft
                let published: VersionRow = diesel::update(
                    timetable_versions::table.filter(timetable_versions::id.eq(draft_id.value())),
                )
                .set((
                    timetable_versions::status.eq(VersionStatus::Published.as_str()),
                    timetable_versions::published_at.eq(published_at),
                ))
                .returning(VersionRow::as_returning())
                .get_result(tx)
                .map_err(map_diesel_error)?;

                // Seed the next editing round with a fresh empty draft
                let fresh = NewTimetableVersion::draft(batch_id);
                let new_draft: VersionRow = diesel::insert_into(timetable_versions::table)
                    .values(&NewVersionRow {
                        batch_id: fresh.batch_id.value(),
                        status: fresh.status.as_str().to_string(),
                        name: fresh.name,
                    })
                    .returning(VersionRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;

                Ok(PublishOutcome {
                    published: row_to_version(published)?,
                    new_draft: row_to_version(new_draft)?,
                })
            })
        })
        .await
    }
}

#[async_trait]
impl EventRepository for PostgresRepository {
    async fn events_for_version(
        &self,
        version_id: VersionId,
    ) -> RepositoryResult<Vec<ScheduledEvent>> {
        self.with_conn(move |conn| {
            let rows = scheduled_events::table
                .filter(scheduled_events::version_id.eq(version_id.value()))
                .order((
                    scheduled_events::day_of_week.asc(),
                    scheduled_events::start_time.asc(),
                ))
                .select(EventRow::as_select())
                .load::<EventRow>(conn)
                .map_err(map_diesel_error)?;

            rows.into_iter().map(row_to_event).collect()
        })
        .await
    }

    async fn upsert_events(
        &self,
        events: &[NewScheduledEvent],
    ) -> RepositoryResult<Vec<ScheduledEvent>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<NewEventRow> = events.iter().map(event_to_row).collect();

        self.with_conn(move |conn| {
            // The conflict target mirrors the partial unique index on
            // (version_id, day_of_week, period_id); rows without a period id
            // fall outside the index and insert plainly.
            let inserted: Vec<EventRow> = diesel::insert_into(scheduled_events::table)
                .values(&rows)
                .on_conflict((
                    scheduled_events::version_id,
                    scheduled_events::day_of_week,
                    scheduled_events::period_id,
                ))
                .filter_target(scheduled_events::period_id.is_not_null())
                .do_update()
                .set((
                    scheduled_events::offering_id.eq(excluded(scheduled_events::offering_id)),
                    scheduled_events::room_id.eq(excluded(scheduled_events::room_id)),
                    scheduled_events::start_time.eq(excluded(scheduled_events::start_time)),
                    scheduled_events::end_time.eq(excluded(scheduled_events::end_time)),
                ))
                .returning(EventRow::as_returning())
                .get_results(conn)
                .map_err(map_diesel_error)?;

            inserted.into_iter().map(row_to_event).collect()
        })
        .await
    }

    async fn insert_events(
        &self,
        events: &[NewScheduledEvent],
    ) -> RepositoryResult<Vec<ScheduledEvent>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<NewEventRow> = events.iter().map(event_to_row).collect();

        self.with_conn(move |conn| {
            let inserted: Vec<EventRow> = diesel::insert_into(scheduled_events::table)
                .values(&rows)
                .returning(EventRow::as_returning())
                .get_results(conn)
                .map_err(map_diesel_error)?;

            inserted.into_iter().map(row_to_event).collect()
        })
        .await
    }

    async fn delete_events_at(
        &self,
        version_id: VersionId,
        cells: &[CellKey],
    ) -> RepositoryResult<usize> {
        if cells.is_empty() {
            return Ok(0);
        }
        let cells = cells.to_vec();

        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let mut deleted = 0usize;
                for cell in &cells {
                    let scoped = scheduled_events::table
                        .filter(scheduled_events::version_id.eq(version_id.value()))
                        .filter(scheduled_events::day_of_week.eq(i16::from(cell.day.index())));

                    deleted += match &cell.period {
                        PeriodKey::Slot(period_id) => diesel::delete(
                            scoped.filter(scheduled_events::period_id.eq(period_id.as_str())),
                        )
                        .execute(tx)
                        .map_err(map_diesel_error)?,
                        // Legacy rows without a period id key by start time
                        PeriodKey::Time(start) => diesel::delete(
                            scoped
                                .filter(scheduled_events::period_id.is_null())
                                .filter(scheduled_events::start_time.eq(*start)),
                        )
                        .execute(tx)
                        .map_err(map_diesel_error)?,
                    };
                }
                Ok(deleted)
            })
        })
        .await
    }

    async fn set_event_room(
        &self,
        event_id: EventId,
        room_id: Option<RoomId>,
    ) -> RepositoryResult<ScheduledEvent> {
        self.with_conn(move |conn| {
            let row: EventRow = diesel::update(
                scheduled_events::table.filter(scheduled_events::id.eq(event_id.value())),
            )
            .set(scheduled_events::room_id.eq(room_id.map(|r| r.value())))
            .returning(EventRow::as_returning())
            .get_result(conn)
            .map_err(map_diesel_error)?;

            row_to_event(row)
        })
        .await
    }
}

#[async_trait]
impl TemplateRepository for PostgresRepository {
    async fn active_template(&self) -> RepositoryResult<Option<PeriodTemplate>> {
        self.with_conn(|conn| {
            period_templates::table
                .filter(period_templates::is_active.eq(true))
                .order(period_templates::updated_at.desc())
                .select(TemplateRow::as_select())
                .first::<TemplateRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_template)
                .transpose()
        })
        .await
    }

    async fn put_template(&self, template: NewPeriodTemplate) -> RepositoryResult<PeriodTemplate> {
        let slots_json = serde_json::to_value(&template.slots).map_err(|e| {
            RepositoryError::validation(format!("Template slots are not serializable: {}", e))
        })?;
        let row = NewTemplateRow {
            name: template.name,
            slots_json,
            is_active: true,
        };

        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                // Exactly one template may be active at a time
                diesel::update(period_templates::table.filter(period_templates::is_active.eq(true)))
                    .set(period_templates::is_active.eq(false))
                    .execute(tx)
                    .map_err(map_diesel_error)?;

                let inserted: TemplateRow = diesel::insert_into(period_templates::table)
                    .values(&row)
                    .returning(TemplateRow::as_returning())
                    .get_result(tx)
                    .map_err(map_diesel_error)?;

                row_to_template(inserted)
            })
        })
        .await
    }
}

#[async_trait]
impl OfferingRepository for PostgresRepository {
    async fn offerings_for_batch(&self, batch_id: BatchId) -> RepositoryResult<Vec<CourseOffering>> {
        self.with_conn(move |conn| {
            let rows = course_offerings::table
                .filter(course_offerings::batch_id.eq(batch_id.value()))
                .order(course_offerings::subject_name.asc())
                .select(OfferingRow::as_select())
                .load::<OfferingRow>(conn)
                .map_err(map_diesel_error)?;

            Ok(rows.into_iter().map(row_to_offering).collect())
        })
        .await
    }

    async fn get_offering(&self, offering_id: OfferingId) -> RepositoryResult<CourseOffering> {
        self.with_conn(move |conn| {
            let row = course_offerings::table
                .filter(course_offerings::id.eq(offering_id.value()))
                .select(OfferingRow::as_select())
                .first::<OfferingRow>(conn)
                .map_err(map_diesel_error)?;

            Ok(row_to_offering(row))
        })
        .await
    }
}

impl CapabilityReport for PostgresRepository {
    /// Postgres supports both `ON CONFLICT` upserts and multi-statement
    /// transactions, so the full capability set is reported unconditionally.
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::full()
    }
}
