use std::collections::VecDeque;

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    AggregateId, EventEnvelope, EventId, EventStoreError, Result, SequenceNumber,
    store::{EventStore, EventStream},
};

/// Number of rows fetched per round trip while streaming.
const PAGE_SIZE: i64 = 10_000;

/// Advisory lock key serializing appenders.
const APPEND_LOCK_KEY: i64 = 0x6576_656e_7473;

/// Keyset pagination state for [`PostgresEventStore::stream_from`].
///
/// Owns a pool handle so the stream does not borrow the store.
struct PageCursor {
    pool: PgPool,
    after: SequenceNumber,
    page: VecDeque<EventEnvelope>,
    exhausted: bool,
}

/// PostgreSQL-backed event store implementation.
///
/// Events live in a single `events` table whose `BIGSERIAL` column provides
/// the global sequence number.
#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    /// Creates a new PostgreSQL event store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_event(row: PgRow) -> Result<EventEnvelope> {
        Ok(EventEnvelope {
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_type: row.try_get("event_type")?,
            aggregate_id: AggregateId::from_uuid(row.try_get::<Uuid, _>("aggregate_id")?),
            aggregate_type: row.try_get("aggregate_type")?,
            sequence_number: SequenceNumber::new(row.try_get("sequence_number")?),
            timestamp: row.try_get("timestamp")?,
            payload: row.try_get("payload")?,
        })
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append(&self, events: Vec<EventEnvelope>) -> Result<SequenceNumber> {
        let mut tx = self.pool.begin().await?;

        // Sequence numbers are drawn at insert time but become visible at
        // commit. Holding the append lock until commit keeps the two orders
        // equal, so a reader past sequence N never misses a later commit <= N.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(APPEND_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let mut last = SequenceNumber::initial();
        for event in &events {
            let sequence_number: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO events (id, event_type, aggregate_id, aggregate_type, timestamp, payload)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING sequence_number
                "#,
            )
            .bind(event.event_id.as_uuid())
            .bind(&event.event_type)
            .bind(event.aggregate_id.as_uuid())
            .bind(&event.aggregate_type)
            .bind(event.timestamp)
            .bind(&event.payload)
            .fetch_one(&mut *tx)
            .await?;

            last = SequenceNumber::new(sequence_number);
        }

        tx.commit().await?;

        if events.is_empty() {
            return self.head().await;
        }
        Ok(last)
    }

    async fn stream_from(&self, after: SequenceNumber) -> Result<EventStream> {
        let cursor = PageCursor {
            pool: self.pool.clone(),
            after,
            page: VecDeque::new(),
            exhausted: false,
        };

        let stream = futures_util::stream::try_unfold(cursor, |mut cursor| async move {
            if cursor.page.is_empty() && !cursor.exhausted {
                let rows = sqlx::query(
                    r#"
                    SELECT sequence_number, id, event_type, aggregate_id, aggregate_type, timestamp, payload
                    FROM events
                    WHERE sequence_number > $1
                    ORDER BY sequence_number ASC
                    LIMIT $2
                    "#,
                )
                .bind(cursor.after.as_i64())
                .bind(PAGE_SIZE)
                .fetch_all(&cursor.pool)
                .await?;

                cursor.exhausted = (rows.len() as i64) < PAGE_SIZE;
                for row in rows {
                    cursor.page.push_back(Self::row_to_event(row)?);
                }
                if let Some(last) = cursor.page.back() {
                    cursor.after = last.sequence_number;
                }
            }

            Ok::<_, EventStoreError>(cursor.page.pop_front().map(|event| (event, cursor)))
        });

        Ok(Box::pin(stream))
    }

    async fn head(&self) -> Result<SequenceNumber> {
        let head: Option<i64> = sqlx::query_scalar("SELECT MAX(sequence_number) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok(head.map(SequenceNumber::new).unwrap_or_default())
    }
}
