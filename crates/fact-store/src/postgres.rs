use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::UnitAddressId;
use event_store::{EventId, SequenceNumber};
use projections::AddressChange;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::sink::FactSink;
use crate::{FactStoreError, Result};

/// Default schema holding the fact table.
pub const DEFAULT_SCHEMA: &str = "location";

/// Default fact table name.
pub const DEFAULT_TABLE: &str = "address_changes";

/// Rows per INSERT statement; large batches are split, all inside one transaction.
const INSERT_CHUNK_SIZE: usize = 10_000;

/// PostgreSQL-backed fact sink.
///
/// Facts are written with one `INSERT ... SELECT FROM UNNEST(...)` per chunk,
/// binding one array per column.
#[derive(Clone)]
pub struct PostgresFactSink {
    pool: PgPool,
    table: String,
    schema: String,
    qualified: String,
}

fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && name.len() <= 63;

    if valid {
        Ok(())
    } else {
        Err(FactStoreError::InvalidIdentifier(name.to_string()))
    }
}

impl PostgresFactSink {
    /// Creates a sink writing to `location.address_changes`.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            schema: DEFAULT_SCHEMA.to_string(),
            table: DEFAULT_TABLE.to_string(),
            qualified: format!("{DEFAULT_SCHEMA}.{DEFAULT_TABLE}"),
        }
    }

    /// Creates a sink writing to `schema.table`.
    ///
    /// Both names are spliced into SQL, so only lowercase identifiers made of
    /// letters, digits and underscores are accepted.
    pub fn with_table(pool: PgPool, schema: &str, table: &str) -> Result<Self> {
        validate_identifier(schema)?;
        validate_identifier(table)?;
        Ok(Self {
            pool,
            schema: schema.to_string(),
            table: table.to_string(),
            qualified: format!("{schema}.{table}"),
        })
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Returns the schema-qualified table name.
    pub fn table_name(&self) -> &str {
        &self.qualified
    }

    /// Loads the facts stored after `after`, ordered by sequence number.
    pub async fn load_after(&self, after: SequenceNumber) -> Result<Vec<AddressChange>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT unit_address_id, event_id, sequence_number, change_type, event_timestamp,
                   external_updated, moved_distance_meters, before, after
            FROM {}
            WHERE sequence_number > $1
            ORDER BY sequence_number ASC, unit_address_id ASC, change_type ASC
            "#,
            self.qualified
        ))
        .bind(after.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_change).collect()
    }

    fn row_to_change(row: PgRow) -> Result<AddressChange> {
        let change_type: String = row.try_get("change_type")?;
        Ok(AddressChange {
            unit_address_id: UnitAddressId::from_uuid(row.try_get::<Uuid, _>("unit_address_id")?),
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("event_id")?),
            sequence_number: SequenceNumber::new(row.try_get("sequence_number")?),
            change_type: change_type.parse()?,
            event_timestamp: row.try_get("event_timestamp")?,
            external_updated: row.try_get("external_updated")?,
            moved_distance_meters: row.try_get("moved_distance_meters")?,
            before: row.try_get("before")?,
            after: row.try_get("after")?,
        })
    }

    async fn insert_chunk(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        qualified: &str,
        changes: &[AddressChange],
    ) -> Result<()> {
        let mut unit_address_ids = Vec::with_capacity(changes.len());
        let mut event_ids = Vec::with_capacity(changes.len());
        let mut sequence_numbers = Vec::with_capacity(changes.len());
        let mut change_types = Vec::with_capacity(changes.len());
        let mut event_timestamps: Vec<DateTime<Utc>> = Vec::with_capacity(changes.len());
        let mut external_updated: Vec<Option<DateTime<Utc>>> = Vec::with_capacity(changes.len());
        let mut distances: Vec<Option<f64>> = Vec::with_capacity(changes.len());
        let mut befores: Vec<Option<String>> = Vec::with_capacity(changes.len());
        let mut afters: Vec<Option<String>> = Vec::with_capacity(changes.len());

        for change in changes {
            unit_address_ids.push(change.unit_address_id.as_uuid());
            event_ids.push(change.event_id.as_uuid());
            sequence_numbers.push(change.sequence_number.as_i64());
            change_types.push(change.change_type.as_str().to_string());
            event_timestamps.push(change.event_timestamp);
            external_updated.push(change.external_updated);
            distances.push(change.moved_distance_meters);
            befores.push(change.before.clone());
            afters.push(change.after.clone());
        }

        sqlx::query(&format!(
            r#"
            INSERT INTO {qualified} (
                unit_address_id, event_id, sequence_number, change_type, event_timestamp,
                external_updated, moved_distance_meters, before, after
            )
            SELECT * FROM UNNEST(
                $1::uuid[], $2::uuid[], $3::bigint[], $4::varchar[], $5::timestamptz[],
                $6::timestamptz[], $7::float8[], $8::varchar[], $9::varchar[]
            )
            "#
        ))
        .bind(&unit_address_ids)
        .bind(&event_ids)
        .bind(&sequence_numbers)
        .bind(&change_types)
        .bind(&event_timestamps)
        .bind(&external_updated)
        .bind(&distances)
        .bind(&befores)
        .bind(&afters)
        .execute(&mut **tx)
        .await
        .map_err(|err| {
            let duplicate = err
                .as_database_error()
                .filter(|db| db.is_unique_violation())
                .map(|db| db.message().to_string());
            match duplicate {
                Some(message) => FactStoreError::DuplicateFact(message),
                None => FactStoreError::Database(err),
            }
        })?;

        Ok(())
    }
}

#[async_trait]
impl FactSink for PostgresFactSink {
    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", self.schema))
            .execute(&self.pool)
            .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                unit_address_id UUID NOT NULL,
                event_id UUID NOT NULL,
                sequence_number BIGINT NOT NULL,
                change_type VARCHAR(255) NOT NULL,
                event_timestamp TIMESTAMPTZ NOT NULL,
                external_updated TIMESTAMPTZ NULL,
                moved_distance_meters DOUBLE PRECISION NULL,
                before VARCHAR(4096) NULL,
                after VARCHAR(4096) NULL,
                PRIMARY KEY (unit_address_id, event_id, change_type)
            )
            "#,
            self.qualified
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {table}_sequence_number_idx ON {qualified} (sequence_number)",
            table = self.table,
            qualified = self.qualified
        ))
        .execute(&self.pool)
        .await?;

        tracing::info!(table = %self.qualified, "fact table ready");
        Ok(())
    }

    async fn highest_sequence_number(&self) -> Result<SequenceNumber> {
        let highest: Option<i64> =
            sqlx::query_scalar(&format!("SELECT MAX(sequence_number) FROM {}", self.qualified))
                .fetch_one(&self.pool)
                .await?;

        Ok(highest.map(SequenceNumber::new).unwrap_or_default())
    }

    async fn bulk_insert(&self, changes: &[AddressChange]) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for chunk in changes.chunks(INSERT_CHUNK_SIZE) {
            Self::insert_chunk(&mut tx, &self.qualified, chunk).await?;
        }
        tx.commit().await?;

        tracing::debug!(table = %self.qualified, count = changes.len(), "facts inserted");
        Ok(())
    }
}
