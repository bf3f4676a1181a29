//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container and need Docker.
//! Run with:
//!
//! ```bash
//! cargo test -p event-store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use event_store::{
    AggregateId, EventEnvelope, EventStore, EventStoreExt, PostgresEventStore, SequenceNumber,
};
use futures_util::StreamExt;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_events_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and an emptied log
async fn get_test_store() -> PostgresEventStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE events RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    PostgresEventStore::new(pool)
}

fn create_test_event(event_type: &str) -> EventEnvelope {
    EventEnvelope::builder("Road", AggregateId::new(), event_type)
        .payload_raw(serde_json::json!({"name": event_type}))
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn append_assigns_global_sequence_numbers() {
    let store = get_test_store().await;

    let last = store
        .append(vec![create_test_event("Event1"), create_test_event("Event2")])
        .await
        .unwrap();
    assert_eq!(last, SequenceNumber::new(2));

    let last = store.append_event(create_test_event("Event3")).await.unwrap();
    assert_eq!(last, SequenceNumber::new(3));
    assert_eq!(store.head().await.unwrap(), SequenceNumber::new(3));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn stream_from_resumes_after_position() {
    let store = get_test_store().await;
    store
        .append(vec![
            create_test_event("Event1"),
            create_test_event("Event2"),
            create_test_event("Event3"),
        ])
        .await
        .unwrap();

    let events: Vec<_> = store
        .stream_from(SequenceNumber::first())
        .await
        .unwrap()
        .map(|e| e.unwrap())
        .collect()
        .await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, "Event2");
    assert_eq!(events[0].sequence_number, SequenceNumber::new(2));
    assert_eq!(events[1].event_type, "Event3");
    assert_eq!(events[1].payload, serde_json::json!({"name": "Event3"}));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn empty_store_has_initial_head() {
    let store = get_test_store().await;

    assert_eq!(store.head().await.unwrap(), SequenceNumber::initial());

    let count = store.stream_all_events().await.unwrap().count().await;
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn concurrent_appends_are_read_without_gaps() {
    let store = get_test_store().await;

    let writers: Vec<_> = (0..4)
        .map(|writer| {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..25 {
                    store
                        .append(vec![create_test_event(&format!("Writer{writer}Event{i}"))])
                        .await
                        .unwrap();
                }
            })
        })
        .collect();

    // Tail the log the way catch-up does while the writers race.
    let mut cursor = SequenceNumber::initial();
    let mut seen = Vec::new();
    loop {
        let done = writers.iter().all(|writer| writer.is_finished());

        let mut stream = store.stream_from(cursor).await.unwrap();
        while let Some(event) = stream.next().await {
            cursor = event.unwrap().sequence_number;
            seen.push(cursor.as_i64());
        }

        if done {
            break;
        }
        tokio::task::yield_now().await;
    }

    for writer in writers {
        writer.await.unwrap();
    }
    assert_eq!(seen, (1..=100).collect::<Vec<i64>>());
}
