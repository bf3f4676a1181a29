//! Streaming batch pipeline from the event store to the fact sink.
//!
//! Three tasks run concurrently once startup has read the watermark:
//!
//! - replay: full replay into the projection, then periodic catch-up
//! - drain: moves fact groups above the watermark into the [`BatchBuffer`]
//! - flush: periodically writes the buffered facts to the sink
//!
//! All of them stop on the shared [`Shutdown`] signal. The first task error
//! triggers it for the others.

use std::sync::Arc;
use std::time::Duration;

use event_store::{EventStore, SequenceNumber};
use fact_store::FactSink;
use projections::{AddressChangeProjection, ChangeReceiver, ProjectionProcessor};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::buffer::BatchBuffer;
use crate::config::Config;
use crate::shutdown::Shutdown;
use crate::Result;

/// Timing and sizing of the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub catch_up_interval: Duration,
    pub flush_interval: Duration,
    pub batch_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            catch_up_interval: config.catch_up_interval,
            flush_interval: config.flush_interval,
            batch_capacity: config.batch_capacity,
        }
    }
}

/// Indexes address change facts from an event store into a fact sink.
pub struct IndexerPipeline<S: EventStore, F: FactSink> {
    processor: ProjectionProcessor<S>,
    output: ChangeReceiver,
    sink: Arc<F>,
    settings: PipelineSettings,
    shutdown: Shutdown,
}

impl<S, F> IndexerPipeline<S, F>
where
    S: EventStore + 'static,
    F: FactSink + 'static,
{
    pub fn new(store: S, sink: F, settings: PipelineSettings) -> Self {
        let (projection, output) = AddressChangeProjection::new();
        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));

        Self {
            processor,
            output,
            sink: Arc::new(sink),
            settings,
            shutdown: Shutdown::new(),
        }
    }

    /// Replaces the pipeline's shutdown signal with a shared one.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Returns a handle that stops the pipeline when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Runs until shutdown is requested or a task fails.
    ///
    /// Returns `Ok` on cooperative shutdown and the first task error otherwise.
    pub async fn run(self) -> Result<()> {
        let Self {
            processor,
            output,
            sink,
            settings,
            shutdown,
        } = self;

        let Some(watermark) = startup(sink.as_ref(), &shutdown).await? else {
            info!("shutdown requested before startup completed");
            return Ok(());
        };

        let buffer = Arc::new(BatchBuffer::new(settings.batch_capacity));
        let mut tasks = JoinSet::new();
        tasks.spawn(replay(
            processor,
            settings.catch_up_interval,
            shutdown.clone(),
        ));
        tasks.spawn(drain(
            output,
            Arc::clone(&buffer),
            watermark,
            shutdown.clone(),
        ));
        tasks.spawn(flush(
            buffer,
            sink,
            settings.flush_interval,
            shutdown.clone(),
        ));

        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            let Err(err) = joined.map_err(Into::into).and_then(|result| result) else {
                continue;
            };
            if shutdown.is_triggered() {
                debug!(error = %err, "task error after shutdown");
                continue;
            }
            error!(error = %err, "indexer task failed, shutting down");
            shutdown.trigger();
            failure = Some(err);
        }

        match failure {
            Some(err) => Err(err),
            None => {
                info!("indexer stopped");
                Ok(())
            }
        }
    }
}

/// Prepares the sink and reads the watermark, or `None` if shut down first.
async fn startup<F: FactSink>(sink: &F, shutdown: &Shutdown) -> Result<Option<SequenceNumber>> {
    let prepared = async {
        sink.ensure_schema().await?;
        sink.highest_sequence_number().await
    };

    tokio::select! {
        biased;
        () = shutdown.triggered() => Ok(None),
        watermark = prepared => {
            let watermark = watermark?;
            metrics::gauge!("indexer_watermark").set(watermark.as_i64() as f64);
            info!(watermark = %watermark, "resuming after watermark");
            Ok(Some(watermark))
        }
    }
}

async fn replay<S: EventStore>(
    processor: ProjectionProcessor<S>,
    period: Duration,
    shutdown: Shutdown,
) -> Result<()> {
    tokio::select! {
        biased;
        () = shutdown.triggered() => return Ok(()),
        delivered = processor.replay_all() => { delivered?; }
    }

    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = shutdown.triggered() => return Ok(()),
            _ = ticker.tick() => {}
        }
        tokio::select! {
            biased;
            () = shutdown.triggered() => return Ok(()),
            delivered = processor.fetch_new() => { delivered?; }
        }
    }
}

async fn drain(
    mut output: ChangeReceiver,
    buffer: Arc<BatchBuffer>,
    watermark: SequenceNumber,
    shutdown: Shutdown,
) -> Result<()> {
    loop {
        let mut group = tokio::select! {
            biased;
            () = shutdown.triggered() => return Ok(()),
            group = output.recv() => match group {
                Some(group) => group,
                None => {
                    debug!("change output closed");
                    return Ok(());
                }
            },
        };

        let emitted = group.len();
        group.retain(|change| change.sequence_number > watermark);
        let filtered = emitted - group.len();
        metrics::counter!("indexer_facts_emitted").increment(emitted as u64);
        if filtered > 0 {
            metrics::counter!("indexer_facts_filtered").increment(filtered as u64);
        }
        if group.is_empty() {
            continue;
        }

        tokio::select! {
            biased;
            () = shutdown.triggered() => return Ok(()),
            pushed = buffer.push(group) => pushed?,
        }
    }
}

async fn flush<F: FactSink>(
    buffer: Arc<BatchBuffer>,
    sink: Arc<F>,
    period: Duration,
    shutdown: Shutdown,
) -> Result<()> {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = shutdown.triggered() => return Ok(()),
            _ = ticker.tick() => {}
        }

        let batch = buffer.take().await;
        let Some(last) = batch.last() else {
            continue;
        };
        let last_sequence_number = last.sequence_number;

        sink.bulk_insert(&batch).await?;

        metrics::counter!("indexer_facts_persisted").increment(batch.len() as u64);
        metrics::counter!("indexer_flushes").increment(1);
        metrics::gauge!("indexer_watermark").set(last_sequence_number.as_i64() as f64);
        info!(
            count = batch.len(),
            sequence_number = %last_sequence_number,
            "flushed facts"
        );
    }
}
