//! Pipeline Engine
//!
//! Bounded FIFO work queue + worker pool that turns chunks into metadata.
//!
//! # Architecture
//! - **Queue**: `tokio::sync::mpsc` channel with `queue_capacity` slots. A
//!   full queue suspends `submit` (backpressure) until a worker frees a slot
//!   or the pipeline is cancelled.
//! - **Workers**: `worker_count` tasks share the receiving end behind a fair
//!   mutex, so jobs are dequeued in submission order.
//! - **Correlation**: every job carries its own one-shot channel; a submitter
//!   only ever sees its own result.
//! - **Cancellation**: one `CancellationToken` bounds the engine's lifetime.
//!
//! # Job lifecycle
//! Submitted → Queued → Processing → Completed. Cancellation can cut a job
//! off while Queued; such a job is dropped and its submitter gets
//! `Error::Shutdown`. Nothing is retried.

pub mod job;
mod worker;

pub use job::{Job, JobHandle};

use crate::error::{Error, Result};
use crate::models::{Chunk, Metadata};
use crate::transform::Transformer;
use acm_common::{EventBus, PipelineEvent};
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use worker::{drain_queue, SharedReceiver, Worker};

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Jobs that may wait for a worker before `submit` blocks
    pub queue_capacity: usize,
    /// Number of worker tasks (1 = strictly serial processing)
    pub worker_count: usize,
    /// Optional bound on how long a submitter waits for its result
    pub result_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            worker_count: 1,
            result_timeout: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(Error::Config("queue_capacity must be at least 1".to_string()));
        }
        if self.worker_count == 0 {
            return Err(Error::Config("worker_count must be at least 1".to_string()));
        }
        if self.result_timeout == Some(Duration::ZERO) {
            return Err(Error::Config("result_timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// Lifetime counters
///
/// Each counter is updated on its own, so a snapshot may be mid-update, but
/// `completed + failed + abandoned` never exceeds `submitted`.
#[derive(Debug, Default)]
pub struct PipelineStats {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    abandoned: AtomicU64,
}

impl PipelineStats {
    fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::AcqRel);
    }

    fn revert_submitted(&self) {
        self.submitted.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_abandoned(&self, count: usize) {
        self.abandoned.fetch_add(count as u64, Ordering::AcqRel);
    }

    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Acquire),
            completed: self.completed.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            abandoned: self.abandoned.load(Ordering::Acquire),
        }
    }
}

/// Reverts the `submitted` count unless the job made it into the queue,
/// including when the `submit` future is dropped while waiting
struct PendingSubmit<'a> {
    stats: &'a PipelineStats,
    accepted: bool,
}

impl<'a> PendingSubmit<'a> {
    fn new(stats: &'a PipelineStats) -> Self {
        stats.record_submitted();
        Self {
            stats,
            accepted: false,
        }
    }
}

impl Drop for PendingSubmit<'_> {
    fn drop(&mut self) {
        if !self.accepted {
            self.stats.revert_submitted();
        }
    }
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub abandoned: u64,
}

/// Bounded queue + worker pool
pub struct PipelineEngine {
    config: PipelineConfig,
    tx: mpsc::Sender<Job>,
    rx: SharedReceiver,
    transformer: Transformer,
    cancel: CancellationToken,
    events: EventBus,
    stats: Arc<PipelineStats>,
    workers: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl PipelineEngine {
    /// Create an engine; workers do not run until [`start`](Self::start)
    pub fn new(
        config: PipelineConfig,
        transformer: Transformer,
        cancel: CancellationToken,
        events: EventBus,
    ) -> Result<Self> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.queue_capacity);

        Ok(Self {
            config,
            tx,
            rx: Arc::new(Mutex::new(rx)),
            transformer,
            cancel,
            events,
            stats: Arc::new(PipelineStats::default()),
            workers: std::sync::Mutex::new(Vec::new()),
        })
    }

    /// Spawn the worker tasks (no-op if already started)
    pub fn start(&self) {
        let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
        if !workers.is_empty() {
            warn!("Pipeline already started");
            return;
        }

        for index in 0..self.config.worker_count {
            let worker = Worker {
                index,
                rx: Arc::clone(&self.rx),
                transformer: self.transformer.clone(),
                cancel: self.cancel.clone(),
                events: self.events.clone(),
                stats: Arc::clone(&self.stats),
            };
            workers.push(tokio::spawn(worker.run()));
        }

        info!(
            workers = self.config.worker_count,
            queue_capacity = self.config.queue_capacity,
            "Pipeline started"
        );
    }

    /// Enqueue a job, waiting for a free slot if the queue is full
    ///
    /// Fails with `Error::Shutdown` if the pipeline is (or becomes) cancelled
    /// before the job is accepted; the job is then never processed.
    pub async fn submit(&self, job: Job) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Shutdown);
        }

        let chunk_id = job.chunk_id();
        let user_id = job.chunk().submitter_id().to_string();

        // Counted before the send so a worker can never complete a job that
        // `submitted` does not include yet
        let mut pending = PendingSubmit::new(&self.stats);

        let sent = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(job) => sent.is_ok(),
        };
        if !sent {
            return Err(Error::Shutdown);
        }
        pending.accepted = true;

        debug!(%chunk_id, depth = self.queue_depth(), "Job queued");
        self.events.emit_lossy(PipelineEvent::ChunkQueued {
            chunk_id,
            user_id,
            timestamp: Utc::now(),
        });

        Ok(())
    }

    /// Submit a chunk and wait for its metadata
    pub async fn process(&self, chunk: Chunk) -> Result<Metadata> {
        let (job, handle) = Job::new(chunk);
        self.submit(job).await?;
        self.wait(handle).await
    }

    /// Wait on a handle, honouring `result_timeout` when configured
    pub async fn wait(&self, handle: JobHandle) -> Result<Metadata> {
        match self.config.result_timeout {
            None => handle.wait().await,
            Some(limit) => {
                let chunk_id = handle.chunk_id();
                tokio::time::timeout(limit, handle.wait())
                    .await
                    .map_err(|_| Error::Timeout {
                        chunk_id,
                        waited: limit,
                    })?
            }
        }
    }

    /// Cancel, wait for workers to finish their current job, drop queued jobs
    ///
    /// Returns the number of jobs abandoned over the engine's lifetime.
    pub async fn shutdown(&self) -> u64 {
        self.cancel.cancel();

        let handles: Vec<_> = {
            let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
            workers.drain(..).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Pipeline worker ended abnormally: {}", e);
            }
        }

        // Covers an engine that was never started
        let leftover = drain_queue(&self.rx).await;
        self.stats.record_abandoned(leftover);

        let abandoned = self.stats.snapshot().abandoned;
        self.events.emit_lossy(PipelineEvent::PipelineStopped {
            abandoned: abandoned as usize,
            timestamp: Utc::now(),
        });
        info!(abandoned, "Pipeline stopped");

        abandoned
    }

    /// Jobs accepted but not yet taken by a worker
    pub fn queue_depth(&self) -> usize {
        self.config.queue_capacity.saturating_sub(self.tx.capacity())
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}
