//! Pipeline worker loop
//!
//! Each worker repeatedly takes the next job from the shared queue (FIFO),
//! runs the transformation on the blocking pool and sends the outcome on the
//! job's private channel. Cancellation is observed at the dequeue wait: a job
//! already taken is finished, nothing further is taken. On exit the worker
//! closes the queue and drops whatever is still in it, which wakes those
//! submitters with `Error::Shutdown`.

use super::job::Job;
use super::PipelineStats;
use crate::error::Error;
use crate::transform::Transformer;
use acm_common::{EventBus, PipelineEvent};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub(crate) type SharedReceiver = Arc<Mutex<mpsc::Receiver<Job>>>;

pub(crate) struct Worker {
    pub index: usize,
    pub rx: SharedReceiver,
    pub transformer: Transformer,
    pub cancel: CancellationToken,
    pub events: EventBus,
    pub stats: Arc<PipelineStats>,
}

impl Worker {
    pub async fn run(self) {
        info!(worker = self.index, "Pipeline worker started");

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                job = next_job(&self.rx) => job,
            };

            match next {
                Some(job) => self.process(job).await,
                // Queue closed by another worker's drain
                None => break,
            }
        }

        let abandoned = drain_queue(&self.rx).await;
        if abandoned > 0 {
            self.stats.record_abandoned(abandoned);
            warn!(worker = self.index, abandoned, "Dropped queued jobs on shutdown");
        }

        info!(worker = self.index, "Pipeline worker stopped");
    }

    async fn process(&self, job: Job) {
        let chunk_id = job.chunk_id();
        let queue_wait = job.created_at().elapsed();
        let (chunk, reply) = job.into_parts();
        let user_id = chunk.submitter_id().to_string();

        debug!(worker = self.index, %chunk_id, "Processing chunk");

        let started = Instant::now();
        let transformer = self.transformer.clone();
        // The chunk (and its payload) is dropped when this task returns
        let result = tokio::task::spawn_blocking(move || transformer.transform(&chunk)).await;
        let processing = started.elapsed();

        let outcome = match result {
            Ok(metadata) => {
                self.stats.record_completed();
                self.events.emit_lossy(PipelineEvent::ChunkProcessed {
                    chunk_id,
                    user_id,
                    checksum: metadata.checksum.clone(),
                    worker: self.index,
                    queue_wait_ms: queue_wait.as_millis() as u64,
                    processing_ms: processing.as_millis() as u64,
                    timestamp: Utc::now(),
                });
                debug!(
                    worker = self.index,
                    %chunk_id,
                    processing_ms = processing.as_millis() as u64,
                    "Chunk processed"
                );
                Ok(metadata)
            }
            Err(join_error) => {
                self.stats.record_failed();
                error!(
                    worker = self.index,
                    %chunk_id,
                    "Transformation faulted: {}",
                    join_error
                );
                self.events.emit_lossy(PipelineEvent::ChunkFailed {
                    chunk_id,
                    worker: self.index,
                    message: join_error.to_string(),
                    timestamp: Utc::now(),
                });
                Err(Error::TransformFailed(chunk_id))
            }
        };

        if reply.send(outcome).is_err() {
            debug!(%chunk_id, "Submitter stopped waiting; result discarded");
        }
    }
}

async fn next_job(rx: &SharedReceiver) -> Option<Job> {
    rx.lock().await.recv().await
}

/// Close the queue and drop every job still in it; returns how many
pub(crate) async fn drain_queue(rx: &SharedReceiver) -> usize {
    let mut rx = rx.lock().await;
    rx.close();

    let mut abandoned = 0;
    while let Ok(job) = rx.try_recv() {
        debug!(chunk_id = %job.chunk_id(), "Abandoning queued job");
        abandoned += 1;
    }
    abandoned
}
