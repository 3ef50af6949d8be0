//! Jobs and their result handles
//!
//! A [`Job`] pairs one chunk with the sending half of a private one-shot
//! channel; the submitter keeps the matching [`JobHandle`]. The worker that
//! dequeues the job sends exactly one outcome. If the job is dropped without
//! being processed (shutdown), the channel closes and the handle reports
//! [`Error::Shutdown`].

use crate::error::{Error, Result};
use crate::models::{Chunk, Metadata};
use tokio::sync::oneshot;
use tokio::time::Instant;
use uuid::Uuid;

/// Outcome delivered on a job's private channel
pub(crate) type JobOutcome = Result<Metadata>;

/// Unit of work in the pipeline queue
#[derive(Debug)]
pub struct Job {
    chunk: Chunk,
    reply: oneshot::Sender<JobOutcome>,
    created_at: Instant,
}

impl Job {
    /// Create a job and the handle its submitter waits on
    pub fn new(chunk: Chunk) -> (Job, JobHandle) {
        let (reply, rx) = oneshot::channel();
        let handle = JobHandle {
            chunk_id: chunk.chunk_id(),
            rx,
        };
        let job = Job {
            chunk,
            reply,
            created_at: Instant::now(),
        };
        (job, handle)
    }

    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    pub fn chunk_id(&self) -> Uuid {
        self.chunk.chunk_id()
    }

    pub(crate) fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Split into the chunk (moved to the transform) and the reply sender
    pub(crate) fn into_parts(self) -> (Chunk, oneshot::Sender<JobOutcome>) {
        (self.chunk, self.reply)
    }
}

/// Submitter side of a job's result channel
#[derive(Debug)]
pub struct JobHandle {
    chunk_id: Uuid,
    rx: oneshot::Receiver<JobOutcome>,
}

impl JobHandle {
    pub fn chunk_id(&self) -> Uuid {
        self.chunk_id
    }

    /// Wait for this job's single outcome
    ///
    /// Resolves with `Error::Shutdown` when the job was abandoned unprocessed.
    pub async fn wait(self) -> Result<Metadata> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::Shutdown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn chunk() -> Chunk {
        Chunk::new(Uuid::new_v4(), "u1", "s1", Utc::now(), b"x".to_vec())
    }

    #[tokio::test]
    async fn test_handle_receives_sent_outcome() {
        let (job, handle) = Job::new(chunk());
        assert_eq!(handle.chunk_id(), job.chunk_id());

        let (chunk, reply) = job.into_parts();
        let metadata = crate::transform::Transformer::placeholder().transform(&chunk);
        reply.send(Ok(metadata.clone())).unwrap();

        assert_eq!(handle.wait().await.unwrap(), metadata);
    }

    #[tokio::test]
    async fn test_dropped_job_reports_shutdown() {
        let (job, handle) = Job::new(chunk());
        drop(job);
        assert!(matches!(handle.wait().await, Err(Error::Shutdown)));
    }
}
