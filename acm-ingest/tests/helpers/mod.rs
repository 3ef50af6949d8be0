//! Shared fixtures for acm-ingest integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use acm_common::time::FixedClock;
use acm_common::uuid_utils::SequentialIds;
use acm_common::EventBus;
use acm_ingest::pipeline::{PipelineConfig, PipelineEngine};
use acm_ingest::services::Ingestor;
use acm_ingest::store::MetadataStore;
use acm_ingest::transform::{FixedTranscript, SpectralAnalyzer, Transformer};
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// `"<payload length>Hz"`, fully predictable
pub struct LengthSpectrum;

impl SpectralAnalyzer for LengthSpectrum {
    fn name(&self) -> &'static str {
        "length"
    }

    fn summarize(&self, payload: &[u8]) -> String {
        format!("{}Hz", payload.len())
    }
}

/// Records payloads in the order the pipeline transforms them
#[derive(Default)]
pub struct RecordingSpectrum {
    pub seen: Mutex<Vec<String>>,
}

impl SpectralAnalyzer for RecordingSpectrum {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn summarize(&self, payload: &[u8]) -> String {
        self.seen
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(payload).into_owned());
        "0Hz".to_string()
    }
}

/// Signals when a transform starts, then holds the worker for `delay`
pub struct SlowSpectrum {
    pub started: Arc<Notify>,
    pub delay: Duration,
}

impl SpectralAnalyzer for SlowSpectrum {
    fn name(&self) -> &'static str {
        "slow"
    }

    fn summarize(&self, _payload: &[u8]) -> String {
        self.started.notify_one();
        std::thread::sleep(self.delay);
        "1Hz".to_string()
    }
}

pub fn deterministic_transformer() -> Transformer {
    Transformer::new(
        Arc::new(LengthSpectrum),
        Arc::new(FixedTranscript::new("test transcript")),
    )
}

pub fn engine_with(config: PipelineConfig, transformer: Transformer) -> Arc<PipelineEngine> {
    Arc::new(
        PipelineEngine::new(config, transformer, CancellationToken::new(), EventBus::new(64))
            .unwrap(),
    )
}

/// Started single-worker engine + empty store, deterministic ids and clock
pub fn test_ingestor() -> Ingestor {
    let engine = engine_with(PipelineConfig::default(), deterministic_transformer());
    engine.start();

    Ingestor::with_sources(
        engine,
        Arc::new(MetadataStore::new()),
        Arc::new(SequentialIds::new()),
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap(),
        )),
    )
}

/// Upper bound for anything that must happen "promptly"
pub const PROMPT: Duration = Duration::from_secs(2);
