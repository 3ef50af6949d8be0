//! Transcript strategies

/// Derives a text descriptor from raw payload bytes
pub trait Transcriber: Send + Sync {
    /// Transcriber name for diagnostics
    fn name(&self) -> &'static str;

    /// Must not panic on any input, including an empty payload
    fn transcribe(&self, payload: &[u8]) -> String;
}

/// Returns the same text for every payload
#[derive(Debug, Clone)]
pub struct FixedTranscript {
    text: String,
}

impl FixedTranscript {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for FixedTranscript {
    fn default() -> Self {
        Self::new("Hello World")
    }
}

impl Transcriber for FixedTranscript {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn transcribe(&self, _payload: &[u8]) -> String {
        self.text.clone()
    }
}
