//! Spectral summary strategies
//!
//! The summary is an opaque descriptor. Deployments plug in a real analyzer;
//! the default is a placeholder in the shape clients already expect
//! (`"<n>Hz"`).

use rand::Rng;

/// Upper bound (exclusive) of the placeholder peak frequency
pub const PLACEHOLDER_MAX_HZ: u32 = 10_000;

/// Derives a spectral descriptor from raw payload bytes
pub trait SpectralAnalyzer: Send + Sync {
    /// Analyzer name for diagnostics
    fn name(&self) -> &'static str;

    /// Must not panic on any input, including an empty payload
    fn summarize(&self, payload: &[u8]) -> String;
}

/// Random `"<n>Hz"` with n in `0..PLACEHOLDER_MAX_HZ`; ignores the payload
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderSpectrum;

impl SpectralAnalyzer for PlaceholderSpectrum {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn summarize(&self, _payload: &[u8]) -> String {
        let hz = rand::thread_rng().gen_range(0..PLACEHOLDER_MAX_HZ);
        format!("{}Hz", hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_shape() {
        for _ in 0..100 {
            let summary = PlaceholderSpectrum.summarize(b"");
            let hz: u32 = summary.strip_suffix("Hz").unwrap().parse().unwrap();
            assert!(hz < PLACEHOLDER_MAX_HZ);
        }
    }
}
