//! Waveform Error Types

use thiserror::Error;

/// Errors raised while building a waveform
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WaveformError {
    /// Wrong channel count, ragged channels, or empty channels
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// NaN or infinite sample
    #[error("Non-finite sample at channel {channel}, index {index}")]
    NonFiniteSample { channel: usize, index: usize },
}
