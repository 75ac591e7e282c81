//! Feature Engine Error Types

use thiserror::Error;
use waveform::WaveformError;

/// Errors during spectral analysis and feature extraction
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Windowing or extractor parameters are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Input waveform has the wrong shape or bad samples
    #[error(transparent)]
    Waveform(#[from] WaveformError),

    /// Two feature sets produced the same name
    #[error("Duplicate feature key: {key}")]
    DuplicateFeatureKey { key: String },

    /// Constant channel under the reject policy
    #[error("Degenerate input: channel {channel} is constant")]
    DegenerateInput { channel: usize },

    /// Configuration sources could not be read or deserialized
    #[error("Configuration load failed: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, FeatureError>;
