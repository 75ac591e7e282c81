//! Waveform Feature Engine
//!
//! Spectrograms and per-channel feature vectors for three-channel
//! waveforms. Every transform is a pure function of its input and a fixed
//! configuration.

mod auxiliary;
mod error;
mod features;
mod fft;
mod pipeline;
mod settings;
mod spectrogram;
mod statistics;
mod window;

pub use auxiliary::{AuxiliaryFeatures, AuxiliarySpectralFeatureExtractor, AUXILIARY_FEATURE_COUNT};
pub use error::{FeatureError, Result};
pub use features::{channel_key, FeatureAssembler, FeatureSet, FeatureVector};
pub use fft::{Psd, SpectralEstimator};
pub use pipeline::Pipeline;
pub use settings::{
    AuxiliaryConfig, DegeneratePolicy, FrequencyBand, PipelineConfig, SpectralConfig,
    SpectralScaling, SpectrogramMode, StatisticalConfig, DEFAULT_OVERLAP, DEFAULT_SAMPLE_RATE,
    DEFAULT_SEGMENT_LEN, ENV_PREFIX,
};
pub use spectrogram::{
    compute_log_spectrogram, compute_spectrogram, Spectrogram, SpectrogramTransformer,
};
pub use statistics::{StatisticalFeatureExtractor, StatisticalFeatures, STATISTICAL_FEATURE_NAMES};
pub use window::{generate_window, WindowType};

pub use waveform::{Waveform, WaveformError, CHANNEL_COUNT};
