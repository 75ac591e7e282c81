//! Pipeline Configuration

use crate::error::{FeatureError, Result};
use crate::window::WindowType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Default sample rate (Hz)
pub const DEFAULT_SAMPLE_RATE: f64 = 100.0;
/// Default spectrogram segment length (samples)
pub const DEFAULT_SEGMENT_LEN: usize = 64;
/// Default spectrogram segment overlap (samples)
pub const DEFAULT_OVERLAP: usize = 48;

/// Prefix for environment overrides, e.g. `WAVEFEAT_SPECTRAL__SEGMENT_LEN`
pub const ENV_PREFIX: &str = "WAVEFEAT";

/// Normalisation of the short-time power estimate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectralScaling {
    /// Power per Hz: `|X|² / (fs · Σw²)`
    #[default]
    Density,
    /// Power per bin: `|X|² / (Σw)²`
    Spectrum,
}

/// Quantity stored in each spectrogram cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrogramMode {
    /// One-sided power estimate
    #[default]
    Psd,
    /// Scaled FFT magnitude, `sqrt` of the two-sided power estimate
    Magnitude,
}

/// Segmentation and scaling for short-time spectral estimation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Sample rate (Hz)
    pub sample_rate: f64,
    /// Samples per segment (FFT size)
    pub segment_len: usize,
    /// Samples shared by consecutive segments
    pub overlap: usize,
    /// Segment taper
    pub window: WindowType,
    /// Power normalisation
    pub scaling: SpectralScaling,
    /// Cell quantity for spectrograms
    pub mode: SpectrogramMode,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            segment_len: DEFAULT_SEGMENT_LEN,
            overlap: DEFAULT_OVERLAP,
            window: WindowType::tukey(),
            scaling: SpectralScaling::Density,
            mode: SpectrogramMode::Psd,
        }
    }
}

impl SpectralConfig {
    /// Default configuration with custom segmentation
    pub fn with_segments(sample_rate: f64, segment_len: usize, overlap: usize) -> Self {
        Self {
            sample_rate,
            segment_len,
            overlap,
            ..Default::default()
        }
    }

    /// Samples between consecutive segment starts
    pub fn step(&self) -> usize {
        self.segment_len.saturating_sub(self.overlap)
    }

    /// One-sided frequency bins per segment
    pub fn frequency_bins(&self) -> usize {
        self.segment_len / 2 + 1
    }

    /// Check segmentation constraints
    pub fn validate(&self) -> Result<()> {
        if self.segment_len == 0 {
            return Err(FeatureError::InvalidConfiguration(
                "segment length must be positive".to_string(),
            ));
        }
        if self.overlap >= self.segment_len {
            return Err(FeatureError::InvalidConfiguration(format!(
                "overlap {} must be less than segment length {}",
                self.overlap, self.segment_len
            )));
        }
        validate_sample_rate(self.sample_rate)?;
        if !self.window.is_valid() {
            return Err(FeatureError::InvalidConfiguration(format!(
                "invalid window parameters: {}",
                self.window
            )));
        }
        Ok(())
    }
}

/// What to do with a constant (zero-variance) channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneratePolicy {
    /// Report 0.0 for shape and spectral-shape statistics
    #[default]
    Sentinel,
    /// Fail with `DegenerateInput`
    Reject,
}

/// Statistical extractor settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticalConfig {
    /// Constant channel handling
    pub degenerate_policy: DegeneratePolicy,
}

/// Inclusive frequency band (Hz)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    /// Lower edge
    pub low: f64,
    /// Upper edge
    pub high: f64,
}

impl Default for FrequencyBand {
    fn default() -> Self {
        Self { low: 5.0, high: 10.0 }
    }
}

impl FrequencyBand {
    /// Create a band
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Whether `freq` lies in the band, edges included
    pub fn contains(&self, freq: f64) -> bool {
        freq >= self.low && freq <= self.high
    }

    /// Feature name stem, e.g. `band_5_10`
    pub fn label(&self) -> String {
        format!("band_{}_{}", self.low, self.high)
    }
}

/// Frame-local spectral descriptor settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuxiliaryConfig {
    /// Sample rate (Hz)
    pub sample_rate: f64,
    /// Samples per analysis frame (FFT size)
    pub frame_length: usize,
    /// Samples between frame starts
    pub hop_length: usize,
    /// Band for the energy ratio
    pub band: FrequencyBand,
    /// Fraction of frame energy below the rolloff frequency
    pub rolloff_percent: f64,
    /// Denominator guard for the band-energy ratio
    pub epsilon: f64,
}

impl Default for AuxiliaryConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_length: 2048,
            hop_length: 512,
            band: FrequencyBand::default(),
            rolloff_percent: 0.85,
            epsilon: 1e-12,
        }
    }
}

impl AuxiliaryConfig {
    /// Check framing and band constraints
    pub fn validate(&self) -> Result<()> {
        validate_sample_rate(self.sample_rate)?;
        if self.frame_length == 0 || self.hop_length == 0 {
            return Err(FeatureError::InvalidConfiguration(format!(
                "frame length {} and hop length {} must be positive",
                self.frame_length, self.hop_length
            )));
        }
        let band = self.band;
        if !(band.low.is_finite() && band.high.is_finite()) || band.low < 0.0 || band.low > band.high
        {
            return Err(FeatureError::InvalidConfiguration(format!(
                "invalid band [{}, {}] Hz",
                band.low, band.high
            )));
        }
        let rolloff = self.rolloff_percent;
        if rolloff.is_nan() || rolloff <= 0.0 || rolloff > 1.0 {
            return Err(FeatureError::InvalidConfiguration(format!(
                "rolloff percent {} must be in (0, 1]",
                rolloff
            )));
        }
        if self.epsilon.is_nan() || self.epsilon < 0.0 {
            return Err(FeatureError::InvalidConfiguration(format!(
                "epsilon {} must be non-negative",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Spectrogram and PSD segmentation
    pub spectral: SpectralConfig,
    /// Statistical extractor settings
    pub statistical: StatisticalConfig,
    /// Auxiliary extractor settings
    pub auxiliary: AuxiliaryConfig,
}

impl PipelineConfig {
    /// Load defaults, then an optional file, then `WAVEFEAT_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!("Loading pipeline config from {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.spectral.validate()?;
        self.auxiliary.validate()
    }
}

fn validate_sample_rate(sample_rate: f64) -> Result<()> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(FeatureError::InvalidConfiguration(format!(
            "sample rate {} must be positive",
            sample_rate
        )))
    }
}
