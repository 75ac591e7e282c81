//! Statistical Features Computation
//!
//! Amplitude, energy, spectral, and shape statistics for each channel.

use crate::error::{FeatureError, Result};
use crate::features::{channel_key, FeatureSet, FeatureVector};
use crate::fft::{Psd, SpectralEstimator};
use crate::settings::{DegeneratePolicy, SpectralConfig, StatisticalConfig};
use tracing::{debug, warn};
use waveform::{is_constant, Waveform, CHANNEL_COUNT};

/// Feature names in output order
pub const STATISTICAL_FEATURE_NAMES: [&str; 23] = [
    "max",
    "min",
    "mean",
    "std",
    "median",
    "range",
    "mean_abs",
    "energy",
    "rms",
    "peak_power",
    "dominant_freq",
    "mean_power",
    "spectral_entropy",
    "spectral_flatness",
    "zero_crossings",
    "num_peaks",
    "kurtosis",
    "skewness",
    "variance",
    "iqr",
    "rise_time",
    "fall_time",
    "peak_to_peak",
];

/// Statistical features for one channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticalFeatures {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub median: f64,
    /// Max minus min
    pub range: f64,
    pub mean_abs: f64,
    /// Sum of squares
    pub energy: f64,
    pub rms: f64,
    pub peak_power: f64,
    /// Frequency of the first PSD maximum (Hz)
    pub dominant_frequency: f64,
    pub mean_power: f64,
    /// Shannon entropy (nats) of the normalised PSD
    pub spectral_entropy: f64,
    /// Geometric over arithmetic mean of the PSD
    pub spectral_flatness: f64,
    pub zero_crossings: usize,
    pub num_peaks: usize,
    /// Excess (Fisher) kurtosis
    pub kurtosis: f64,
    pub skewness: f64,
    pub variance: f64,
    /// 75th minus 25th percentile
    pub iqr: f64,
    /// Index of the first maximum sample
    pub rise_time: usize,
    /// Samples from the first maximum to the end
    pub fall_time: usize,
    pub peak_to_peak: f64,
}

impl StatisticalFeatures {
    /// Compute statistics from samples and their PSD
    pub fn compute(values: &[f64], psd: &Psd) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        // Exact mean for constant input so every deviation is exactly zero
        let mean = if is_constant(values) {
            values[0]
        } else {
            values.iter().sum::<f64>() / n
        };

        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let (argmax, max) = first_max(values);

        // Central moments
        let mut m2 = 0.0;
        let mut m3 = 0.0;
        let mut m4 = 0.0;
        for &v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        let variance = m2 / n;
        let std_dev = variance.sqrt();

        // Skewness: E[(X-μ)³] / σ³
        let skewness = if variance > 0.0 {
            (m3 / n) / (variance * std_dev)
        } else {
            0.0
        };

        // Kurtosis: E[(X-μ)⁴] / σ⁴ - 3 (excess kurtosis)
        let kurtosis = if variance > 0.0 {
            (m4 / n) / (variance * variance) - 3.0
        } else {
            0.0
        };

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let energy: f64 = values.iter().map(|v| v * v).sum();
        let power_len = psd.power.len().max(1) as f64;
        let (_, peak_power) = psd.peak();

        Self {
            max,
            min,
            mean,
            std_dev,
            median: percentile(&sorted, 0.5),
            range: max - min,
            mean_abs: values.iter().map(|v| v.abs()).sum::<f64>() / n,
            energy,
            rms: (energy / n).sqrt(),
            peak_power: if psd.power.is_empty() { 0.0 } else { peak_power },
            dominant_frequency: psd.dominant_frequency(),
            mean_power: psd.total() / power_len,
            spectral_entropy: spectral_entropy(&psd.power),
            spectral_flatness: spectral_flatness(&psd.power),
            zero_crossings: count_zero_crossings(values),
            num_peaks: count_peaks(values),
            kurtosis,
            skewness,
            variance,
            iqr: percentile(&sorted, 0.75) - percentile(&sorted, 0.25),
            rise_time: argmax,
            fall_time: values.len() - argmax,
            peak_to_peak: max - min,
        }
    }

    /// Values in [`STATISTICAL_FEATURE_NAMES`] order
    pub fn to_array(&self) -> [f64; 23] {
        [
            self.max,
            self.min,
            self.mean,
            self.std_dev,
            self.median,
            self.range,
            self.mean_abs,
            self.energy,
            self.rms,
            self.peak_power,
            self.dominant_frequency,
            self.mean_power,
            self.spectral_entropy,
            self.spectral_flatness,
            self.zero_crossings as f64,
            self.num_peaks as f64,
            self.kurtosis,
            self.skewness,
            self.variance,
            self.iqr,
            self.rise_time as f64,
            self.fall_time as f64,
            self.peak_to_peak,
        ]
    }
}

/// Index and value of the first maximum
fn first_max(values: &[f64]) -> (usize, f64) {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| {
            if v > best.1 {
                (i, v)
            } else {
                best
            }
        })
}

/// Percentile of sorted data, linear interpolation at rank `q * (n - 1)`
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let rank = q.clamp(0.0, 1.0) * (len - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let frac = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}

/// Sign changes between consecutive samples, with sign in {-1, 0, 1}
pub fn count_zero_crossings(values: &[f64]) -> usize {
    values
        .windows(2)
        .filter(|w| sign(w[0]) != sign(w[1]))
        .count()
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Local maxima with no height or prominence threshold.
///
/// A plateau counts once when both neighbours are strictly lower.
/// The first and last samples are never peaks.
pub fn count_peaks(values: &[f64]) -> usize {
    let n = values.len();
    if n < 3 {
        return 0;
    }

    let mut peaks = 0;
    let mut i = 1;
    while i < n - 1 {
        if values[i - 1] < values[i] {
            let mut ahead = i + 1;
            while ahead < n - 1 && values[ahead] == values[i] {
                ahead += 1;
            }
            if values[ahead] < values[i] {
                peaks += 1;
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Shannon entropy (nats) of `power / Σ power`; 0 for a zero spectrum
pub fn spectral_entropy(power: &[f64]) -> f64 {
    let total: f64 = power.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    power
        .iter()
        .map(|&p| p / total)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

/// Geometric mean over arithmetic mean; 0 when any bin is zero
pub fn spectral_flatness(power: &[f64]) -> f64 {
    if power.is_empty() {
        return 0.0;
    }
    let n = power.len() as f64;
    let arithmetic = power.iter().sum::<f64>() / n;
    if arithmetic <= 0.0 || power.iter().any(|&p| p <= 0.0) {
        return 0.0;
    }
    let geometric = (power.iter().map(|p| p.ln()).sum::<f64>() / n).exp();
    geometric / arithmetic
}

/// Per-channel statistical feature set (23 features per channel)
pub struct StatisticalFeatureExtractor {
    estimator: SpectralEstimator,
    config: StatisticalConfig,
}

impl StatisticalFeatureExtractor {
    pub fn new(spectral: SpectralConfig, config: StatisticalConfig) -> Result<Self> {
        Ok(Self {
            estimator: SpectralEstimator::new(spectral)?,
            config,
        })
    }

    /// Statistics for one channel.
    ///
    /// A constant channel gets an all-zero PSD and exact zero moments, so
    /// skewness, kurtosis, the PSD statistics, entropy, flatness, and
    /// dominant frequency are all 0.0.
    pub fn compute_channel(&self, samples: &[f64]) -> StatisticalFeatures {
        let psd = if is_constant(samples) {
            self.estimator.silent_psd()
        } else {
            self.estimator.welch(samples)
        };
        StatisticalFeatures::compute(samples, &psd)
    }

    fn check_degenerate(&self, waveform: &Waveform) -> Result<()> {
        for channel in waveform.constant_channels() {
            match self.config.degenerate_policy {
                DegeneratePolicy::Reject => {
                    return Err(FeatureError::DegenerateInput { channel })
                }
                DegeneratePolicy::Sentinel => warn!(
                    "Channel {} is constant; spectral shape statistics set to 0",
                    channel
                ),
            }
        }
        Ok(())
    }
}

impl FeatureSet for StatisticalFeatureExtractor {
    fn name(&self) -> &str {
        "statistical"
    }

    fn feature_count(&self) -> usize {
        CHANNEL_COUNT * STATISTICAL_FEATURE_NAMES.len()
    }

    fn extract(&self, waveform: &Waveform) -> Result<FeatureVector> {
        let mut features = FeatureVector::with_capacity(self.feature_count());
        self.check_degenerate(waveform)?;
        for (channel, samples) in waveform.channels() {
            let stats = self.compute_channel(samples);
            for (name, value) in STATISTICAL_FEATURE_NAMES.iter().zip(stats.to_array()) {
                features.insert(channel_key(name, channel), value)?;
            }
        }
        debug!("Extracted {} statistical features", features.len());
        Ok(features)
    }
}
