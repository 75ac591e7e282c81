//! FFT-based Spectral Estimation
//!
//! Short-time spectra and Welch power spectral density for one channel.
//! Each segment is mean-detrended, tapered, and transformed with a
//! `segment_len`-point FFT. Channels shorter than one segment are
//! zero-padded to a single segment.

use crate::error::Result;
use crate::settings::{SpectralConfig, SpectralScaling, SpectrogramMode};
use crate::window::{coherent_gain, generate_window, power_gain};
use ndarray::{Array2, Axis};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Power spectral density of one channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Psd {
    /// Bin centre frequencies (Hz)
    pub frequencies: Vec<f64>,
    /// Power per bin
    pub power: Vec<f64>,
}

impl Psd {
    /// Total power
    pub fn total(&self) -> f64 {
        self.power.iter().sum()
    }

    /// Index and value of the first maximum
    pub fn peak(&self) -> (usize, f64) {
        self.power
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &p)| {
                if p > best.1 {
                    (i, p)
                } else {
                    best
                }
            })
    }

    /// Frequency of the first maximum
    pub fn dominant_frequency(&self) -> f64 {
        let (index, _) = self.peak();
        self.frequencies.get(index).copied().unwrap_or(0.0)
    }
}

/// Segment-based spectral estimator for a fixed configuration
pub struct SpectralEstimator {
    /// Segmentation and scaling
    config: SpectralConfig,
    /// Periodic taper, `segment_len` points
    window: Vec<f64>,
    /// Power normalisation for `|X|²`
    scale: f64,
    /// Forward FFT plan
    fft: Arc<dyn Fft<f64>>,
}

impl SpectralEstimator {
    /// Create an estimator, validating the configuration
    pub fn new(config: SpectralConfig) -> Result<Self> {
        config.validate()?;

        let window = generate_window(config.window, config.segment_len);
        let scale = match config.scaling {
            SpectralScaling::Density => 1.0 / (config.sample_rate * power_gain(&window)),
            SpectralScaling::Spectrum => 1.0 / coherent_gain(&window).powi(2),
        };
        let fft = FftPlanner::<f64>::new().plan_fft_forward(config.segment_len);

        Ok(Self {
            config,
            window,
            scale,
            fft,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &SpectralConfig {
        &self.config
    }

    /// Bin centre frequencies (Hz)
    pub fn frequencies(&self) -> Vec<f64> {
        let n = self.config.segment_len as f64;
        (0..self.config.frequency_bins())
            .map(|k| k as f64 * self.config.sample_rate / n)
            .collect()
    }

    /// Number of segments for a channel of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        if len < self.config.segment_len {
            1
        } else {
            (len - self.config.overlap) / self.config.step()
        }
    }

    /// Segment centre times (seconds)
    pub fn frame_times(&self, len: usize) -> Vec<f64> {
        let half = self.config.segment_len as f64 / 2.0;
        let step = self.config.step() as f64;
        (0..self.frame_count(len))
            .map(|t| (half + t as f64 * step) / self.config.sample_rate)
            .collect()
    }

    /// All-zero PSD on this estimator's frequency axis
    pub fn silent_psd(&self) -> Psd {
        Psd {
            frequencies: self.frequencies(),
            power: vec![0.0; self.config.frequency_bins()],
        }
    }

    /// Short-time spectrum, `(frequency bins, frames)`, in the configured mode
    pub fn stft(&self, channel: &[f64]) -> Array2<f64> {
        self.estimate(channel, self.config.mode)
    }

    /// Welch PSD: mean of the short-time power estimates over all segments
    pub fn welch(&self, channel: &[f64]) -> Psd {
        let frames = self.estimate(channel, SpectrogramMode::Psd);
        let power = frames
            .mean_axis(Axis(1))
            .map(|p| p.to_vec())
            .unwrap_or_else(|| vec![0.0; self.config.frequency_bins()]);

        Psd {
            frequencies: self.frequencies(),
            power,
        }
    }

    fn estimate(&self, channel: &[f64], mode: SpectrogramMode) -> Array2<f64> {
        let segment_len = self.config.segment_len;
        let step = self.config.step();
        let frames = self.frame_count(channel.len());

        let padded;
        let source = if channel.len() < segment_len {
            warn!(
                "Channel has {} samples, fewer than segment length {}; zero-padding to one segment",
                channel.len(),
                segment_len
            );
            padded = {
                let mut v = channel.to_vec();
                v.resize(segment_len, 0.0);
                v
            };
            padded.as_slice()
        } else {
            channel
        };

        let mut spectrum = Array2::zeros((self.config.frequency_bins(), frames));
        let mut buffer = vec![Complex::new(0.0, 0.0); segment_len];

        for (frame, mut column) in spectrum.axis_iter_mut(Axis(1)).enumerate() {
            let start = frame * step;
            self.transform_segment(&source[start..start + segment_len], &mut buffer);
            for (k, cell) in column.iter_mut().enumerate() {
                *cell = self.bin_value(k, buffer[k], mode);
            }
        }

        debug!(
            "Estimated spectrum: {} bins x {} frames from {} samples",
            spectrum.nrows(),
            frames,
            channel.len()
        );
        spectrum
    }

    /// Detrend, taper, and transform one segment in place
    fn transform_segment(&self, segment: &[f64], buffer: &mut [Complex<f64>]) {
        let mean = segment.iter().sum::<f64>() / segment.len() as f64;
        for ((slot, &x), &w) in buffer.iter_mut().zip(segment).zip(&self.window) {
            *slot = Complex::new((x - mean) * w, 0.0);
        }
        self.fft.process(buffer);
    }

    fn bin_value(&self, k: usize, value: Complex<f64>, mode: SpectrogramMode) -> f64 {
        match mode {
            SpectrogramMode::Psd => {
                let power = value.norm_sqr() * self.scale;
                if self.is_mirrored_bin(k) {
                    2.0 * power
                } else {
                    power
                }
            }
            SpectrogramMode::Magnitude => value.norm() * self.scale.sqrt(),
        }
    }

    /// Bins whose negative-frequency twin is folded in (all but DC and Nyquist)
    fn is_mirrored_bin(&self, k: usize) -> bool {
        let n = self.config.segment_len;
        k > 0 && !(n % 2 == 0 && k == n / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeatureError;
    use std::f64::consts::PI;

    fn sine(freq: f64, sample_rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_segmentation_arithmetic() {
        let estimator = SpectralEstimator::new(SpectralConfig::default()).unwrap();
        let stft = estimator.stft(&sine(2.0, 100.0, 200));
        assert_eq!(stft.dim(), (33, 9));
        assert_eq!(estimator.frame_count(200), 9);
        assert_eq!(estimator.frame_count(64), 1);

        let times = estimator.frame_times(200);
        assert_eq!(times.len(), 9);
        assert!((times[0] - 0.32).abs() < 1e-12);
        assert!((times[1] - 0.48).abs() < 1e-12);
    }

    #[test]
    fn test_frequency_axis() {
        let estimator = SpectralEstimator::new(SpectralConfig::default()).unwrap();
        let freqs = estimator.frequencies();
        assert_eq!(freqs.len(), 33);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[1] - 1.5625).abs() < 1e-12);
        assert!((freqs[32] - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_overlap_rejected() {
        let result = SpectralEstimator::new(SpectralConfig::with_segments(100.0, 40, 48));
        assert!(matches!(result, Err(FeatureError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_welch_sine_peak() {
        let estimator = SpectralEstimator::new(SpectralConfig::default()).unwrap();
        let psd = estimator.welch(&sine(2.0, 100.0, 200));
        let bin_width = 100.0 / 64.0;
        assert!((psd.dominant_frequency() - 2.0).abs() <= bin_width);
    }

    #[test]
    fn test_welch_high_frequency_peak() {
        let config = SpectralConfig::with_segments(100.0, 128, 64);
        let estimator = SpectralEstimator::new(config).unwrap();
        let psd = estimator.welch(&sine(12.5, 100.0, 1000));
        let bin_width = 100.0 / 128.0;
        assert!((psd.dominant_frequency() - 12.5).abs() <= bin_width);
    }

    #[test]
    fn test_short_channel_single_frame() {
        let estimator = SpectralEstimator::new(SpectralConfig::default()).unwrap();
        let stft = estimator.stft(&sine(5.0, 100.0, 40));
        assert_eq!(stft.dim(), (33, 1));
        assert!(stft.iter().all(|v| v.is_finite()));

        let psd = estimator.welch(&[1.0, -1.0, 1.0]);
        assert_eq!(psd.power.len(), 33);
    }

    #[test]
    fn test_constant_channel_zero_power() {
        let estimator = SpectralEstimator::new(SpectralConfig::default()).unwrap();
        let psd = estimator.welch(&[3.0; 256]);
        assert!(psd.total().abs() < 1e-20);
        assert_eq!(psd.dominant_frequency(), 0.0);

        let silent = estimator.silent_psd();
        assert_eq!(silent.frequencies, psd.frequencies);
        assert_eq!(silent.total(), 0.0);
    }

    #[test]
    fn test_magnitude_mode_is_sqrt_of_unfolded_power() {
        let psd_est = SpectralEstimator::new(SpectralConfig::default()).unwrap();
        let mag_est = SpectralEstimator::new(SpectralConfig {
            mode: SpectrogramMode::Magnitude,
            ..Default::default()
        })
        .unwrap();

        let signal = sine(7.0, 100.0, 300);
        let power = psd_est.stft(&signal);
        let magnitude = mag_est.stft(&signal);
        assert_eq!(power.dim(), magnitude.dim());

        // DC is not folded, so power == magnitude² there
        for (p, m) in power.row(0).iter().zip(magnitude.row(0).iter()) {
            assert!((p - m * m).abs() < 1e-12);
        }
        for (p, m) in power.row(5).iter().zip(magnitude.row(5).iter()) {
            assert!((p - 2.0 * m * m).abs() < 1e-9);
        }
    }

    #[test]
    fn test_density_parseval() {
        // Rectangular window, no overlap, white-ish signal: mean density * fs ≈ variance
        let config = SpectralConfig {
            window: crate::window::WindowType::Rectangular,
            ..SpectralConfig::with_segments(100.0, 64, 0)
        };
        let estimator = SpectralEstimator::new(config).unwrap();
        let signal: Vec<f64> = (0..640).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let psd = estimator.welch(&signal);
        let bin_width = 100.0 / 64.0;
        let integrated: f64 = psd.total() * bin_width;
        assert!((integrated - 1.0).abs() < 1e-9);
    }
}
