//! Frame-local Spectral Features
//!
//! Lighter descriptors for separating adjacent signal regimes: peak and
//! RMS amplitude, short-time spectral shape (centroid, bandwidth,
//! rolloff), frame-averaged zero-crossing rate, and the fraction of FFT
//! energy inside a fixed band.

use crate::error::Result;
use crate::features::{channel_key, FeatureSet, FeatureVector};
use crate::settings::AuxiliaryConfig;
use crate::window::{generate_window, WindowType};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;
use tracing::debug;
use waveform::{Waveform, CHANNEL_COUNT};

/// Features per channel
pub const AUXILIARY_FEATURE_COUNT: usize = 7;

/// Samples with magnitude at or below this count as zero for ZCR
const ZCR_THRESHOLD: f64 = 1e-10;

/// Auxiliary features for one channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuxiliaryFeatures {
    /// Max |x|
    pub max_amp: f64,
    pub rms_amp: f64,
    /// Mean over frames (Hz)
    pub spectral_centroid: f64,
    /// Mean over frames (Hz)
    pub spectral_bandwidth: f64,
    /// Mean over frames (Hz)
    pub spectral_rolloff: f64,
    /// Crossings per sample, mean over frames
    pub zero_crossing_rate: f64,
    /// Band energy over total energy
    pub band_energy_ratio: f64,
}

/// Per-frame spectral shape
#[derive(Debug, Clone, Copy, Default)]
struct FrameShape {
    centroid: f64,
    bandwidth: f64,
    rolloff: f64,
}

/// Per-channel auxiliary feature set (7 features per channel)
pub struct AuxiliarySpectralFeatureExtractor {
    config: AuxiliaryConfig,
    /// Periodic Hann, `frame_length` points
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
    names: [String; AUXILIARY_FEATURE_COUNT],
}

impl AuxiliarySpectralFeatureExtractor {
    pub fn new(config: AuxiliaryConfig) -> Result<Self> {
        config.validate()?;

        let window = generate_window(WindowType::Hann, config.frame_length);
        let fft = FftPlanner::<f64>::new().plan_fft_forward(config.frame_length);
        let names = [
            "max_amp".to_string(),
            "rms_amp".to_string(),
            "spectral_centroid".to_string(),
            "spectral_bandwidth".to_string(),
            "spectral_rolloff".to_string(),
            "zcr".to_string(),
            format!("{}_energy_ratio", config.band.label()),
        ];

        Ok(Self {
            config,
            window,
            fft,
            names,
        })
    }

    /// Feature names (without channel suffix) in output order
    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    /// Features for one channel
    pub fn compute_channel(&self, samples: &[f64]) -> AuxiliaryFeatures {
        if samples.is_empty() {
            return AuxiliaryFeatures::default();
        }
        let full = FftPlanner::<f64>::new().plan_fft_forward(samples.len());
        self.compute_with_plan(samples, full.as_ref())
    }

    /// Features for one channel, reusing a `samples.len()`-point FFT plan
    fn compute_with_plan(&self, samples: &[f64], full: &dyn Fft<f64>) -> AuxiliaryFeatures {
        if samples.is_empty() {
            return AuxiliaryFeatures::default();
        }

        let n = samples.len() as f64;
        let shapes = self.frame_shapes(samples);
        let frames = shapes.len().max(1) as f64;

        AuxiliaryFeatures {
            max_amp: samples.iter().fold(0.0, |m: f64, v| m.max(v.abs())),
            rms_amp: (samples.iter().map(|v| v * v).sum::<f64>() / n).sqrt(),
            spectral_centroid: shapes.iter().map(|s| s.centroid).sum::<f64>() / frames,
            spectral_bandwidth: shapes.iter().map(|s| s.bandwidth).sum::<f64>() / frames,
            spectral_rolloff: shapes.iter().map(|s| s.rolloff).sum::<f64>() / frames,
            zero_crossing_rate: self.zero_crossing_rate(samples),
            band_energy_ratio: self.band_energy_ratio(samples, full),
        }
    }

    /// Split a padded signal into `frame_length` frames every `hop_length` samples
    fn frames<'a>(&self, padded: &'a [f64]) -> impl Iterator<Item = &'a [f64]> {
        let frame_length = self.config.frame_length;
        let count = 1 + padded.len().saturating_sub(frame_length) / self.config.hop_length;
        let hop = self.config.hop_length;
        (0..count).map(move |t| &padded[t * hop..t * hop + frame_length])
    }

    /// Centred, zero-padded copy of the signal
    fn centre_padded(&self, samples: &[f64], edge: bool) -> Vec<f64> {
        let pad = self.config.frame_length / 2;
        let (head, tail) = if edge {
            (samples[0], samples[samples.len() - 1])
        } else {
            (0.0, 0.0)
        };

        let mut padded = Vec::with_capacity(samples.len() + 2 * pad);
        padded.extend(std::iter::repeat(head).take(pad));
        padded.extend_from_slice(samples);
        padded.extend(std::iter::repeat(tail).take(pad));
        if padded.len() < self.config.frame_length {
            padded.resize(self.config.frame_length, tail);
        }
        padded
    }

    fn frame_shapes(&self, samples: &[f64]) -> Vec<FrameShape> {
        let frame_length = self.config.frame_length;
        let bins = frame_length / 2 + 1;
        let bin_hz = self.config.sample_rate / frame_length as f64;
        let freqs: Vec<f64> = (0..bins).map(|k| k as f64 * bin_hz).collect();

        let padded = self.centre_padded(samples, false);
        let mut buffer = vec![Complex::new(0.0, 0.0); frame_length];
        let mut magnitude = vec![0.0; bins];

        let shapes: Vec<FrameShape> = self
            .frames(&padded)
            .map(|frame| {
                for ((slot, &x), &w) in buffer.iter_mut().zip(frame).zip(&self.window) {
                    *slot = Complex::new(x * w, 0.0);
                }
                self.fft.process(&mut buffer);
                for (m, c) in magnitude.iter_mut().zip(&buffer) {
                    *m = c.norm();
                }
                self.frame_shape(&magnitude, &freqs)
            })
            .collect();

        debug!("Computed spectral shape over {} frames", shapes.len());
        shapes
    }

    fn frame_shape(&self, magnitude: &[f64], freqs: &[f64]) -> FrameShape {
        let total: f64 = magnitude.iter().sum();
        if total <= f64::MIN_POSITIVE {
            return FrameShape::default();
        }

        let centroid = magnitude
            .iter()
            .zip(freqs)
            .map(|(m, f)| m * f)
            .sum::<f64>()
            / total;

        let bandwidth = magnitude
            .iter()
            .zip(freqs)
            .map(|(m, f)| (m / total) * (f - centroid).powi(2))
            .sum::<f64>()
            .sqrt();

        let threshold = self.config.rolloff_percent * total;
        let mut cumulative = 0.0;
        let mut rolloff = freqs.last().copied().unwrap_or(0.0);
        for (m, f) in magnitude.iter().zip(freqs) {
            cumulative += m;
            if cumulative >= threshold {
                rolloff = *f;
                break;
            }
        }

        FrameShape {
            centroid,
            bandwidth,
            rolloff,
        }
    }

    /// Mean over edge-padded frames of crossings / frame length
    fn zero_crossing_rate(&self, samples: &[f64]) -> f64 {
        let padded: Vec<f64> = self
            .centre_padded(samples, true)
            .into_iter()
            .map(|v| if v.abs() <= ZCR_THRESHOLD { 0.0 } else { v })
            .collect();

        let frame_length = self.config.frame_length as f64;
        let rates: Vec<f64> = self
            .frames(&padded)
            .map(|frame| {
                let crossings = frame
                    .windows(2)
                    .filter(|w| w[0].is_sign_negative() != w[1].is_sign_negative())
                    .count();
                crossings as f64 / frame_length
            })
            .collect();

        rates.iter().sum::<f64>() / rates.len().max(1) as f64
    }

    /// `Σ|X|² in band / (Σ|X|² + ε)` over the one-sided full-length FFT
    fn band_energy_ratio(&self, samples: &[f64], fft: &dyn Fft<f64>) -> f64 {
        let n = samples.len();
        let mut buffer: Vec<Complex<f64>> =
            samples.iter().map(|&v| Complex::new(v, 0.0)).collect();
        fft.process(&mut buffer);

        let bin_hz = self.config.sample_rate / n as f64;
        let mut total = 0.0;
        let mut band = 0.0;
        for (k, c) in buffer.iter().take(n / 2 + 1).enumerate() {
            let energy = c.norm_sqr();
            total += energy;
            if self.config.band.contains(k as f64 * bin_hz) {
                band += energy;
            }
        }

        band / (total + self.config.epsilon)
    }
}

impl AuxiliaryFeatures {
    /// Values in extractor name order
    pub fn to_array(&self) -> [f64; AUXILIARY_FEATURE_COUNT] {
        [
            self.max_amp,
            self.rms_amp,
            self.spectral_centroid,
            self.spectral_bandwidth,
            self.spectral_rolloff,
            self.zero_crossing_rate,
            self.band_energy_ratio,
        ]
    }
}

impl FeatureSet for AuxiliarySpectralFeatureExtractor {
    fn name(&self) -> &str {
        "auxiliary"
    }

    fn feature_count(&self) -> usize {
        CHANNEL_COUNT * AUXILIARY_FEATURE_COUNT
    }

    fn extract(&self, waveform: &Waveform) -> Result<FeatureVector> {
        // Channels share one length, so one full-length plan serves all three
        let full = FftPlanner::<f64>::new().plan_fft_forward(waveform.len());
        let mut features = FeatureVector::with_capacity(self.feature_count());
        for (channel, samples) in waveform.channels() {
            let values = self.compute_with_plan(samples, full.as_ref()).to_array();
            for (name, value) in self.feature_names().iter().zip(values) {
                features.insert(channel_key(name, channel), value)?;
            }
        }
        debug!("Extracted {} auxiliary features", features.len());
        Ok(features)
    }
}
