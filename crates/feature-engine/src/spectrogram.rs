//! Three-Channel Spectrograms

use crate::error::Result;
use crate::fft::SpectralEstimator;
use crate::settings::SpectralConfig;
use ndarray::{Array3, ArrayView2, Axis};
use serde::Serialize;
use tracing::debug;
use waveform::{Waveform, CHANNEL_COUNT};

/// Stacked per-channel spectrograms, shape `(channels, frequency bins, frames)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrogram {
    /// Cell values
    pub data: Array3<f64>,
    /// Frequency axis (Hz), shared by all channels
    pub frequencies: Vec<f64>,
    /// Segment centre times (s), shared by all channels
    pub times: Vec<f64>,
}

impl Spectrogram {
    pub fn n_channels(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn n_frequencies(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn n_frames(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// One channel's `(frequency, frame)` plane
    pub fn channel(&self, index: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(0), index)
    }

    /// Element-wise `ln(1 + x)`; axes unchanged
    pub fn log1p(&self) -> Self {
        Self {
            data: self.data.mapv(f64::ln_1p),
            frequencies: self.frequencies.clone(),
            times: self.times.clone(),
        }
    }
}

/// Applies one spectral estimator identically to every channel
pub struct SpectrogramTransformer {
    estimator: SpectralEstimator,
}

impl SpectrogramTransformer {
    /// Create a transformer for the given segmentation
    pub fn new(config: SpectralConfig) -> Result<Self> {
        Ok(Self {
            estimator: SpectralEstimator::new(config)?,
        })
    }

    /// Underlying estimator
    pub fn estimator(&self) -> &SpectralEstimator {
        &self.estimator
    }

    /// Raw spectrogram, channels in waveform order
    pub fn compute_spectrogram(&self, waveform: &Waveform) -> Spectrogram {
        let n = waveform.len();
        let frequencies = self.estimator.frequencies();
        let times = self.estimator.frame_times(n);

        let mut data = Array3::zeros((CHANNEL_COUNT, frequencies.len(), times.len()));
        for (index, samples) in waveform.channels() {
            data.index_axis_mut(Axis(0), index)
                .assign(&self.estimator.stft(samples));
        }

        debug!(
            "Computed spectrogram: {} x {} x {}",
            CHANNEL_COUNT,
            frequencies.len(),
            times.len()
        );

        Spectrogram {
            data,
            frequencies,
            times,
        }
    }

    /// `log1p`-compressed spectrogram
    pub fn compute_log_spectrogram(&self, waveform: &Waveform) -> Spectrogram {
        self.compute_spectrogram(waveform).log1p()
    }
}

/// One-shot raw spectrogram
pub fn compute_spectrogram(waveform: &Waveform, config: &SpectralConfig) -> Result<Spectrogram> {
    Ok(SpectrogramTransformer::new(*config)?.compute_spectrogram(waveform))
}

/// One-shot `log1p` spectrogram
pub fn compute_log_spectrogram(
    waveform: &Waveform,
    config: &SpectralConfig,
) -> Result<Spectrogram> {
    Ok(SpectrogramTransformer::new(*config)?.compute_log_spectrogram(waveform))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeatureError;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    fn sine_waveform(freq: f64, n: usize) -> Waveform {
        let channel = |phase: f64| -> Vec<f64> {
            (0..n)
                .map(|i| (2.0 * PI * freq * i as f64 / 100.0 + phase).sin())
                .collect()
        };
        Waveform::from_channels(vec![channel(0.0), channel(1.0), channel(2.0)]).unwrap()
    }

    #[test]
    fn test_spectrogram_shape() {
        let waveform = sine_waveform(2.0, 200);
        let spec = compute_spectrogram(&waveform, &SpectralConfig::default()).unwrap();
        assert_eq!(spec.n_channels(), 3);
        assert_eq!(spec.n_frequencies(), 33);
        assert_eq!(spec.n_frames(), 9);
        assert_eq!(spec.data.dim(), (3, 33, 9));
        assert_eq!(spec.frequencies.len(), 33);
        assert_eq!(spec.times.len(), 9);
    }

    #[test]
    fn test_log_spectrogram_is_log1p() {
        let waveform = sine_waveform(4.0, 300);
        let config = SpectralConfig::default();
        let raw = compute_spectrogram(&waveform, &config).unwrap();
        let log = compute_log_spectrogram(&waveform, &config).unwrap();
        assert_eq!(raw.data.dim(), log.data.dim());
        for (r, l) in raw.data.iter().zip(log.data.iter()) {
            assert!((r.ln_1p() - l).abs() < 1e-12);
        }
    }

    #[test]
    fn test_channel_order_preserved() {
        let n = 256;
        let quiet = vec![0.0; n];
        let loud: Vec<f64> = (0..n).map(|i| (2.0 * PI * 10.0 * i as f64 / 100.0).sin()).collect();
        let waveform = Waveform::from_channels(vec![quiet.clone(), loud.clone(), quiet]).unwrap();

        let transformer = SpectrogramTransformer::new(SpectralConfig::default()).unwrap();
        let spec = transformer.compute_spectrogram(&waveform);
        let single = transformer.estimator().stft(&loud);

        assert!(spec.channel(0).iter().all(|&v| v == 0.0));
        assert!(spec.channel(2).iter().all(|&v| v == 0.0));
        assert_eq!(spec.channel(1), single.view());
    }

    #[test]
    fn test_invalid_configuration() {
        let waveform = sine_waveform(2.0, 200);
        let config = SpectralConfig::with_segments(100.0, 40, 48);
        assert!(matches!(
            compute_spectrogram(&waveform, &config),
            Err(FeatureError::InvalidConfiguration(_))
        ));
        assert!(compute_log_spectrogram(&waveform, &config).is_err());
    }

    #[test]
    fn test_short_waveform_single_frame() {
        let waveform = sine_waveform(2.0, 30);
        let spec = compute_spectrogram(&waveform, &SpectralConfig::default()).unwrap();
        assert_eq!(spec.data.dim(), (3, 33, 1));
    }

    proptest! {
        #[test]
        fn prop_log_matches_raw_and_is_deterministic(
            samples in proptest::collection::vec(-100.0f64..100.0, 64..400)
        ) {
            let reversed: Vec<f64> = samples.iter().rev().copied().collect();
            let scaled: Vec<f64> = samples.iter().map(|v| v * 0.5).collect();
            let waveform = Waveform::from_channels(vec![samples, reversed, scaled]).unwrap();
            let transformer = SpectrogramTransformer::new(SpectralConfig::default()).unwrap();

            let raw = transformer.compute_spectrogram(&waveform);
            let again = transformer.compute_spectrogram(&waveform);
            let log = transformer.compute_log_spectrogram(&waveform);

            prop_assert_eq!(&raw, &again);
            prop_assert_eq!(raw.data.dim(), log.data.dim());
            prop_assert_eq!(raw.n_channels(), 3);
            for (r, l) in raw.data.iter().zip(log.data.iter()) {
                prop_assert!((r.ln_1p() - l).abs() <= 1e-9 * (1.0 + l.abs()));
            }
        }
    }
}
