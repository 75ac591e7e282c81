//! End-to-end Waveform Pipeline

use crate::auxiliary::AuxiliarySpectralFeatureExtractor;
use crate::error::Result;
use crate::features::{FeatureAssembler, FeatureVector};
use crate::settings::PipelineConfig;
use crate::spectrogram::{Spectrogram, SpectrogramTransformer};
use crate::statistics::StatisticalFeatureExtractor;
use tracing::{debug, info};
use waveform::Waveform;

/// Spectrogram transformer plus both feature sets under one configuration.
///
/// Immutable after construction; share it across threads to process
/// disjoint waveforms in parallel.
pub struct Pipeline {
    config: PipelineConfig,
    transformer: SpectrogramTransformer,
    assembler: FeatureAssembler,
}

impl Pipeline {
    /// Build every stage, validating the configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let transformer = SpectrogramTransformer::new(config.spectral)?;
        let assembler = FeatureAssembler::new()
            .with(StatisticalFeatureExtractor::new(
                config.spectral,
                config.statistical,
            )?)
            .with(AuxiliarySpectralFeatureExtractor::new(config.auxiliary)?);

        info!(
            "Pipeline ready: fs={} Hz, segment={}, overlap={}, {} features",
            config.spectral.sample_rate,
            config.spectral.segment_len,
            config.spectral.overlap,
            assembler.feature_count()
        );

        Ok(Self {
            config,
            transformer,
            assembler,
        })
    }

    /// Pipeline with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(PipelineConfig::default())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Features produced per waveform
    pub fn feature_count(&self) -> usize {
        self.assembler.feature_count()
    }

    pub fn spectrogram(&self, waveform: &Waveform) -> Spectrogram {
        self.transformer.compute_spectrogram(waveform)
    }

    pub fn log_spectrogram(&self, waveform: &Waveform) -> Spectrogram {
        self.transformer.compute_log_spectrogram(waveform)
    }

    /// Statistical and auxiliary features merged into one vector
    pub fn features(&self, waveform: &Waveform) -> Result<FeatureVector> {
        let features = self.assembler.assemble(waveform)?;
        debug!("Assembled {} features", features.len());
        Ok(features)
    }
}
