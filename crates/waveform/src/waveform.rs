//! Waveform Container

use crate::error::WaveformError;
use crate::validator::{is_constant, validate_channels};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of sensor axes in every waveform
pub const CHANNEL_COUNT: usize = 3;

/// Fixed-length, three-channel waveform.
///
/// Channel order is the sensor axis order and is kept by every transform.
/// All channels have the same non-zero length and contain finite samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Waveform {
    channels: [Vec<f64>; CHANNEL_COUNT],
}

impl Waveform {
    /// Build a waveform from per-channel sample vectors
    pub fn from_channels(channels: Vec<Vec<f64>>) -> Result<Self, WaveformError> {
        validate_channels(&channels)?;

        let mut iter = channels.into_iter();
        let (Some(x), Some(y), Some(z)) = (iter.next(), iter.next(), iter.next()) else {
            return Err(WaveformError::ShapeMismatch(format!(
                "expected {} channels",
                CHANNEL_COUNT
            )));
        };

        debug!("Built waveform: {} channels x {} samples", CHANNEL_COUNT, x.len());
        Ok(Self { channels: [x, y, z] })
    }

    /// Build a waveform from a `(channels, samples)` array
    pub fn from_array(data: &Array2<f64>) -> Result<Self, WaveformError> {
        let channels = data.outer_iter().map(|row| row.to_vec()).collect();
        Self::from_channels(channels)
    }

    /// Samples of one channel
    ///
    /// # Panics
    /// If `index >= CHANNEL_COUNT`.
    pub fn channel(&self, index: usize) -> &[f64] {
        &self.channels[index]
    }

    /// Iterate over `(index, samples)` in channel order
    pub fn channels(&self) -> impl Iterator<Item = (usize, &[f64])> {
        self.channels.iter().map(Vec::as_slice).enumerate()
    }

    /// Samples per channel
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Always false for a constructed waveform
    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }

    /// Indices of channels with zero variance
    pub fn constant_channels(&self) -> Vec<usize> {
        self.channels()
            .filter(|(_, samples)| is_constant(samples))
            .map(|(index, _)| index)
            .collect()
    }

    /// Copy into a `(channels, samples)` array
    pub fn to_array(&self) -> Array2<f64> {
        let n = self.len();
        Array2::from_shape_fn((CHANNEL_COUNT, n), |(c, i)| self.channels[c][i])
    }
}

impl TryFrom<Vec<Vec<f64>>> for Waveform {
    type Error = WaveformError;

    fn try_from(channels: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        Self::from_channels(channels)
    }
}

impl From<Waveform> for Vec<Vec<f64>> {
    fn from(waveform: Waveform) -> Self {
        waveform.channels.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn test_from_channels_preserves_order() {
        let waveform =
            Waveform::from_channels(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(waveform.len(), 2);
        assert_eq!(waveform.channel(0), &[1.0, 2.0]);
        assert_eq!(waveform.channel(2), &[5.0, 6.0]);
        let order: Vec<usize> = waveform.channels().map(|(i, _)| i).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_mismatched_lengths() {
        let result = Waveform::from_channels(vec![vec![0.0; 200], vec![0.0; 199], vec![0.0; 200]]);
        assert!(matches!(result, Err(WaveformError::ShapeMismatch(_))));
    }

    #[test]
    fn test_from_array_round_trip() {
        let data = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let waveform = Waveform::from_array(&data).unwrap();
        assert_eq!(waveform.channel(1), &[4.0, 5.0, 6.0]);
        assert_eq!(waveform.to_array(), data);
    }

    #[test]
    fn test_from_array_wrong_rows() {
        let data = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(matches!(
            Waveform::from_array(&data),
            Err(WaveformError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_constant_channels() {
        let waveform =
            Waveform::from_channels(vec![vec![0.0; 4], vec![0.0, 1.0, 0.0, -1.0], vec![2.0; 4]])
                .unwrap();
        assert_eq!(waveform.constant_channels(), vec![0, 2]);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Waveform = serde_json::from_str("[[1.0],[2.0],[3.0]]").unwrap();
        assert_eq!(ok.channel(2), &[3.0]);
        assert!(serde_json::from_str::<Waveform>("[[1.0],[2.0]]").is_err());
    }

    proptest! {
        #[test]
        fn prop_equal_length_channels_accepted(
            samples in proptest::collection::vec(-1.0e6f64..1.0e6, 1..256)
        ) {
            let waveform = Waveform::from_channels(
                vec![samples.clone(), samples.clone(), samples.clone()]
            ).unwrap();
            prop_assert_eq!(waveform.len(), samples.len());
            prop_assert_eq!(waveform.to_array().dim(), (CHANNEL_COUNT, samples.len()));
        }
    }
}
