//! Shape and Sample Validation

use crate::error::WaveformError;
use crate::waveform::CHANNEL_COUNT;

/// Validate raw channel data before it becomes a [`Waveform`](crate::Waveform).
///
/// Checks, in order: channel count, non-empty channels, equal lengths,
/// finite samples.
pub fn validate_channels<C: AsRef<[f64]>>(channels: &[C]) -> Result<(), WaveformError> {
    if channels.len() != CHANNEL_COUNT {
        return Err(WaveformError::ShapeMismatch(format!(
            "expected {} channels, got {}",
            CHANNEL_COUNT,
            channels.len()
        )));
    }

    let expected_len = channels[0].as_ref().len();
    if expected_len == 0 {
        return Err(WaveformError::ShapeMismatch(
            "channels must not be empty".to_string(),
        ));
    }

    for (channel, data) in channels.iter().enumerate() {
        let data = data.as_ref();
        if data.len() != expected_len {
            return Err(WaveformError::ShapeMismatch(format!(
                "channel {} has {} samples, channel 0 has {}",
                channel,
                data.len(),
                expected_len
            )));
        }

        if let Some(index) = data.iter().position(|v| !v.is_finite()) {
            return Err(WaveformError::NonFiniteSample { channel, index });
        }
    }

    Ok(())
}

/// True when every sample equals the first (zero variance, includes silence)
pub fn is_constant(samples: &[f64]) -> bool {
    match samples.first() {
        Some(&first) => samples.iter().all(|&v| v == first),
        None => true,
    }
}
