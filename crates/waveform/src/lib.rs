//! Three-Channel Waveform Model
//!
//! Provides the validated waveform container consumed by the feature engine.

mod error;
mod validator;
mod waveform;

pub use error::WaveformError;
pub use validator::{is_constant, validate_channels};
pub use waveform::{Waveform, CHANNEL_COUNT};
