//! Window Functions
//!
//! Periodic (DFT-even) tapers for segment-based spectral estimation. A
//! periodic window of length N is the symmetric window of length N + 1
//! with its last point dropped.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Taper applied to each segment before the FFT
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WindowType {
    /// Raised cosine
    Hann,
    /// Raised cosine on a 0.08 pedestal
    Hamming,
    /// Flat top with cosine tapers covering `alpha` of the window
    Tukey { alpha: f64 },
    /// No taper
    Rectangular,
}

impl Default for WindowType {
    fn default() -> Self {
        WindowType::Hann
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowType::Hann => write!(f, "Hann"),
            WindowType::Hamming => write!(f, "Hamming"),
            WindowType::Tukey { alpha } => write!(f, "Tukey({alpha})"),
            WindowType::Rectangular => write!(f, "Rectangular"),
        }
    }
}

impl WindowType {
    /// Tukey with the 25% taper used by the spectrogram defaults
    pub fn tukey() -> Self {
        WindowType::Tukey { alpha: 0.25 }
    }

    /// Check shape parameters
    pub fn is_valid(&self) -> bool {
        match self {
            WindowType::Tukey { alpha } => (0.0..=1.0).contains(alpha),
            _ => true,
        }
    }
}

/// Generate a periodic window of the given type and size
pub fn generate_window(window_type: WindowType, size: usize) -> Vec<f64> {
    if size == 0 {
        return Vec::new();
    }
    if size == 1 {
        return vec![1.0];
    }

    match window_type {
        WindowType::Hann => cosine_window(size, 0.5),
        WindowType::Hamming => cosine_window(size, 0.54),
        WindowType::Tukey { alpha } => tukey_window(size, alpha),
        WindowType::Rectangular => vec![1.0; size],
    }
}

/// `a - (1 - a) cos(2πn / N)`
fn cosine_window(size: usize, a: f64) -> Vec<f64> {
    (0..size)
        .map(|i| a - (1.0 - a) * (2.0 * PI * i as f64 / size as f64).cos())
        .collect()
}

fn tukey_window(size: usize, alpha: f64) -> Vec<f64> {
    if alpha <= 0.0 {
        return vec![1.0; size];
    }
    if alpha >= 1.0 {
        return cosine_window(size, 0.5);
    }

    // Symmetric length, truncated back to `size` below
    let m = size + 1;
    let span = (m - 1) as f64;
    let width = (alpha * span / 2.0).floor() as usize;

    (0..size)
        .map(|n| {
            let x = n as f64;
            if n <= width {
                0.5 * (1.0 + (PI * (-1.0 + 2.0 * x / alpha / span)).cos())
            } else if n >= m - width - 1 {
                0.5 * (1.0 + (PI * (-2.0 / alpha + 1.0 + 2.0 * x / alpha / span)).cos())
            } else {
                1.0
            }
        })
        .collect()
}

/// Sum of window values
pub fn coherent_gain(window: &[f64]) -> f64 {
    window.iter().sum()
}

/// Sum of squared window values
pub fn power_gain(window: &[f64]) -> f64 {
    window.iter().map(|&w| w * w).sum()
}
