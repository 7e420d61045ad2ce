//! Spectrum

mod rgb_spectrum;

// Re-export
pub use rgb_spectrum::*;

/// Rendering uses `RGBSpectrum` throughout.
pub type Spectrum = RGBSpectrum;
