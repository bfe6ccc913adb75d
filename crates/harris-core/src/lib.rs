//! Core primitives for structure-tensor corner responses and classical edge
//! maps on 8-bit grayscale grids.
//!
//! # Overview
//!
//! The corner pipeline chains four building blocks:
//!
//! - [`gradient`] – signed 3×3 Sobel derivatives.
//! - [`integral`] – summed-area tables with O(1) windowed sums and means.
//! - [`tensor`] – windowed `Sxx`, `Syy`, `Sxy` means built on three tables.
//! - [`response`] / [`detect`] – the per-pixel response
//!   `R = Sxx·Syy − Sxy² − λ·(Sxx + Syy)²` and its binary classification.
//!
//! Alongside the detector live the shared utilities used by the edge maps:
//! [`normalize`] (min-max rescale to bytes), [`threshold`] (histogram
//! percentile binarization) and [`edges`] (Sobel, morphological,
//! zero-crossing, entropy and difference-of-probability edge maps).
//!
//! Every stage allocates and returns a fresh [`Grid`]; nothing is modified in
//! place and no state survives between calls, so repeated runs on the same
//! input are bitwise identical.
//!
//! # Features
//!
//! - `rayon` – processes independent rows of the Sobel, summed-area row,
//!   response and classification passes in parallel. Results do not change.
//! - `tracing` – adds `tracing` spans to the main entry points.

pub mod detect;
pub mod edges;
mod error;
pub mod gradient;
pub mod grid;
pub mod integral;
pub mod normalize;
pub mod response;
pub mod tensor;
pub mod threshold;

pub use crate::error::Error;
pub use crate::grid::{Grid, Window};

/// Output value of a classified corner pixel.
pub const CORNER: u8 = 255;
/// Output value of every other pixel in a corner map.
pub const BACKGROUND: u8 = 0;

/// Dense response field; zero wherever the window does not fit.
pub type ResponseMap = Grid<f64>;

/// Tunable parameters for the corner response and its classification.
///
/// Construction is validated, so a `HarrisParams` value always carries an
/// odd window, `0 < lambda < 0.25` and a finite threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HarrisParams {
    window: Window,
    lambda: f64,
    threshold: f64,
}

impl HarrisParams {
    pub const DEFAULT_LAMBDA: f64 = 0.05;
    pub const DEFAULT_THRESHOLD: f64 = 0.01;

    pub fn new(window: Window, lambda: f64, threshold: f64) -> Result<Self, Error> {
        if !(lambda.is_finite() && lambda > 0.0 && lambda < 0.25) {
            return Err(Error::InvalidLambda(lambda));
        }
        if !threshold.is_finite() {
            return Err(Error::InvalidThreshold(threshold));
        }
        Ok(Self {
            window,
            lambda,
            threshold,
        })
    }

    /// Averaging window of the structure tensor.
    #[inline]
    pub fn window(&self) -> Window {
        self.window
    }

    /// Trace penalty `λ` of the response.
    #[inline]
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Minimum response (exclusive) for a pixel to count as a corner.
    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn with_window(self, window: Window) -> Self {
        Self { window, ..self }
    }

    pub fn with_lambda(self, lambda: f64) -> Result<Self, Error> {
        Self::new(self.window, lambda, self.threshold)
    }

    pub fn with_threshold(self, threshold: f64) -> Result<Self, Error> {
        Self::new(self.window, self.lambda, threshold)
    }
}

impl Default for HarrisParams {
    fn default() -> Self {
        Self {
            window: Window::default(),
            lambda: Self::DEFAULT_LAMBDA,
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}
