//! Histogram percentile binarization of byte grids.
//!
//! Both thresholds mark the selected tail with `0` and everything else with
//! `255`; the input grid is left untouched.
use crate::grid::Grid;
use crate::Error;

/// Value written for pixels in the selected tail.
pub const EDGE: u8 = 0;
/// Value written for every other pixel.
pub const NON_EDGE: u8 = 255;

/// Default fraction of pixels a percentile threshold aims to cut off.
pub const DEFAULT_EDGE_RATIO: f64 = 0.2;

/// 256-bin brightness histogram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    bins: [u64; 256],
    total: u64,
}

impl Histogram {
    pub fn new(src: &Grid<u8>) -> Self {
        let mut bins = [0u64; 256];
        for &v in src.data() {
            bins[v as usize] += 1;
        }
        Self {
            bins,
            total: src.data().len() as u64,
        }
    }

    #[inline]
    pub fn count(&self, value: u8) -> u64 {
        self.bins[value as usize]
    }

    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// First bin, scanning from 255 down, at which the cumulative count
    /// exceeds `ratio * total`.
    pub fn upper_cut(&self, ratio: f64) -> Option<u8> {
        self.first_exceeding((0..=255u8).rev(), ratio)
    }

    /// First bin, scanning from 0 up, at which the cumulative count exceeds
    /// `ratio * total`.
    pub fn lower_cut(&self, ratio: f64) -> Option<u8> {
        self.first_exceeding(0..=255u8, ratio)
    }

    fn first_exceeding(&self, order: impl Iterator<Item = u8>, ratio: f64) -> Option<u8> {
        let target = ratio * self.total as f64;
        let mut cumulative = 0u64;
        for b in order {
            cumulative += self.count(b);
            if cumulative as f64 > target {
                return Some(b);
            }
        }
        None
    }
}

/// Accept `0 < ratio <= 1`.
pub fn check_ratio(ratio: f64) -> Result<(), Error> {
    if ratio.is_finite() && ratio > 0.0 && ratio <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidRatio(ratio))
    }
}

/// Mark the brightest pixels as [`EDGE`].
///
/// With `b` the [`Histogram::upper_cut`] for `ratio`, pixels strictly
/// brighter than `b` become [`EDGE`]. When no cut exists (`ratio == 1`)
/// every pixel is marked.
pub fn max_ratio_threshold(src: &Grid<u8>, ratio: f64) -> Result<Grid<u8>, Error> {
    check_ratio(ratio)?;
    let cut = Histogram::new(src).upper_cut(ratio);
    Ok(src.map(|v| match cut {
        Some(b) if v <= b => NON_EDGE,
        _ => EDGE,
    }))
}

/// Mark the darkest pixels as [`EDGE`].
///
/// With `b` the [`Histogram::lower_cut`] for `ratio`, pixels strictly darker
/// than `b` become [`EDGE`]. When no cut exists (`ratio == 1`) every pixel
/// is marked.
pub fn min_ratio_threshold(src: &Grid<u8>, ratio: f64) -> Result<Grid<u8>, Error> {
    check_ratio(ratio)?;
    let cut = Histogram::new(src).lower_cut(ratio);
    Ok(src.map(|v| match cut {
        Some(b) if v >= b => NON_EDGE,
        _ => EDGE,
    }))
}
