//! Min-max rescaling of numeric grids to the full byte range.
use crate::grid::Grid;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Smallest and largest sample of a grid.
pub fn min_max<T: Copy + Into<f64>>(src: &Grid<T>) -> (f64, f64) {
    src.data()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            let v = v.into();
            (lo.min(v), hi.max(v))
        })
}

/// Linearly map `[min, max]` of `src` onto `[0, 255]`, rounding to the
/// nearest byte. The minimum maps to exactly 0 and the maximum to 255.
///
/// # Panics
/// If every sample is equal, since the mapping is undefined.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(src), fields(w = src.width(), h = src.height()))
)]
pub fn normalize_to_u8<T: Copy + Into<f64>>(src: &Grid<T>) -> Grid<u8> {
    let (lo, hi) = min_max(src);
    assert!(hi > lo, "cannot normalize a constant grid (all samples = {lo})");

    let scale = 255.0 / (hi - lo);
    src.map(|v| ((v.into() - lo) * scale).round().clamp(0.0, 255.0) as u8)
}
