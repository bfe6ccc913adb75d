//! Corner classification on top of the dense response map.
use crate::grid::Grid;
use crate::response::harris_response_u8;
use crate::{HarrisParams, ResponseMap, BACKGROUND, CORNER};
use std::time::Instant;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A pixel whose response exceeded the threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Corner {
    pub x: usize,
    pub y: usize,
    /// Raw response at this pixel.
    pub response: f64,
}

/// Timed detection outcome containing the binary map and profiling data.
#[derive(Clone, Debug)]
pub struct HarrisResult {
    /// [`CORNER`] at classified pixels, [`BACKGROUND`] elsewhere.
    pub map: Grid<u8>,
    /// Classified pixels in row-major order.
    pub corners: Vec<Corner>,
    /// Time spent computing the dense response (milliseconds).
    pub resp_ms: f64,
    /// Time spent on classification (milliseconds).
    pub detect_ms: f64,
}

/// Binary corner map of an 8-bit grayscale image.
///
/// This is a convenience that combines:
/// - harris_response_u8 (dense response map)
/// - classification against `params.threshold()`
pub fn corner_map_u8(img: &Grid<u8>, params: &HarrisParams) -> Grid<u8> {
    let resp = harris_response_u8(img, params);
    classify_response(&resp, params)
}

/// Corner pixels of an 8-bit grayscale image, in row-major order.
pub fn find_corners_u8(img: &Grid<u8>, params: &HarrisParams) -> Vec<Corner> {
    let resp = harris_response_u8(img, params);
    detect_corners_from_response(&resp, params)
}

/// Same as [`corner_map_u8`], additionally listing the corners and timing
/// each stage.
pub fn find_corners_u8_with_trace(img: &Grid<u8>, params: &HarrisParams) -> HarrisResult {
    let resp_started = Instant::now();
    let resp = harris_response_u8(img, params);
    let resp_ms = resp_started.elapsed().as_secs_f64() * 1000.0;

    let detect_started = Instant::now();
    let map = classify_response(&resp, params);
    let corners = detect_corners_from_response(&resp, params);
    let detect_ms = detect_started.elapsed().as_secs_f64() * 1000.0;

    HarrisResult {
        map,
        corners,
        resp_ms,
        detect_ms,
    }
}

/// Binarize an existing response map.
///
/// The output starts as [`BACKGROUND`]; pixels whose window fits inside the
/// image and whose response is strictly above the threshold become
/// [`CORNER`]. Pixels within the window radius of any edge never do,
/// whatever the threshold.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(resp, params), fields(w = resp.width(), h = resp.height()))
)]
pub fn classify_response(resp: &ResponseMap, params: &HarrisParams) -> Grid<u8> {
    let (w, h) = resp.dimensions();
    let mut out = Grid::new_fill(w, h, BACKGROUND);
    let Some((xs, ys)) = params.window().interior(w, h) else {
        return out;
    };
    let thr = params.threshold();

    let classify_row = |y: usize, row: &mut [u8]| {
        if !ys.contains(&y) {
            return;
        }
        let src = resp.row(y);
        for x in xs.clone() {
            if src[x] > thr {
                row[x] = CORNER;
            }
        }
    };

    #[cfg(feature = "rayon")]
    {
        out.data_mut()
            .par_chunks_mut(w)
            .enumerate()
            .for_each(|(y, row)| classify_row(y, row));
    }
    #[cfg(not(feature = "rayon"))]
    {
        out.data_mut()
            .chunks_mut(w)
            .enumerate()
            .for_each(|(y, row)| classify_row(y, row));
    }

    out
}

/// List the pixels [`classify_response`] would mark.
pub fn detect_corners_from_response(resp: &ResponseMap, params: &HarrisParams) -> Vec<Corner> {
    let (w, h) = resp.dimensions();
    let Some((xs, ys)) = params.window().interior(w, h) else {
        return Vec::new();
    };
    let thr = params.threshold();

    let mut corners = Vec::new();
    for y in ys {
        let row = resp.row(y);
        for x in xs.clone() {
            if row[x] > thr {
                corners.push(Corner {
                    x,
                    y,
                    response: row[x],
                });
            }
        }
    }
    corners
}
