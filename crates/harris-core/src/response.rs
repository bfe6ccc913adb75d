//! Dense structure-tensor response for 8-bit grayscale grids.
use crate::grid::Grid;
use crate::tensor::StructureTensor;
use crate::{HarrisParams, ResponseMap};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Compute the dense response `Sxx·Syy − Sxy² − λ·(Sxx + Syy)²`.
///
/// Only pixels whose window fits entirely inside the image are evaluated;
/// the rest stay at `0.0`. Rows are processed in parallel with the `rayon`
/// feature.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img, params), fields(w = img.width(), h = img.height()))
)]
pub fn harris_response_u8(img: &Grid<u8>, params: &HarrisParams) -> ResponseMap {
    let tensor = StructureTensor::from_image(img);
    harris_response_from_tensor(&tensor, params)
}

/// Evaluate the response on a prebuilt tensor, e.g. to sweep `λ` without
/// recomputing gradients and tables.
pub fn harris_response_from_tensor(tensor: &StructureTensor, params: &HarrisParams) -> ResponseMap {
    let w = tensor.width();
    let h = tensor.height();
    let mut data = Grid::new_fill(w, h, 0.0f64);

    let window = params.window();
    let lambda = params.lambda();
    let Some((xs, ys)) = window.interior(w, h) else {
        return data;
    };

    let compute_row = |y: usize, row: &mut [f64]| {
        if !ys.contains(&y) {
            return;
        }
        for x in xs.clone() {
            row[x] = tensor.mean_at(x, y, window).response(lambda);
        }
    };

    #[cfg(feature = "rayon")]
    {
        data.data_mut()
            .par_chunks_mut(w)
            .enumerate()
            .for_each(|(y, row)| compute_row(y, row));
    }
    #[cfg(not(feature = "rayon"))]
    {
        data.data_mut()
            .chunks_mut(w)
            .enumerate()
            .for_each(|(y, row)| compute_row(y, row));
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Window;
    use approx::assert_relative_eq;

    fn quadrant(size: usize, at: usize, lo: u8, hi: u8) -> Grid<u8> {
        let mut img = Grid::new_fill(size, size, lo);
        for y in at..size {
            for x in at..size {
                img.set(x, y, hi);
            }
        }
        img
    }

    #[test]
    fn uniform_image_has_zero_response() {
        let img = Grid::new_fill(20, 20, 77u8);
        let resp = harris_response_u8(&img, &HarrisParams::default());
        assert!(resp.data().iter().all(|&r| r == 0.0));
    }

    #[test]
    fn quadrant_vertex_value() {
        // With a = 200 the 5x5 window at the vertex collects
        // sum(Ixx) = sum(Iyy) = 84 a^2 and sum(Ixy) = 16 a^2.
        let img = quadrant(40, 20, 0, 200);
        let resp = harris_response_u8(&img, &HarrisParams::default());

        let a2 = 200.0f64 * 200.0;
        let sxx = 84.0 * a2 / 25.0;
        let sxy = 16.0 * a2 / 25.0;
        let expected = sxx * sxx - sxy * sxy - 0.05 * (2.0 * sxx) * (2.0 * sxx);
        assert_relative_eq!(resp.at(20, 20), expected, max_relative = 1e-12);
    }

    #[test]
    fn straight_edge_is_negative() {
        let mut img = Grid::new_fill(30, 30, 40u8);
        for y in 0..30 {
            for x in 15..30 {
                img.set(x, y, 220);
            }
        }
        let resp = harris_response_u8(&img, &HarrisParams::default());
        assert!(resp.at(15, 15) < 0.0);
        assert!(resp.at(14, 10) < 0.0);
        assert_eq!(resp.at(5, 15), 0.0);
    }

    #[test]
    fn outside_interior_is_zero() {
        let img = quadrant(24, 12, 10, 240);
        let win = Window::square(7).expect("odd window");
        let params = HarrisParams::default().with_window(win);
        let resp = harris_response_u8(&img, &params);
        for y in 0..24 {
            for x in 0..24 {
                if !win.fits(x, y, 24, 24) {
                    assert_eq!(resp.at(x, y), 0.0, "({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn window_larger_than_image_yields_zero_map() {
        let img = quadrant(6, 3, 0, 255);
        let params = HarrisParams::default().with_window(Window::square(7).expect("odd window"));
        let resp = harris_response_u8(&img, &params);
        assert_eq!(resp.dimensions(), (6, 6));
        assert!(resp.data().iter().all(|&r| r == 0.0));
    }
}
