//! Classical edge maps built on the same grid, gradient and summed-area
//! primitives as the corner detector.
//!
//! Window-based maps are evaluated only where the window fits inside the
//! image; the remaining band keeps a fill value (`0` unless documented
//! otherwise). Maps whose name ends in `_edge` or `_sketch` are min-max
//! normalized to bytes and panic on inputs that yield a constant map.
use crate::gradient::sobel_xy;
use crate::grid::{Grid, Window};
use crate::integral::SummedAreaTable;
use crate::normalize::normalize_to_u8;
use crate::threshold::{EDGE, NON_EDGE};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Evaluate `f` at every center whose window fits, leaving `fill` elsewhere.
fn map_interior<T, F>(width: usize, height: usize, window: Window, fill: T, f: F) -> Grid<T>
where
    T: Copy + Send + Sync,
    F: Fn(usize, usize) -> T + Sync,
{
    let mut out = Grid::new_fill(width, height, fill);
    let Some((xs, ys)) = window.interior(width, height) else {
        return out;
    };

    let fill_row = |y: usize, row: &mut [T]| {
        if !ys.contains(&y) {
            return;
        }
        for x in xs.clone() {
            row[x] = f(x, y);
        }
    };

    #[cfg(feature = "rayon")]
    {
        out.data_mut()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| fill_row(y, row));
    }
    #[cfg(not(feature = "rayon"))]
    {
        out.data_mut()
            .chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| fill_row(y, row));
    }

    out
}

/// Samples of the window centered at `(cx, cy)`, row by row.
fn window_samples<'a>(
    img: &'a Grid<u8>,
    cx: usize,
    cy: usize,
    window: Window,
) -> impl Iterator<Item = u8> + 'a {
    let (rx, ry) = (window.radius_x(), window.radius_y());
    (cy - ry..=cy + ry).flat_map(move |y| img.row(y)[cx - rx..=cx + rx].iter().copied())
}

/// Largest sample in the window centered at `(x, y)`.
///
/// # Panics
/// If the window does not fit inside the image.
pub fn window_max(img: &Grid<u8>, x: usize, y: usize, window: Window) -> u8 {
    assert!(window.fits(x, y, img.width(), img.height()), "window leaves the image at ({x}, {y})");
    window_samples(img, x, y, window).max().unwrap_or(0)
}

/// Smallest sample in the window centered at `(x, y)`.
///
/// # Panics
/// If the window does not fit inside the image.
pub fn window_min(img: &Grid<u8>, x: usize, y: usize, window: Window) -> u8 {
    assert!(window.fits(x, y, img.width(), img.height()), "window leaves the image at ({x}, {y})");
    window_samples(img, x, y, window).min().unwrap_or(0)
}

/// L1 gradient magnitude `|gx| + |gy|`; zero on the one-pixel frame.
pub fn sobel_magnitude(img: &Grid<u8>) -> Grid<i32> {
    let (gx, gy) = sobel_xy(img);
    gx.zip_map(&gy, |a, b| a.abs() + b.abs())
}

/// [`sobel_magnitude`] normalized to bytes.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img), fields(w = img.width(), h = img.height()))
)]
pub fn sobel_edge(img: &Grid<u8>) -> Grid<u8> {
    normalize_to_u8(&sobel_magnitude(img))
}

/// Dilation residue `window_max - center` of every interior pixel.
pub fn dilation_residue(img: &Grid<u8>, window: Window) -> Grid<i32> {
    map_interior(img.width(), img.height(), window, 0i32, |x, y| {
        i32::from(window_max(img, x, y, window)) - i32::from(img.at(x, y))
    })
}

/// Erosion residue `center - window_min` of every interior pixel.
pub fn erosion_residue(img: &Grid<u8>, window: Window) -> Grid<i32> {
    map_interior(img.width(), img.height(), window, 0i32, |x, y| {
        i32::from(img.at(x, y)) - i32::from(window_min(img, x, y, window))
    })
}

/// [`dilation_residue`] normalized to bytes.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img), fields(w = img.width(), h = img.height()))
)]
pub fn dilation_edge(img: &Grid<u8>, window: Window) -> Grid<u8> {
    normalize_to_u8(&dilation_residue(img, window))
}

/// [`erosion_residue`] normalized to bytes.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img), fields(w = img.width(), h = img.height()))
)]
pub fn erosion_edge(img: &Grid<u8>, window: Window) -> Grid<u8> {
    normalize_to_u8(&erosion_residue(img, window))
}

/// Morphological Laplacian `max + min - 2 * center`; `0` outside the
/// interior.
pub fn unbias_laplacian(img: &Grid<u8>, window: Window) -> Grid<i32> {
    map_interior(img.width(), img.height(), window, 0i32, |x, y| {
        i32::from(window_max(img, x, y, window)) + i32::from(window_min(img, x, y, window))
            - 2 * i32::from(img.at(x, y))
    })
}

/// Zero crossings of a Laplacian field, marked [`EDGE`] on a
/// [`NON_EDGE`] background.
///
/// A pixel crosses along an axis when it changes sign with its successor,
/// or when it is zero and its two neighbors have opposite signs. The outer
/// one-pixel frame is never marked.
pub fn zero_crossings(lap: &Grid<i32>) -> Grid<u8> {
    let (w, h) = lap.dimensions();
    let mut out = Grid::new_fill(w, h, NON_EDGE);
    if w < 3 || h < 3 {
        return out;
    }

    let crosses = |prev: i32, cur: i32, next: i32| {
        i64::from(cur) * i64::from(next) < 0 || (cur == 0 && i64::from(prev) * i64::from(next) < 0)
    };

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let c = lap.at(x, y);
            if crosses(lap.at(x - 1, y), c, lap.at(x + 1, y))
                || crosses(lap.at(x, y - 1), c, lap.at(x, y + 1))
            {
                out.set(x, y, EDGE);
            }
        }
    }
    out
}

/// Zero crossings of [`unbias_laplacian`].
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img), fields(w = img.width(), h = img.height()))
)]
pub fn unbias_edge(img: &Grid<u8>, window: Window) -> Grid<u8> {
    zero_crossings(&unbias_laplacian(img, window))
}

/// Sample variance (divisor `n - 1`) of every interior window, from
/// summed-area tables of the values and their squares.
///
/// # Panics
/// If the window covers a single pixel.
pub fn local_variance(img: &Grid<u8>, window: Window) -> Grid<f64> {
    let n = window.area() as i64;
    assert!(n > 1, "sample variance needs a window of at least two pixels");

    let sums = SummedAreaTable::new(img);
    let squares = SummedAreaTable::new(&img.map(|v| u32::from(v) * u32::from(v)));

    map_interior(img.width(), img.height(), window, 0.0f64, |x, y| {
        sample_variance(n, sums.window_sum(x, y, window), squares.window_sum(x, y, window))
    })
}

/// Unbiased variance of `n` samples from their sum and sum of squares.
/// `n * sum_sq` outgrows `i64` for very large windows, so the numerator is
/// formed in `i128`.
#[inline]
fn sample_variance(n: i64, sum: i64, sum_sq: i64) -> f64 {
    let (n, sum, sum_sq) = (i128::from(n), i128::from(sum), i128::from(sum_sq));
    (n * sum_sq - sum * sum) as f64 / (n * (n - 1)) as f64
}

/// High-variance zero crossings.
///
/// Pixels whose [`local_variance`] is at least the mean variance of the
/// interior and which lie on a zero crossing of [`unbias_laplacian`] are
/// marked [`EDGE`]; everything else is [`NON_EDGE`].
///
/// # Panics
/// If the window covers a single pixel.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img), fields(w = img.width(), h = img.height()))
)]
pub fn local_variance_threshold(img: &Grid<u8>, window: Window) -> Grid<u8> {
    let (w, h) = img.dimensions();
    let variance = local_variance(img, window);
    let crossings = unbias_edge(img, window);

    let mut out = Grid::new_fill(w, h, NON_EDGE);
    let Some((xs, ys)) = window.interior(w, h) else {
        return out;
    };

    let count = (xs.len() * ys.len()) as f64;
    let mut total = 0.0;
    for y in ys.clone() {
        total += variance.row(y)[xs.clone()].iter().sum::<f64>();
    }
    let mean = total / count;

    for y in ys {
        for x in xs.clone() {
            if variance.at(x, y) >= mean && crossings.at(x, y) == EDGE {
                out.set(x, y, EDGE);
            }
        }
    }
    out
}

/// Shannon entropy (bits) of every interior window, treating the samples
/// as an unnormalized distribution `p = v / sum(v)`. Empty terms contribute
/// nothing and an all-zero window has entropy `0`.
pub fn local_entropy(img: &Grid<u8>, window: Window) -> Grid<f64> {
    map_interior(img.width(), img.height(), window, 0.0f64, |x, y| {
        let total: u32 = window_samples(img, x, y, window).map(u32::from).sum();
        if total == 0 {
            return 0.0;
        }
        let total = f64::from(total);
        -window_samples(img, x, y, window)
            .filter(|&v| v > 0)
            .map(|v| {
                let p = f64::from(v) / total;
                p * p.log2()
            })
            .sum::<f64>()
    })
}

/// [`local_entropy`] normalized to bytes.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img), fields(w = img.width(), h = img.height()))
)]
pub fn entropy_sketch(img: &Grid<u8>, window: Window) -> Grid<u8> {
    normalize_to_u8(&local_entropy(img, window))
}

/// Difference of probability `(max - center) / mean` of every interior
/// window; a zero mean yields `0`.
pub fn difference_of_probability(img: &Grid<u8>, window: Window) -> Grid<f64> {
    let sums = SummedAreaTable::new(img);
    map_interior(img.width(), img.height(), window, 0.0f64, |x, y| {
        let mean = sums.window_mean(x, y, window);
        if mean == 0.0 {
            return 0.0;
        }
        f64::from(window_max(img, x, y, window) - img.at(x, y)) / mean
    })
}

/// [`difference_of_probability`] normalized to bytes.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img), fields(w = img.width(), h = img.height()))
)]
pub fn dp_edge(img: &Grid<u8>, window: Window) -> Grid<u8> {
    normalize_to_u8(&difference_of_probability(img, window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn win3() -> Window {
        Window::square(3).expect("odd window")
    }

    /// 9x9 zeros with a single bright sample in the middle.
    fn dot() -> Grid<u8> {
        let mut img = Grid::new_fill(9, 9, 0u8);
        img.set(4, 4, 100);
        img
    }

    fn marked(g: &Grid<u8>, value: u8) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for y in 0..g.height() {
            for x in 0..g.width() {
                if g.at(x, y) == value {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn window_extrema() {
        let img = dot();
        assert_eq!(window_max(&img, 3, 3, win3()), 100);
        assert_eq!(window_max(&img, 2, 2, win3()), 0);
        assert_eq!(window_min(&img, 4, 4, win3()), 0);
    }

    #[test]
    fn sobel_edge_peaks_on_the_step() {
        let mut img = Grid::new_fill(8, 8, 10u8);
        for y in 0..8 {
            for x in 4..8 {
                img.set(x, y, 200);
            }
        }
        let out = sobel_edge(&img);
        assert_eq!(out.at(3, 4), 255);
        assert_eq!(out.at(4, 4), 255);
        assert_eq!(out.at(1, 4), 0);
        assert_eq!(out.at(0, 0), 0);
    }

    #[test]
    fn dilation_lights_the_ring_around_a_dot() {
        let out = dilation_edge(&dot(), win3());
        let ring: Vec<_> = marked(&out, 255);
        assert_eq!(ring.len(), 8);
        assert!(ring.iter().all(|&(x, y)| x.abs_diff(4) <= 1 && y.abs_diff(4) <= 1));
        assert_eq!(out.at(4, 4), 0);
    }

    #[test]
    fn erosion_lights_the_dot_itself() {
        let out = erosion_edge(&dot(), win3());
        assert_eq!(marked(&out, 255), vec![(4, 4)]);
        assert_eq!(marked(&out, 0).len(), 80);
    }

    #[test]
    fn laplacian_of_a_dot() {
        let lap = unbias_laplacian(&dot(), win3());
        assert_eq!(lap.at(4, 4), -100);
        assert_eq!(lap.at(3, 5), 100);
        assert_eq!(lap.at(2, 4), 0);
        assert_eq!(lap.at(0, 4), 0);
    }

    #[test]
    fn zero_crossings_of_a_dot() {
        let out = unbias_edge(&dot(), win3());
        assert_eq!(marked(&out, EDGE), vec![(4, 3), (3, 4), (4, 4)]);
    }

    #[test]
    fn zero_between_opposite_signs_crosses() {
        let lap = Grid::from_vec(3, 3, vec![0, 0, 0, 5, 0, -5, 0, 0, 0]).expect("valid grid");
        let out = zero_crossings(&lap);
        assert_eq!(marked(&out, EDGE), vec![(1, 1)]);
    }

    #[test]
    fn variance_of_a_known_window() {
        let img = Grid::from_vec(3, 3, (0..9).collect()).expect("valid grid");
        let var = local_variance(&img, win3());
        assert_relative_eq!(var.at(1, 1), 7.5);
        assert_eq!(var.at(0, 0), 0.0);
    }

    #[test]
    fn variance_of_huge_saturated_windows() {
        let n = 20_000_000i64;
        assert_eq!(sample_variance(n, 255 * n, 65_025 * n), 0.0);

        let half = n / 2;
        let expected = 65_025.0 * n as f64 / (4.0 * (n - 1) as f64);
        assert_relative_eq!(
            sample_variance(n, 255 * half, 65_025 * half),
            expected,
            max_relative = 1e-12
        );
    }

    #[test]
    fn uniform_image_has_zero_variance() {
        let var = local_variance(&Grid::new_fill(7, 7, 42u8), win3());
        assert!(var.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    #[should_panic(expected = "at least two pixels")]
    fn single_pixel_variance_window_panics() {
        let _ = local_variance(&dot(), Window::square(1).expect("odd window"));
    }

    #[test]
    fn variance_threshold_keeps_high_variance_crossings() {
        let out = local_variance_threshold(&dot(), win3());
        assert_eq!(marked(&out, EDGE), vec![(4, 3), (3, 4), (4, 4)]);
    }

    #[test]
    fn entropy_of_uniform_and_empty_windows() {
        let h = local_entropy(&Grid::new_fill(5, 5, 7u8), win3());
        assert_relative_eq!(h.at(2, 2), 9f64.log2(), epsilon = 1e-12);
        assert_eq!(h.at(0, 2), 0.0);

        let h = local_entropy(&dot(), win3());
        assert_eq!(h.at(4, 4), 0.0);
        assert_eq!(h.at(1, 1), 0.0);
    }

    #[test]
    fn entropy_sketch_keeps_dark_border() {
        let data: Vec<u8> = (0..100).map(|i| 1 + ((i * 53) % 97) as u8).collect();
        let img = Grid::from_vec(10, 10, data).expect("valid grid");
        let out = entropy_sketch(&img, win3());
        for i in 0..10 {
            assert_eq!(out.at(i, 0), 0);
            assert_eq!(out.at(0, i), 0);
            assert_eq!(out.at(i, 9), 0);
            assert_eq!(out.at(9, i), 0);
        }
        assert!(out.data().contains(&255));
    }

    #[test]
    fn difference_of_probability_around_a_dot() {
        let dp = difference_of_probability(&dot(), win3());
        assert_relative_eq!(dp.at(3, 3), 9.0, epsilon = 1e-12);
        assert_eq!(dp.at(4, 4), 0.0);
        assert_eq!(dp.at(1, 1), 0.0);

        let out = dp_edge(&dot(), win3());
        assert_eq!(marked(&out, 255).len(), 8);
    }
}
