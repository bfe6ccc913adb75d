//! Signed Sobel derivatives of 8-bit grids.
//!
//! Only pixels with a full 3x3 neighborhood are evaluated
//! (`1 <= x < w - 1`, `1 <= y < h - 1`); the one-pixel frame is zero.
//! Values are unnormalized, so an 8-bit input yields magnitudes in
//! `[-1020, 1020]`.
use crate::grid::Grid;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Derivative axis of a Sobel pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// d/dx, positive where intensity grows to the right.
    Horizontal,
    /// d/dy, positive where intensity grows downward.
    Vertical,
}

impl Direction {
    /// 3x3 kernel, top row first.
    pub const fn kernel(self) -> [[i32; 3]; 3] {
        match self {
            Direction::Horizontal => [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]],
            Direction::Vertical => [[-1, -2, -1], [0, 0, 0], [1, 2, 1]],
        }
    }
}

/// Sobel response at a single interior pixel.
///
/// # Panics
/// If `(x, y)` lies on the one-pixel frame or outside the grid.
pub fn sobel_at(img: &Grid<u8>, x: usize, y: usize, direction: Direction) -> i32 {
    let (w, h) = img.dimensions();
    assert!(
        x >= 1 && y >= 1 && x + 1 < w && y + 1 < h,
        "sobel center ({x}, {y}) needs a full 3x3 neighborhood in a {w}x{h} grid"
    );
    kernel_sum(img.data(), w, x, y, &direction.kernel())
}

/// Dense Sobel field of `img` along `direction`, zero on the frame.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(img), fields(w = img.width(), h = img.height()))
)]
pub fn sobel(img: &Grid<u8>, direction: Direction) -> Grid<i32> {
    let (w, h) = img.dimensions();
    let mut out = Grid::new_fill(w, h, 0i32);
    if w < 3 || h < 3 {
        return out;
    }

    let kernel = direction.kernel();
    let src = img.data();

    #[cfg(feature = "rayon")]
    {
        out.data_mut()
            .par_chunks_mut(w)
            .enumerate()
            .for_each(|(y, row)| {
                if y == 0 || y == h - 1 {
                    return;
                }
                sobel_row(src, w, y, &kernel, row);
            });
    }
    #[cfg(not(feature = "rayon"))]
    {
        for (y, row) in out.data_mut().chunks_mut(w).enumerate() {
            if y == 0 || y == h - 1 {
                continue;
            }
            sobel_row(src, w, y, &kernel, row);
        }
    }

    out
}

/// Both derivative fields; the corner pipeline always needs the pair.
pub fn sobel_xy(img: &Grid<u8>) -> (Grid<i32>, Grid<i32>) {
    (
        sobel(img, Direction::Horizontal),
        sobel(img, Direction::Vertical),
    )
}

fn sobel_row(src: &[u8], w: usize, y: usize, kernel: &[[i32; 3]; 3], row: &mut [i32]) {
    for x in 1..w - 1 {
        row[x] = kernel_sum(src, w, x, y, kernel);
    }
}

#[inline(always)]
fn kernel_sum(src: &[u8], w: usize, x: usize, y: usize, kernel: &[[i32; 3]; 3]) -> i32 {
    let mut acc = 0i32;
    for (ky, krow) in kernel.iter().enumerate() {
        let base = (y + ky - 1) * w + x - 1;
        for (kx, &k) in krow.iter().enumerate() {
            acc += k * src[base + kx] as i32;
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertical_step(w: usize, h: usize, edge_x: usize, lo: u8, hi: u8) -> Grid<u8> {
        let mut img = Grid::new_fill(w, h, lo);
        for y in 0..h {
            for x in edge_x..w {
                img.set(x, y, hi);
            }
        }
        img
    }

    #[test]
    fn constant_image_has_zero_gradient() {
        let img = Grid::new_fill(12, 9, 173u8);
        let (gx, gy) = sobel_xy(&img);
        assert!(gx.data().iter().all(|&v| v == 0));
        assert!(gy.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn step_edge_matches_direct_convolution() {
        // columns 0..2 are 0, columns 2.. are 10
        let img = vertical_step(5, 5, 2, 0, 10);
        let gx = sobel(&img, Direction::Horizontal);

        // (-1 * 0 + 1 * 10) * (1 + 2 + 1)
        assert_eq!(gx.at(1, 2), 40);
        assert_eq!(gx.at(2, 2), 40);
        assert_eq!(gx.at(3, 2), 0);
        assert_eq!(sobel_at(&img, 2, 2, Direction::Horizontal), 40);

        let gy = sobel(&img, Direction::Vertical);
        assert!(gy.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn vertical_derivative_sign_follows_intensity() {
        let mut img = Grid::new_fill(6, 6, 200u8);
        for x in 0..6 {
            for y in 3..6 {
                img.set(x, y, 50);
            }
        }
        let gy = sobel(&img, Direction::Vertical);
        assert_eq!(gy.at(2, 2), -600);
        assert_eq!(gy.at(2, 3), -600);
        assert_eq!(gy.at(2, 1), 0);
    }

    #[test]
    fn frame_is_zero() {
        let mut img = Grid::new_fill(7, 5, 0u8);
        for (i, v) in img.data_mut().iter_mut().enumerate() {
            *v = (i * 37 % 251) as u8;
        }
        let gx = sobel(&img, Direction::Horizontal);
        for x in 0..7 {
            assert_eq!(gx.at(x, 0), 0);
            assert_eq!(gx.at(x, 4), 0);
        }
        for y in 0..5 {
            assert_eq!(gx.at(0, y), 0);
            assert_eq!(gx.at(6, y), 0);
        }
        assert_eq!(gx.at(3, 2), sobel_at(&img, 3, 2, Direction::Horizontal));
    }

    #[test]
    fn tiny_grid_is_all_zero() {
        let img = Grid::from_vec(2, 2, vec![0u8, 255, 255, 0]).expect("valid grid");
        let gx = sobel(&img, Direction::Horizontal);
        assert_eq!(gx.data(), &[0, 0, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "full 3x3 neighborhood")]
    fn sobel_at_rejects_frame_pixels() {
        let img = Grid::new_fill(5, 5, 0u8);
        let _ = sobel_at(&img, 0, 2, Direction::Vertical);
    }
}
