//! Summed-area tables and O(1) windowed sums/means.
//!
//! Cell `(x, y)` of the table holds the sum of every source sample with
//! coordinates `<= (x, y)`. Sums are accumulated in `i64`: the largest
//! source the crate feeds in is a squared Sobel magnitude (`1020^2`), so a
//! full 550x550 table stays below `2^39`.
//!
//! Construction runs a left-to-right pass inside each row, then a
//! top-to-bottom pass over the row sums. Rows of the first pass are
//! independent (parallel under the `rayon` feature); the second pass is
//! sequential in `y`.
use crate::grid::{Grid, Window};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct SummedAreaTable {
    table: Grid<i64>,
}

impl SummedAreaTable {
    pub fn new<T: Copy + Into<i64>>(src: &Grid<T>) -> Self {
        let w = src.width();
        let mut table: Grid<i64> = src.map(Into::into);

        #[cfg(feature = "rayon")]
        {
            table.data_mut().par_chunks_mut(w).for_each(prefix_row);
        }
        #[cfg(not(feature = "rayon"))]
        {
            table.data_mut().chunks_mut(w).for_each(prefix_row);
        }

        let h = table.height();
        let data = table.data_mut();
        for y in 1..h {
            let (above, rest) = data.split_at_mut(y * w);
            let prev = &above[(y - 1) * w..];
            for (cell, &up) in rest[..w].iter_mut().zip(prev) {
                *cell += up;
            }
        }

        Self { table }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.table.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.table.height()
    }

    /// Prefix sum over `[0, x] x [0, y]`.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> i64 {
        self.table.at(x, y)
    }

    pub fn table(&self) -> &Grid<i64> {
        &self.table
    }

    /// Sum over the inclusive rectangle `[x0, x1] x [y0, y1]`.
    ///
    /// Strip terms are dropped when the rectangle touches the left or top
    /// edge of the grid.
    ///
    /// # Panics
    /// If the rectangle is empty or leaves the grid.
    pub fn rect_sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> i64 {
        assert!(
            x0 <= x1 && y0 <= y1 && x1 < self.width() && y1 < self.height(),
            "rectangle [{x0}, {x1}] x [{y0}, {y1}] outside {}x{} table",
            self.width(),
            self.height()
        );

        let mut sum = self.at(x1, y1);
        if x0 > 0 {
            sum -= self.at(x0 - 1, y1);
        }
        if y0 > 0 {
            sum -= self.at(x1, y0 - 1);
        }
        if x0 > 0 && y0 > 0 {
            sum += self.at(x0 - 1, y0 - 1);
        }
        sum
    }

    /// Sum of the `window` centered at `(cx, cy)`.
    ///
    /// # Panics
    /// If the window does not fit entirely inside the grid.
    #[inline]
    pub fn window_sum(&self, cx: usize, cy: usize, window: Window) -> i64 {
        assert!(
            window.fits(cx, cy, self.width(), self.height()),
            "{}x{} window centered at ({cx}, {cy}) leaves the {}x{} grid",
            window.width(),
            window.height(),
            self.width(),
            self.height()
        );
        let (rx, ry) = (window.radius_x(), window.radius_y());
        self.rect_sum(cx - rx, cy - ry, cx + rx, cy + ry)
    }

    /// Arithmetic mean of the `window` centered at `(cx, cy)`: the exact
    /// integer sum divided by the window area in floating point.
    ///
    /// # Panics
    /// If the window does not fit entirely inside the grid.
    #[inline]
    pub fn window_mean(&self, cx: usize, cy: usize, window: Window) -> f64 {
        self.window_sum(cx, cy, window) as f64 / window.area() as f64
    }
}

fn prefix_row(row: &mut [i64]) {
    let mut acc = 0i64;
    for v in row.iter_mut() {
        acc += *v;
        *v = acc;
    }
}

#[cfg(test)]
mod tests {
    use super::SummedAreaTable;
    use crate::grid::{Grid, Window};
    use approx::assert_relative_eq;

    fn ramp(w: usize, h: usize) -> Grid<u8> {
        let data = (0..w * h).map(|i| ((i * 7 + 3) % 23) as u8).collect();
        Grid::from_vec(w, h, data).expect("valid grid")
    }

    fn brute_rect(g: &Grid<u8>, x0: usize, y0: usize, x1: usize, y1: usize) -> i64 {
        let mut s = 0i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                s += g.at(x, y) as i64;
            }
        }
        s
    }

    #[test]
    fn prefix_matches_brute_force() {
        let g = ramp(8, 8);
        let sat = SummedAreaTable::new(&g);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(sat.at(x, y), brute_rect(&g, 0, 0, x, y), "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn non_negative_source_is_monotonic() {
        let g = ramp(9, 6);
        let sat = SummedAreaTable::new(&g);
        for y in 0..6 {
            for x in 1..9 {
                assert!(sat.at(x, y) >= sat.at(x - 1, y));
            }
        }
        for y in 1..6 {
            for x in 0..9 {
                assert!(sat.at(x, y) >= sat.at(x, y - 1));
            }
        }
    }

    #[test]
    fn rect_sum_covers_edge_touching_rectangles() {
        let g = ramp(7, 5);
        let sat = SummedAreaTable::new(&g);
        let cases = [
            (0, 0, 6, 4),
            (0, 0, 0, 0),
            (0, 2, 3, 4),
            (2, 0, 5, 1),
            (1, 1, 5, 3),
            (6, 4, 6, 4),
        ];
        for (x0, y0, x1, y1) in cases {
            assert_eq!(
                sat.rect_sum(x0, y0, x1, y1),
                brute_rect(&g, x0, y0, x1, y1),
                "rect ({x0}, {y0})-({x1}, {y1})"
            );
        }
    }

    #[test]
    fn signed_sources_are_supported() {
        let g = Grid::from_vec(3, 2, vec![-5i32, 2, 7, 1, -1, -9]).expect("valid grid");
        let sat = SummedAreaTable::new(&g);
        assert_eq!(sat.at(2, 1), -5);
        assert_eq!(sat.rect_sum(1, 0, 2, 1), -1);
    }

    #[test]
    fn uniform_grid_mean_is_the_constant() {
        let g = Grid::new_fill(11, 9, 37u8);
        let sat = SummedAreaTable::new(&g);
        for size in [1usize, 3, 5, 7, 9] {
            let win = Window::square(size).expect("odd window");
            let (xs, ys) = win.interior(11, 9).expect("window fits");
            for y in ys.clone() {
                for x in xs.clone() {
                    assert_relative_eq!(sat.window_mean(x, y, win), 37.0);
                }
            }
        }
    }

    #[test]
    fn rectangular_window_mean_is_exact() {
        let g = ramp(10, 8);
        let sat = SummedAreaTable::new(&g);
        let win = Window::new(5, 3).expect("odd window");
        let expected = brute_rect(&g, 2, 3, 6, 5) as f64 / 15.0;
        assert_relative_eq!(sat.window_mean(4, 4, win), expected);
    }

    #[test]
    #[should_panic(expected = "leaves the")]
    fn window_touching_outside_panics() {
        let sat = SummedAreaTable::new(&Grid::new_fill(6, 6, 1u8));
        let _ = sat.window_sum(1, 3, Window::square(5).expect("odd window"));
    }
}
