//! Row-major sample grids and odd-sized neighborhoods.
//!
//! A [`Grid`] owns exactly `width * height` samples addressed as
//! `index = y * width + x`. Both dimensions are positive. A [`Window`] is a
//! centered neighborhood with odd positive extents, so it always has a
//! well-defined center pixel and integer radii.

use core::ops::Range;

use crate::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Grid<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyGrid { width, height });
        }

        let expected = width.checked_mul(height).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;

        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.width;
        &mut self.data[start..start + self.width]
    }

    pub fn rows(&self) -> core::slice::ChunksExact<'_, T> {
        self.data.chunks_exact(self.width)
    }

    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }
}

impl<T: Clone> Grid<T> {
    /// Allocates a grid with every sample set to `value`.
    ///
    /// # Panics
    /// If either dimension is zero.
    pub fn new_fill(width: usize, height: usize, value: T) -> Self {
        assert!(
            width > 0 && height > 0,
            "grid dimensions must be positive, got {width}x{height}"
        );
        let len = width.checked_mul(height).expect("grid size overflow");
        Self {
            width,
            height,
            data: vec![value; len],
        }
    }
}

impl<T: Copy> Grid<T> {
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> T {
        assert!(
            x < self.width && y < self.height,
            "({x}, {y}) outside {}x{} grid",
            self.width,
            self.height
        );
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        assert!(
            x < self.width && y < self.height,
            "({x}, {y}) outside {}x{} grid",
            self.width,
            self.height
        );
        self.data[y * self.width + x] = value;
    }

    pub fn map<U>(&self, f: impl FnMut(T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.iter().copied().map(f).collect(),
        }
    }

    /// Combines two grids of equal shape sample by sample.
    ///
    /// # Panics
    /// If the shapes differ.
    pub fn zip_map<U: Copy, V>(&self, other: &Grid<U>, mut f: impl FnMut(T, U) -> V) -> Grid<V> {
        assert!(
            self.same_shape(other),
            "grid shape mismatch: {}x{} vs {}x{}",
            self.width,
            self.height,
            other.width,
            other.height
        );
        Grid {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }
}

/// Centered neighborhood with odd positive extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    width: usize,
    height: usize,
}

impl Window {
    pub fn new(width: usize, height: usize) -> Result<Self, Error> {
        if width == 0 || height == 0 || width % 2 == 0 || height % 2 == 0 {
            return Err(Error::InvalidWindow { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn square(size: usize) -> Result<Self, Error> {
        Self::new(size, size)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn radius_x(&self) -> usize {
        self.width / 2
    }

    #[inline]
    pub fn radius_y(&self) -> usize {
        self.height / 2
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// True when the window centered at `(x, y)` lies inside a
    /// `grid_w` x `grid_h` grid.
    #[inline]
    pub fn fits(&self, x: usize, y: usize, grid_w: usize, grid_h: usize) -> bool {
        x >= self.radius_x()
            && y >= self.radius_y()
            && x + self.radius_x() < grid_w
            && y + self.radius_y() < grid_h
    }

    /// Column and row ranges of every center whose window fits the grid, or
    /// `None` when the grid is smaller than the window.
    pub fn interior(&self, grid_w: usize, grid_h: usize) -> Option<(Range<usize>, Range<usize>)> {
        if grid_w < self.width || grid_h < self.height {
            return None;
        }
        Some((
            self.radius_x()..grid_w - self.radius_x(),
            self.radius_y()..grid_h - self.radius_y(),
        ))
    }
}

impl Default for Window {
    fn default() -> Self {
        Self {
            width: 5,
            height: 5,
        }
    }
}
