//! Windowed second-moment (structure tensor) fields.
//!
//! Three per-pixel products are formed from the Sobel fields and each is
//! turned into a [`SummedAreaTable`], so the windowed means `Sxx`, `Syy`,
//! `Sxy` at any interior pixel cost twelve table lookups.
//!
//! The cross term is `|gx| * |gy|`, not the signed product `gx * gy` of the
//! textbook formulation. `Sxy` is therefore never negative, and diagonal
//! edges lose the sign cancellation the signed form would give them.
use crate::gradient::sobel_xy;
use crate::grid::{Grid, Window};
use crate::integral::SummedAreaTable;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct StructureTensor {
    pub xx: SummedAreaTable,
    pub yy: SummedAreaTable,
    pub xy: SummedAreaTable,
}

/// Windowed means of the tensor entries at one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TensorMeans {
    pub sxx: f64,
    pub syy: f64,
    pub sxy: f64,
}

impl TensorMeans {
    #[inline]
    pub fn det(&self) -> f64 {
        self.sxx * self.syy - self.sxy * self.sxy
    }

    #[inline]
    pub fn trace(&self) -> f64 {
        self.sxx + self.syy
    }

    /// `det(M) - lambda * trace(M)^2`.
    #[inline]
    pub fn response(&self, lambda: f64) -> f64 {
        let t = self.trace();
        self.det() - lambda * t * t
    }
}

impl StructureTensor {
    /// Builds the three tables from horizontal and vertical Sobel fields.
    ///
    /// # Panics
    /// If the two fields differ in shape.
    pub fn from_gradients(gx: &Grid<i32>, gy: &Grid<i32>) -> Self {
        assert!(
            gx.same_shape(gy),
            "gradient fields differ in shape: {}x{} vs {}x{}",
            gx.width(),
            gx.height(),
            gy.width(),
            gy.height()
        );

        let ixx = gx.map(|g| i64::from(g) * i64::from(g));
        let iyy = gy.map(|g| i64::from(g) * i64::from(g));
        let ixy = gx.zip_map(gy, |a, b| i64::from(a.unsigned_abs()) * i64::from(b.unsigned_abs()));

        Self {
            xx: SummedAreaTable::new(&ixx),
            yy: SummedAreaTable::new(&iyy),
            xy: SummedAreaTable::new(&ixy),
        }
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(img), fields(w = img.width(), h = img.height()))
    )]
    pub fn from_image(img: &Grid<u8>) -> Self {
        let (gx, gy) = sobel_xy(img);
        Self::from_gradients(&gx, &gy)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.xx.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.xx.height()
    }

    /// Windowed means at `(x, y)`.
    ///
    /// # Panics
    /// If the window does not fit entirely inside the grid.
    #[inline]
    pub fn mean_at(&self, x: usize, y: usize, window: Window) -> TensorMeans {
        TensorMeans {
            sxx: self.xx.window_mean(x, y, window),
            syy: self.yy.window_mean(x, y, window),
            sxy: self.xy.window_mean(x, y, window),
        }
    }
}
