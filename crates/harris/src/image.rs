//! Helpers for running the detectors on `image::GrayImage`.

use harris_core::detect::{self, Corner, HarrisResult};
use harris_core::{Error, Grid, HarrisParams, ResponseMap};
use image::{GrayImage, Luma};

/// Copy an `image::GrayImage` into a [`Grid`].
pub fn grid_from_image(img: &GrayImage) -> Result<Grid<u8>, Error> {
    Grid::from_vec(
        img.width() as usize,
        img.height() as usize,
        img.as_raw().clone(),
    )
}

/// Copy a byte [`Grid`] into an `image::GrayImage`.
pub fn image_from_grid(grid: &Grid<u8>) -> GrayImage {
    GrayImage::from_fn(grid.width() as u32, grid.height() as u32, |x, y| {
        Luma([grid.at(x as usize, y as usize)])
    })
}

/// Compute a dense response map for an `image::GrayImage`.
#[inline]
pub fn harris_response_image(img: &GrayImage, params: &HarrisParams) -> Result<ResponseMap, Error> {
    let grid = grid_from_image(img)?;
    Ok(harris_core::response::harris_response_u8(&grid, params))
}

/// Binary corner map (255 = corner, 0 = background) of an `image::GrayImage`.
pub fn corner_map_image(img: &GrayImage, params: &HarrisParams) -> Result<GrayImage, Error> {
    let grid = grid_from_image(img)?;
    Ok(image_from_grid(&detect::corner_map_u8(&grid, params)))
}

/// Corner pixels of an `image::GrayImage`, row-major.
#[inline]
pub fn find_corners_image(img: &GrayImage, params: &HarrisParams) -> Result<Vec<Corner>, Error> {
    let grid = grid_from_image(img)?;
    Ok(detect::find_corners_u8(&grid, params))
}

/// Same as [`find_corners_image`], also returning the map and stage timings.
pub fn find_corners_image_trace(
    img: &GrayImage,
    params: &HarrisParams,
) -> Result<HarrisResult, Error> {
    let grid = grid_from_image(img)?;
    Ok(detect::find_corners_u8_with_trace(&grid, params))
}
