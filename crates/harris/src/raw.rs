//! Headerless 8-bit grayscale files: `width * height` bytes, row-major.

use anyhow::{bail, Context, Result};
use harris_core::Grid;
use std::{fs, path::Path};

/// Read a raw buffer of exactly `width * height` bytes.
pub fn read_raw(path: &Path, width: usize, height: usize) -> Result<Grid<u8>> {
    let data = fs::read(path).with_context(|| format!("reading raw image {}", path.display()))?;
    let expected = width
        .checked_mul(height)
        .with_context(|| format!("raw dimensions {width}x{height} overflow"))?;
    if data.len() != expected {
        bail!(
            "{} holds {} bytes, expected {width}x{height} = {expected}",
            path.display(),
            data.len()
        );
    }
    let grid = Grid::from_vec(width, height, data)
        .with_context(|| format!("raw image {}", path.display()))?;
    Ok(grid)
}

pub fn write_raw(path: &Path, grid: &Grid<u8>) -> Result<()> {
    fs::write(path, grid.data())
        .with_context(|| format!("writing raw image {}", path.display()))?;
    Ok(())
}
