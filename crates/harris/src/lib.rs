//! `image`-crate and file front end for [`harris_core`].
//!
//! [`harris_core`] works on plain [`Grid`]s; this crate converts to and from
//! `image::GrayImage`, reads and writes headerless raw buffers and hosts the
//! application layer shared by the command-line tool.

pub use harris_core::*;

pub mod app;
pub mod image;
pub mod raw;

pub use crate::image::{
    corner_map_image, find_corners_image, find_corners_image_trace, grid_from_image,
    harris_response_image, image_from_grid,
};
pub use crate::raw::{read_raw, write_raw};
