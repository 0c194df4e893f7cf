//! Image type and index-grid helpers.

pub mod image;
pub mod grid;

pub use image::Image;
pub use grid::index_grid;
