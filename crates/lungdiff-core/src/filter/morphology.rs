//! Binary morphology with a ball structuring element.
//!
//! Dilation and erosion are max/min filters over the ball neighborhood,
//! with replicate borders. On 0/255 masks this matches binary morphology
//! with foreground defined as any positive value.

use burn::tensor::{Tensor, TensorData};
use burn::tensor::backend::Backend;
use crate::image::Image;

/// Voxel offsets of a ball (Euclidean) structuring element.
fn ball_offsets(radius: usize) -> Vec<[isize; 3]> {
    let r = radius as isize;
    let r2 = (radius * radius) as isize;
    let mut offsets = Vec::new();
    for dz in -r..=r {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy + dz * dz <= r2 {
                    offsets.push([dz, dy, dx]);
                }
            }
        }
    }
    offsets
}

fn morphology_pass<B: Backend>(
    image: &Image<B, 3>,
    radius: usize,
    take_max: bool,
) -> Image<B, 3> {
    let [size_z, size_y, size_x] = image.shape();
    let values = image.to_vec();
    let offsets = ball_offsets(radius);

    let clamp = |v: isize, max: usize| v.clamp(0, max as isize - 1) as usize;

    let mut out = vec![0.0f32; values.len()];
    for z in 0..size_z {
        for y in 0..size_y {
            for x in 0..size_x {
                let mut acc = if take_max { f32::NEG_INFINITY } else { f32::INFINITY };
                for [dz, dy, dx] in &offsets {
                    let zi = clamp(z as isize + dz, size_z);
                    let yi = clamp(y as isize + dy, size_y);
                    let xi = clamp(x as isize + dx, size_x);
                    let v = values[zi * size_y * size_x + yi * size_x + xi];
                    acc = if take_max { acc.max(v) } else { acc.min(v) };
                }
                out[z * size_y * size_x + y * size_x + x] = acc;
            }
        }
    }

    let device = image.data().device();
    let data = Tensor::<B, 1>::from_data(
        TensorData::new(out, burn::tensor::Shape::new([values.len()])),
        &device,
    )
    .reshape([size_z, size_y, size_x]);
    image.with_data(data)
}

/// Dilate with a ball structuring element of the given voxel radius.
pub fn dilate<B: Backend>(image: &Image<B, 3>, radius: usize) -> Image<B, 3> {
    morphology_pass(image, radius, true)
}

/// Erode with a ball structuring element of the given voxel radius.
pub fn erode<B: Backend>(image: &Image<B, 3>, radius: usize) -> Image<B, 3> {
    morphology_pass(image, radius, false)
}

/// Morphological closing: dilation followed by erosion. Fills holes and
/// gaps smaller than the ball.
pub fn close<B: Backend>(image: &Image<B, 3>, radius: usize) -> Image<B, 3> {
    erode(&dilate(image, radius), radius)
}

/// Morphological opening: erosion followed by dilation. Removes islands
/// smaller than the ball.
pub fn open<B: Backend>(image: &Image<B, 3>, radius: usize) -> Image<B, 3> {
    dilate(&erode(image, radius), radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use crate::spatial::{Point, Spacing, Direction};

    type TestBackend = NdArray<f32>;

    fn mask_image(values: Vec<f32>, shape: [usize; 3]) -> Image<TestBackend, 3> {
        let device = Default::default();
        Image::from_vec(
            values,
            shape,
            Point::origin(),
            Spacing::uniform(1.0),
            Direction::identity(),
            &device,
        )
    }

    #[test]
    fn test_ball_offsets_radius_one() {
        // 6-connected neighborhood plus center
        let offsets = ball_offsets(1);
        assert_eq!(offsets.len(), 7);
        assert!(offsets.contains(&[0, 0, 0]));
        assert!(offsets.contains(&[1, 0, 0]));
        assert!(!offsets.contains(&[1, 1, 0]));
    }

    #[test]
    fn test_dilate_grows_foreground() {
        let mut values = vec![0.0f32; 5 * 5 * 5];
        values[2 * 25 + 2 * 5 + 2] = 255.0;
        let dilated = dilate(&mask_image(values, [5, 5, 5]), 1);

        let out = dilated.to_vec();
        assert_eq!(out[2 * 25 + 2 * 5 + 2], 255.0);
        assert_eq!(out[2 * 25 + 2 * 5 + 3], 255.0);
        assert_eq!(out[2 * 25 + 3 * 5 + 2], 255.0);
        assert_eq!(out[3 * 25 + 2 * 5 + 2], 255.0);
        // Diagonal is outside the ball
        assert_eq!(out[2 * 25 + 3 * 5 + 3], 0.0);
    }

    #[test]
    fn test_erode_removes_isolated_voxel() {
        let mut values = vec![0.0f32; 5 * 5 * 5];
        values[2 * 25 + 2 * 5 + 2] = 255.0;
        let eroded = erode(&mask_image(values, [5, 5, 5]), 1);
        for v in eroded.to_vec() {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn test_open_removes_small_island() {
        let mut values = vec![0.0f32; 7 * 7 * 7];
        values[3 * 49 + 3 * 7 + 3] = 255.0;
        let opened = open(&mask_image(values, [7, 7, 7]), 1);
        for v in opened.to_vec() {
            assert_eq!(v, 0.0);
        }
    }

    #[test]
    fn test_close_fills_small_hole() {
        // Solid block with a single interior hole
        let mut values = vec![255.0f32; 7 * 7 * 7];
        values[3 * 49 + 3 * 7 + 3] = 0.0;
        let closed = close(&mask_image(values, [7, 7, 7]), 1);
        assert_eq!(closed.to_vec()[3 * 49 + 3 * 7 + 3], 255.0);
    }

    #[test]
    fn test_close_then_open_is_idempotent() {
        // Block with an interior hole and a detached voxel, kept away
        // from the borders so clamping does not interfere
        let mut values = vec![0.0f32; 12 * 12 * 12];
        for z in 4..9 {
            for y in 4..9 {
                for x in 4..9 {
                    values[z * 144 + y * 12 + x] = 255.0;
                }
            }
        }
        values[6 * 144 + 6 * 12 + 6] = 0.0;
        values[2 * 144 + 2 * 12 + 2] = 255.0;
        let image = mask_image(values, [12, 12, 12]);

        let first = open(&close(&image, 1), 1);
        let second = open(&close(&first, 1), 1);

        let once = first.to_vec();
        assert_eq!(once, second.to_vec());
        // The pass filled the hole and dropped the island
        assert_eq!(once[6 * 144 + 6 * 12 + 6], 255.0);
        assert_eq!(once[2 * 144 + 2 * 12 + 2], 0.0);
    }

    #[test]
    fn test_close_preserves_solid_block() {
        let values = vec![255.0f32; 5 * 5 * 5];
        let closed = close(&mask_image(values, [5, 5, 5]), 2);
        for v in closed.to_vec() {
            assert_eq!(v, 255.0);
        }
    }
}
