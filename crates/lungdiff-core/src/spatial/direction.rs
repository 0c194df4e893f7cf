//! Direction (orientation) matrix type.
//!
//! The direction matrix maps index-axis unit vectors to physical-space
//! axis vectors. For axis-aligned acquisitions this is the identity.

use nalgebra::SMatrix;
use super::Vector;

/// Orientation matrix of an image's axes.
///
/// Columns are the physical-space directions of the image axes. Must be
/// invertible; orthonormal for any physically meaningful acquisition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction<const D: usize>(pub SMatrix<f64, D, D>);

impl<const D: usize> Direction<D> {
    /// Identity orientation (axis-aligned).
    pub fn identity() -> Self {
        Self(SMatrix::identity())
    }

    /// Create from a row-major array of rows.
    pub fn new(rows: [[f64; D]; D]) -> Self {
        let mut m = SMatrix::<f64, D, D>::zeros();
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                m[(r, c)] = *v;
            }
        }
        Self(m)
    }

    /// Inverse orientation, if the matrix is invertible.
    pub fn try_inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }

    /// Whether this is (numerically) the identity.
    pub fn is_identity(&self) -> bool {
        let id = SMatrix::<f64, D, D>::identity();
        (self.0 - id).norm() < 1e-12
    }

    /// Get the inner nalgebra matrix.
    pub fn inner(&self) -> &SMatrix<f64, D, D> {
        &self.0
    }
}

impl<const D: usize> std::ops::Index<(usize, usize)> for Direction<D> {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::Mul<Vector<D>> for Direction<D> {
    type Output = Vector<D>;

    fn mul(self, v: Vector<D>) -> Self::Output {
        Vector(self.0 * v.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Direction3 = Direction<3>;
    type Vector3 = Vector<3>;

    #[test]
    fn test_identity() {
        let d = Direction3::identity();
        assert!(d.is_identity());
        let v = Vector3::new([1.0, 2.0, 3.0]);
        assert_eq!(d * v, v);
    }

    #[test]
    fn test_inverse() {
        let d = Direction3::new([
            [0.0, -1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
        ]);
        let inv = d.try_inverse().unwrap();
        let v = Vector3::new([1.0, 2.0, 3.0]);
        let roundtrip = inv * (d * v);
        assert!((roundtrip - v).norm() < 1e-12);
    }
}
