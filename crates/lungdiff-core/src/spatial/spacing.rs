//! Spacing type for the physical distance between adjacent voxels.

use super::Vector;

/// Spacing between adjacent voxels along each axis, in physical units.
///
/// Type alias to [`Vector`] for semantic clarity. Components must be
/// strictly positive wherever they are used to divide.
pub type Spacing<const D: usize> = Vector<D>;

impl<const D: usize> Spacing<D> {
    /// Create uniform spacing (same value for all dimensions).
    pub fn uniform(value: f64) -> Self {
        let mut spacing = Vector::zeros();
        for i in 0..D {
            spacing[i] = value;
        }
        spacing
    }

    /// Check that every component is strictly positive.
    pub fn is_valid(&self) -> bool {
        (0..D).all(|i| self[i] > 0.0 && self[i].is_finite())
    }

    /// Get the minimum spacing value.
    pub fn min_spacing(&self) -> f64 {
        (0..D).map(|i| self[i]).fold(f64::INFINITY, |a, b| a.min(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Spacing3 = Spacing<3>;

    #[test]
    fn test_spacing_uniform() {
        let s = Spacing3::uniform(1.5);
        assert_eq!(s, Spacing3::new([1.5, 1.5, 1.5]));
    }

    #[test]
    fn test_spacing_validity() {
        assert!(Spacing3::new([1.0, 2.0, 3.0]).is_valid());
        assert!(!Spacing3::new([1.0, 0.0, 3.0]).is_valid());
        assert!(!Spacing3::new([1.0, -2.0, 3.0]).is_valid());
    }

    #[test]
    fn test_spacing_min() {
        let s = Spacing3::new([1.0, 2.0, 0.5]);
        assert_eq!(s.min_spacing(), 0.5);
    }
}
