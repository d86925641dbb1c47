//! Immutable N-dimensional coordinates.

use crate::error::{Error, Result};
use crate::numeric;
use core::fmt;
use ndarray::{Array1, ArrayView1};

/// A point in N-dimensional space.
///
/// Coordinates are fixed at construction. Two points are equal when they
/// have the same dimensionality and equal coordinates (so a point holding
/// `NaN` is never equal to anything).
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    position: Box<[f64]>,
}

impl Point {
    /// Create a point from its coordinates.
    pub fn new(position: Vec<f64>) -> Self {
        Self {
            position: position.into_boxed_slice(),
        }
    }

    /// Number of coordinates.
    pub fn dimensions(&self) -> usize {
        self.position.len()
    }

    /// Coordinate `i`, if it exists.
    pub fn get(&self, i: usize) -> Option<f64> {
        self.position.get(i).copied()
    }

    /// All coordinates.
    pub fn as_slice(&self) -> &[f64] {
        &self.position
    }

    /// Coordinates as an `ndarray` view, for the distribution and mixture APIs.
    pub fn view(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(&self.position[..])
    }

    /// Squared Euclidean distance to `other`.
    pub fn squared_distance(&self, other: &Point) -> Result<f64> {
        self.check_dims(other)?;
        Ok(numeric::squared_distance(&self.view(), &other.view()))
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> Result<f64> {
        self.squared_distance(other).map(f64::sqrt)
    }

    /// Squared distance treating `NaN` coordinates on either side as missing.
    ///
    /// See [`numeric::squared_distance_missing`].
    pub fn squared_distance_missing(&self, other: &Point) -> Result<f64> {
        self.check_dims(other)?;
        Ok(numeric::squared_distance_missing(
            &self.view(),
            &other.view(),
        ))
    }

    fn check_dims(&self, other: &Point) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                found: other.dimensions(),
            });
        }
        Ok(())
    }
}

impl From<Vec<f64>> for Point {
    fn from(position: Vec<f64>) -> Self {
        Self::new(position)
    }
}

impl From<Array1<f64>> for Point {
    fn from(position: Array1<f64>) -> Self {
        Self::new(position.to_vec())
    }
}

impl AsRef<[f64]> for Point {
    fn as_ref(&self) -> &[f64] {
        self.as_slice()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, v) in self.position.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_requires_same_dimensions() {
        let a = Point::new(vec![1.0, 2.0]);
        let b = Point::from(vec![1.0, 2.0]);
        let c = Point::new(vec![1.0, 2.0, 0.0]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(Point::new(vec![f64::NAN]), Point::new(vec![f64::NAN]));
    }

    #[test]
    fn distances() {
        let a = Point::new(vec![0.0, 0.0]);
        let b = Point::new(vec![3.0, 4.0]);
        assert_eq!(a.squared_distance(&b).unwrap(), 25.0);
        assert_eq!(a.distance(&b).unwrap(), 5.0);
        assert!(matches!(
            a.distance(&Point::new(vec![1.0])),
            Err(Error::DimensionMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn missing_coordinates_are_skipped() {
        let a = Point::new(vec![0.0, f64::NAN]);
        let b = Point::new(vec![2.0, 7.0]);
        assert_eq!(a.squared_distance_missing(&b).unwrap(), 8.0);
    }

    #[test]
    fn display_and_accessors() {
        let p = Point::new(vec![1.5, -2.0]);
        assert_eq!(p.to_string(), "(1.5, -2)");
        assert_eq!(p.dimensions(), 2);
        assert_eq!(p.get(1), Some(-2.0));
        assert_eq!(p.get(2), None);
        assert_eq!(p.view().len(), 2);
    }
}
