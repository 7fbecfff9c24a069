use crate::{core::utils::SampleFloat, DVector, Float, SwarmError, SwarmResult};
use fastrand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A box-shaped feasible region: one finite `(lower, upper)` interval per dimension.
///
/// [`Bounds`] are validated on construction, so every interval is finite and non-empty.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    lower: DVector<Float>,
    upper: DVector<Float>,
}

impl Bounds {
    /// Construct [`Bounds`] from separate lower and upper vectors.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::DimensionMismatch`] if the vectors differ in length and
    /// [`SwarmError::InvalidOption`] if any limit is non-finite or `lower >= upper`.
    pub fn new<L, H>(lower: L, upper: H) -> SwarmResult<Self>
    where
        L: Into<DVector<Float>>,
        H: Into<DVector<Float>>,
    {
        let lower = lower.into();
        let upper = upper.into();
        if lower.len() != upper.len() {
            return Err(SwarmError::DimensionMismatch {
                what: "bounds",
                expected: lower.len(),
                got: upper.len(),
            });
        }
        for (i, (lb, ub)) in lower.iter().zip(upper.iter()).enumerate() {
            if !lb.is_finite() || !ub.is_finite() {
                return Err(SwarmError::invalid_option(
                    "bounds",
                    format!("bound #{i} ({lb}, {ub}) is not finite"),
                ));
            }
            if lb >= ub {
                return Err(SwarmError::invalid_option(
                    "bounds",
                    format!("bound #{i} has lower ({lb}) >= upper ({ub})"),
                ));
            }
        }
        Ok(Self { lower, upper })
    }

    /// Construct [`Bounds`] from one `(lower, upper)` pair per dimension.
    ///
    /// # Errors
    ///
    /// See [`Bounds::new`].
    pub fn from_pairs<I: IntoIterator<Item = (Float, Float)>>(pairs: I) -> SwarmResult<Self> {
        let (lower, upper): (Vec<Float>, Vec<Float>) = pairs.into_iter().unzip();
        Self::new(DVector::from_vec(lower), DVector::from_vec(upper))
    }

    /// The number of dimensions covered by the bounds.
    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    /// The vector of lower limits.
    pub const fn lower(&self) -> &DVector<Float> {
        &self.lower
    }

    /// The vector of upper limits.
    pub const fn upper(&self) -> &DVector<Float> {
        &self.upper
    }

    /// The `(lower, upper)` limits of dimension `j`.
    pub fn limits(&self, j: usize) -> (Float, Float) {
        (self.lower[j], self.upper[j])
    }

    /// The width `upper - lower` of dimension `j`.
    pub fn width(&self, j: usize) -> Float {
        self.upper[j] - self.lower[j]
    }

    /// Checks whether `value` lies inside the interval of dimension `j` (inclusive).
    pub fn contains(&self, j: usize, value: Float) -> bool {
        value >= self.lower[j] && value <= self.upper[j]
    }

    /// Checks whether every coordinate of `x` lies inside the bounds.
    pub fn contains_point<'a, I: IntoIterator<Item = &'a Float>>(&self, x: I) -> bool {
        x.into_iter().enumerate().all(|(j, v)| self.contains(j, *v))
    }

    /// Returns `0.0` if `value` lies inside dimension `j`, and otherwise the signed distance to
    /// the violated limit (negative below `lower`, positive above `upper`).
    pub fn excess(&self, j: usize, value: Float) -> Float {
        if value < self.lower[j] {
            value - self.lower[j]
        } else if value > self.upper[j] {
            value - self.upper[j]
        } else {
            0.0
        }
    }

    /// Draw a uniform value inside dimension `j`.
    pub fn sample(&self, j: usize, rng: &mut Rng) -> Float {
        rng.range(self.lower[j], self.upper[j])
    }

    /// Checks that the bounds cover exactly `n_dimensions` dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::DimensionMismatch`] otherwise.
    pub fn check_dimension(&self, n_dimensions: usize) -> SwarmResult<()> {
        if self.dimension() != n_dimensions {
            return Err(SwarmError::DimensionMismatch {
                what: "bounds",
                expected: n_dimensions,
                got: self.dimension(),
            });
        }
        Ok(())
    }
}

impl Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pairs = self
            .lower
            .iter()
            .zip(self.upper.iter())
            .map(|(lb, ub)| format!("({lb}, {ub})"))
            .collect::<Vec<_>>();
        write!(f, "[{}]", pairs.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    #[test]
    fn test_bounds_validation() {
        assert!(Bounds::from_pairs([(-1.0, 1.0), (0.0, 5.0)]).is_ok());
        let err = Bounds::new(dvector![0.0, 0.0], dvector![1.0]).unwrap_err();
        assert!(err.is_dimension_error());
        let err = Bounds::from_pairs([(1.0, 1.0)]).unwrap_err();
        assert!(err.is_config_error());
        let err = Bounds::from_pairs([(Float::NEG_INFINITY, 1.0)]).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_bounds_contains_and_excess() {
        let b = Bounds::from_pairs([(-1.0, 1.0), (0.0, 5.0)]).unwrap();
        assert!(b.contains(0, 1.0));
        assert!(!b.contains(1, -0.5));
        assert_eq!(b.excess(0, 3.0), 2.0);
        assert_eq!(b.excess(1, -0.5), -0.5);
        assert_eq!(b.excess(1, 2.0), 0.0);
        assert!(b.contains_point(&[0.0, 4.0]));
        assert!(!b.contains_point(&[0.0, 6.0]));
        assert_eq!(b.width(1), 5.0);
    }

    #[test]
    fn test_bounds_sample_is_inside() {
        let mut rng = Rng::with_seed(0);
        let b = Bounds::from_pairs([(-1.0, 1.0), (10.0, 20.0)]).unwrap();
        for _ in 0..1000 {
            let x = [b.sample(0, &mut rng), b.sample(1, &mut rng)];
            assert!(b.contains_point(&x));
        }
    }

    #[test]
    fn test_bounds_check_dimension() {
        let b = Bounds::from_pairs([(-1.0, 1.0)]).unwrap();
        assert!(b.check_dimension(1).is_ok());
        assert!(b.check_dimension(3).unwrap_err().is_dimension_error());
        assert_eq!(b.to_string(), "[(-1, 1)]");
    }
}
