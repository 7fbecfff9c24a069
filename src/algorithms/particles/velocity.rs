use crate::{core::Bounds, error::SwarmError, DMatrix, Float, SwarmResult};
use serde::{Deserialize, Serialize};

/// Limits applied to every velocity component after the [`VelocityHandler`] has run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum VelocityClamp {
    /// The same `(min, max)` for every dimension
    Scalar(Float, Float),
    /// One `(min, max)` pair per dimension
    PerDimension(Vec<(Float, Float)>),
}
impl From<(Float, Float)> for VelocityClamp {
    fn from((min, max): (Float, Float)) -> Self {
        Self::Scalar(min, max)
    }
}
impl From<Vec<(Float, Float)>> for VelocityClamp {
    fn from(value: Vec<(Float, Float)>) -> Self {
        Self::PerDimension(value)
    }
}
impl VelocityClamp {
    /// The `(min, max)` limits of dimension `j`.
    pub fn limits(&self, j: usize) -> (Float, Float) {
        match self {
            Self::Scalar(min, max) => (*min, *max),
            Self::PerDimension(limits) => limits[j],
        }
    }

    /// The limits expanded to one pair per dimension.
    pub fn per_dimension(&self, n_dimensions: usize) -> Vec<(Float, Float)> {
        (0..n_dimensions).map(|j| self.limits(j)).collect()
    }

    /// Check that there is one pair per dimension and that `min <= max` for every pair.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::DimensionMismatch`] or [`SwarmError::InvalidOption`].
    pub fn validate(&self, n_dimensions: usize) -> SwarmResult<()> {
        if let Self::PerDimension(limits) = self {
            if limits.len() != n_dimensions {
                return Err(SwarmError::DimensionMismatch {
                    what: "velocity_clamp",
                    expected: n_dimensions,
                    got: limits.len(),
                });
            }
        }
        for j in 0..n_dimensions {
            let (min, max) = self.limits(j);
            if min.is_nan() || max.is_nan() || min > max {
                return Err(SwarmError::invalid_option(
                    "velocity_clamp",
                    format!("({min}, {max}) is not a valid range"),
                ));
            }
        }
        Ok(())
    }

    /// Clip every component of `velocity` in place.
    pub fn apply(&self, velocity: &mut DMatrix<Float>) {
        for (j, mut column) in velocity.column_iter_mut().enumerate() {
            let (min, max) = self.limits(j);
            column.apply(|v| *v = v.clamp(min, max));
        }
    }
}

/// Methods for reshaping the raw velocity before the position update.
///
/// The checks of [`VelocityHandler::Invert`], [`VelocityHandler::Zero`] and
/// [`VelocityHandler::Adjust`] look at where `x + v` would land, and do nothing without bounds.
/// The configured [`VelocityClamp`] is applied after every variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum VelocityHandler {
    /// Leave the velocity as it is
    #[default]
    Unmodified,
    /// Only clip to the [`VelocityClamp`] (which must be configured)
    Clamp,
    /// Flip and damp every component whose step would leave the bounds: $`v \to -z v`$
    Invert {
        /// The damping factor (`0.5` by default)
        z: Float,
    },
    /// Zero every component whose step would leave the bounds
    Zero,
    /// Scale a particle's whole velocity down so its step ends inside the bounds
    Adjust,
}

impl VelocityHandler {
    /// [`VelocityHandler::Invert`] with the default damping factor.
    pub const fn invert() -> Self {
        Self::Invert { z: 0.5 }
    }

    /// Check that the handler can run with the given clamp.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::InvalidOption`] if [`VelocityHandler::Clamp`] has no clamp to apply
    /// or the damping factor of [`VelocityHandler::Invert`] is negative or not finite.
    pub fn validate(&self, clamp: Option<&VelocityClamp>) -> SwarmResult<()> {
        match self {
            Self::Clamp if clamp.is_none() => Err(SwarmError::invalid_option(
                "velocity_clamp",
                "required by the clamping velocity handler",
            )),
            Self::Invert { z } if !(z.is_finite() && *z >= 0.0) => Err(SwarmError::invalid_option(
                "z",
                format!("damping factor must be non-negative, got {z}"),
            )),
            _ => Ok(()),
        }
    }

    /// Reshape `velocity` in place given the current `position`.
    pub fn adjust(
        &self,
        velocity: &mut DMatrix<Float>,
        clamp: Option<&VelocityClamp>,
        position: &DMatrix<Float>,
        bounds: Option<&Bounds>,
    ) {
        if let Some(bounds) = bounds {
            match self {
                Self::Unmodified | Self::Clamp => {}
                Self::Invert { z } => {
                    for_each_violation(velocity, position, bounds, |v| *v *= -z);
                }
                Self::Zero => for_each_violation(velocity, position, bounds, |v| *v = 0.0),
                Self::Adjust => adjust_rows(velocity, position, bounds),
            }
        }
        if let Some(clamp) = clamp {
            clamp.apply(velocity);
        }
    }
}

fn for_each_violation<F: Fn(&mut Float)>(
    velocity: &mut DMatrix<Float>,
    position: &DMatrix<Float>,
    bounds: &Bounds,
    f: F,
) {
    for i in 0..velocity.nrows() {
        for j in 0..velocity.ncols() {
            if !bounds.contains(j, position[(i, j)] + velocity[(i, j)]) {
                f(&mut velocity[(i, j)]);
            }
        }
    }
}

fn adjust_rows(velocity: &mut DMatrix<Float>, position: &DMatrix<Float>, bounds: &Bounds) {
    for i in 0..velocity.nrows() {
        let mut factor: Float = 1.0;
        for j in 0..velocity.ncols() {
            let (x, v) = (position[(i, j)], velocity[(i, j)]);
            if v == 0.0 || bounds.contains(j, x + v) {
                continue;
            }
            let (lb, ub) = bounds.limits(j);
            let room = if v > 0.0 { ub - x } else { lb - x };
            factor = factor.min((room / v).max(0.0));
        }
        if factor < 1.0 {
            velocity.row_mut(i).scale_mut(factor);
        }
    }
}
