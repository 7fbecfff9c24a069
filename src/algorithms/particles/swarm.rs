use crate::{
    core::{
        utils::{random_matrix, SampleFloat},
        Bounds,
    },
    error::SwarmError,
    DMatrix, Float, SwarmResult,
};
use fastrand::Rng;
use serde::{Deserialize, Serialize};

/// Scale applied to generated initial positions, either one factor for every dimension or one per
/// dimension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Center {
    /// The same factor for every dimension
    Scalar(Float),
    /// One factor per dimension
    PerDimension(Vec<Float>),
}
impl Default for Center {
    fn default() -> Self {
        Self::Scalar(1.0)
    }
}
impl From<Float> for Center {
    fn from(value: Float) -> Self {
        Self::Scalar(value)
    }
}
impl From<Vec<Float>> for Center {
    fn from(value: Vec<Float>) -> Self {
        Self::PerDimension(value)
    }
}
impl Center {
    /// The factor applied to dimension `j`.
    pub fn factor(&self, j: usize) -> Float {
        match self {
            Self::Scalar(c) => *c,
            Self::PerDimension(c) => c[j],
        }
    }

    pub(crate) fn validate(&self, n_dimensions: usize) -> SwarmResult<()> {
        let values = match self {
            Self::Scalar(c) => std::slice::from_ref(c),
            Self::PerDimension(c) => {
                if c.len() != n_dimensions {
                    return Err(SwarmError::DimensionMismatch {
                        what: "center",
                        expected: n_dimensions,
                        got: c.len(),
                    });
                }
                c.as_slice()
            }
        };
        if let Some(bad) = values.iter().find(|c| !c.is_finite()) {
            return Err(SwarmError::invalid_option(
                "center",
                format!("must be finite, got {bad}"),
            ));
        }
        Ok(())
    }
}

/// Methods to initialize the positions of particles in a swarm.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SwarmPositionInitializer {
    /// Uniform draws inside the bounds (or in `[0, 1)` without bounds), scaled by the
    /// [`Center`]
    #[default]
    Uniform,
    /// Latin hypercube sampling inside the bounds (or `[0, 1)` without bounds), scaled by the
    /// [`Center`]
    LatinHypercube,
    /// An explicit `n_particles × n_dimensions` starting matrix
    Custom(DMatrix<Float>),
}
impl SwarmPositionInitializer {
    /// Initialize the positions of the particles in the swarm.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::DimensionMismatch`] if a [`SwarmPositionInitializer::Custom`] matrix
    /// does not have the shape `n_particles × n_dimensions`.
    pub fn init_positions(
        &self,
        rng: &mut Rng,
        n_particles: usize,
        n_dimensions: usize,
        bounds: Option<&Bounds>,
        center: &Center,
    ) -> SwarmResult<DMatrix<Float>> {
        let limits = |j: usize| bounds.map_or((0.0, 1.0), |b| b.limits(j));
        let mut positions = match self {
            Self::Custom(positions) => {
                check_shape("init_pos", positions, n_particles, n_dimensions)?;
                if let Some(bounds) = bounds {
                    if !positions
                        .row_iter()
                        .all(|row| bounds.contains_point(row.iter()))
                    {
                        tracing::warn!("init_pos places particles outside of the bounds");
                    }
                }
                return Ok(positions.clone());
            }
            Self::Uniform => {
                let mut positions = random_matrix(n_particles, n_dimensions, 0.0, 1.0, rng);
                for (j, mut column) in positions.column_iter_mut().enumerate() {
                    let (lb, ub) = limits(j);
                    column.apply(|u| *u = (ub - lb).mul_add(*u, lb));
                }
                positions
            }
            Self::LatinHypercube => {
                let mut positions = DMatrix::zeros(n_particles, n_dimensions);
                for j in 0..n_dimensions {
                    let (lb, ub) = limits(j);
                    let bin_size = (ub - lb) / n_particles as Float;
                    let mut bins = (0..n_particles).collect::<Vec<_>>();
                    rng.shuffle(&mut bins);
                    for (i, bin) in bins.into_iter().enumerate() {
                        let lower = (bin as Float).mul_add(bin_size, lb);
                        positions[(i, j)] = rng.range(lower, lower + bin_size);
                    }
                }
                positions
            }
        };
        for (j, mut column) in positions.column_iter_mut().enumerate() {
            column *= center.factor(j);
        }
        Ok(positions)
    }
}

/// Methods for setting the initial velocity of particles in a swarm
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SwarmVelocityInitializer {
    /// Initialize all velocities to zero
    #[default]
    Zero,
    /// Uniform draws inside the configured velocity clamp (zero if no clamp is set)
    RandomInClamp,
    /// Uniform draws inside the given `(min, max)` limits, one pair per dimension
    RandomInLimits(Vec<(Float, Float)>),
}
impl SwarmVelocityInitializer {
    /// Initialize the velocities of the particles in the swarm.
    ///
    /// `clamp` holds the per-dimension `(min, max)` velocity limits, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::DimensionMismatch`] if the limits do not have one entry per
    /// dimension and [`SwarmError::InvalidOption`] if a limit has `min > max`.
    pub fn init_velocities(
        &self,
        rng: &mut Rng,
        n_particles: usize,
        n_dimensions: usize,
        clamp: Option<&[(Float, Float)]>,
    ) -> SwarmResult<DMatrix<Float>> {
        let limits = match self {
            Self::Zero => return Ok(DMatrix::zeros(n_particles, n_dimensions)),
            Self::RandomInClamp => match clamp {
                Some(limits) => limits,
                None => return Ok(DMatrix::zeros(n_particles, n_dimensions)),
            },
            Self::RandomInLimits(limits) => limits.as_slice(),
        };
        if limits.len() != n_dimensions {
            return Err(SwarmError::DimensionMismatch {
                what: "velocity limits",
                expected: n_dimensions,
                got: limits.len(),
            });
        }
        if let Some((lo, hi)) = limits.iter().find(|(lo, hi)| lo > hi) {
            return Err(SwarmError::invalid_option(
                "velocity limits",
                format!("({lo}, {hi}) has min > max"),
            ));
        }
        let mut velocities = random_matrix(n_particles, n_dimensions, 0.0, 1.0, rng);
        for (j, mut column) in velocities.column_iter_mut().enumerate() {
            let (lo, hi) = limits[j];
            column.apply(|u| *u = (hi - lo).mul_add(*u, lo));
        }
        Ok(velocities)
    }
}

pub(crate) fn check_shape(
    what: &'static str,
    matrix: &DMatrix<Float>,
    n_particles: usize,
    n_dimensions: usize,
) -> SwarmResult<()> {
    if matrix.ncols() != n_dimensions {
        return Err(SwarmError::DimensionMismatch {
            what,
            expected: n_dimensions,
            got: matrix.ncols(),
        });
    }
    if matrix.nrows() != n_particles {
        return Err(SwarmError::DimensionMismatch {
            what,
            expected: n_particles,
            got: matrix.nrows(),
        });
    }
    Ok(())
}
