//! Error types for swarm optimization.
//!
//! Configuration problems are reported before the first objective evaluation; objective problems
//! abort the run at the iteration in which they occur.

use thiserror::Error;

use crate::Float;

/// A boxed error returned by a user-provided objective.
pub type BoxedObjectiveError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while configuring or running a swarm optimizer.
#[derive(Debug, Error)]
pub enum SwarmError {
    /// A vector or matrix does not match the declared dimensionality of the problem.
    #[error("dimension mismatch in {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// What was being checked (`"init_pos"`, `"bounds"`, ...)
        what: &'static str,
        /// The expected length
        expected: usize,
        /// The length that was provided
        got: usize,
    },

    /// An option is missing, unknown, or outside its valid range.
    #[error("invalid option `{name}`: {reason}")]
    InvalidOption {
        /// The name of the offending option
        name: String,
        /// Why the option was rejected
        reason: String,
    },

    /// The neighbor count is not valid for the number of particles in the swarm.
    #[error("invalid topology: k = {k} must satisfy 1 <= k <= {n_particles}")]
    InvalidTopology {
        /// The requested neighbor count
        k: usize,
        /// The number of particles in the swarm
        n_particles: usize,
    },

    /// The objective returned a cost vector with the wrong number of entries.
    #[error("objective returned {got} costs for a swarm of {expected} particles")]
    ObjectiveShape {
        /// The number of particles in the swarm
        expected: usize,
        /// The number of costs returned
        got: usize,
    },

    /// The objective returned `NaN` or an infinite cost and the run is configured to fail on it.
    #[error("objective returned a non-finite cost ({value}) for particle {particle}")]
    NonFiniteValue {
        /// The index of the offending particle
        particle: usize,
        /// The non-finite value
        value: Float,
    },

    /// The objective itself reported an error.
    #[error("objective evaluation failed: {0}")]
    Objective(#[source] BoxedObjectiveError),

    /// The worker pool used for parallel evaluation could not be built.
    #[error("failed to build the evaluation thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A specialized `Result` type for swarm operations.
pub type SwarmResult<T> = std::result::Result<T, SwarmError>;

impl SwarmError {
    pub(crate) fn invalid_option(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn objective<E: Into<BoxedObjectiveError>>(err: E) -> Self {
        Self::Objective(err.into())
    }

    /// Returns `true` if this is a configuration-related error.
    ///
    /// This includes `InvalidOption` and `InvalidTopology`.
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidOption { .. } | Self::InvalidTopology { .. }
        )
    }

    /// Returns `true` if this is a dimension mismatch error.
    pub const fn is_dimension_error(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. })
    }

    /// Returns `true` if the error was raised while evaluating the objective.
    ///
    /// This includes `ObjectiveShape`, `NonFiniteValue` and `Objective`.
    pub const fn is_objective_error(&self) -> bool {
        matches!(
            self,
            Self::ObjectiveShape { .. } | Self::NonFiniteValue { .. } | Self::Objective(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SwarmError::DimensionMismatch {
            what: "bounds",
            expected: 3,
            got: 2,
        };
        assert_eq!(
            err.to_string(),
            "dimension mismatch in bounds: expected 3, got 2"
        );
        let err = SwarmError::InvalidTopology {
            k: 0,
            n_particles: 5,
        };
        assert_eq!(
            err.to_string(),
            "invalid topology: k = 0 must satisfy 1 <= k <= 5"
        );
    }

    #[test]
    fn test_error_categories() {
        let config_err = SwarmError::invalid_option("c1", "must be positive");
        let dim_err = SwarmError::DimensionMismatch {
            what: "init_pos",
            expected: 2,
            got: 1,
        };
        let shape_err = SwarmError::ObjectiveShape {
            expected: 10,
            got: 9,
        };
        assert!(config_err.is_config_error());
        assert!(!config_err.is_dimension_error());
        assert!(dim_err.is_dimension_error());
        assert!(!dim_err.is_objective_error());
        assert!(shape_err.is_objective_error());
        assert!(!shape_err.is_config_error());
    }

    #[test]
    fn test_objective_error_is_wrapped() {
        let err = SwarmError::objective(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk on fire",
        ));
        assert!(err.is_objective_error());
        assert_eq!(err.to_string(), "objective evaluation failed: disk on fire");
    }
}
