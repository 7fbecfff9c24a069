use std::convert::Infallible;

use rayon::{prelude::*, ThreadPool};

use crate::{DMatrix, DVector, Float};

/// A trait which describes a function $`f(\mathbb{R}^n) \to \mathbb{R}`$ evaluated for a single
/// particle.
///
/// Such a function may also take a `user_data: &U` field which can be used to pass external
/// arguments to the function during optimization. The same `user_data` is passed unchanged to
/// every evaluation of a run.
///
/// The `CostFunction` trait takes a generic `U` representing the type of user data/arguments
/// and a generic `E` representing any possible errors that might be returned during function
/// execution.
///
/// Every [`CostFunction`] which is [`Sync`] is automatically a [`SwarmObjective`], evaluated
/// particle by particle.
pub trait CostFunction<U = (), E = Infallible> {
    /// The evaluation of the function at a point `x` with the given arguments/user data.
    ///
    /// # Errors
    ///
    /// Returns an `Err(E)` if the evaluation fails. Users should implement this trait to return a
    /// [`std::convert::Infallible`] if the function evaluation never fails.
    fn evaluate(&self, x: &DVector<Float>, user_data: &U) -> Result<Float, E>;
}

/// A trait which describes an objective evaluated on the whole swarm at once.
///
/// `positions` holds one particle per row (`n_particles × n_dimensions`) and the result must hold
/// exactly one cost per particle, in row order. Implement this directly when the objective can be
/// vectorized; otherwise implement [`CostFunction`] and rely on the blanket implementation.
pub trait SwarmObjective<U = (), E = Infallible> {
    /// Evaluate every row of `positions`.
    ///
    /// # Errors
    ///
    /// Returns an `Err(E)` if the evaluation fails. See [`CostFunction::evaluate`] for more
    /// information.
    fn evaluate_swarm(&self, positions: &DMatrix<Float>, user_data: &U)
        -> Result<DVector<Float>, E>;

    /// Evaluate every row of `positions` using the given worker `pool`.
    ///
    /// The default implementation ignores the pool and calls [`SwarmObjective::evaluate_swarm`].
    ///
    /// # Errors
    ///
    /// Returns an `Err(E)` if the evaluation fails. See [`CostFunction::evaluate`] for more
    /// information.
    #[allow(unused_variables)]
    fn evaluate_swarm_in(
        &self,
        positions: &DMatrix<Float>,
        user_data: &U,
        pool: &ThreadPool,
    ) -> Result<DVector<Float>, E> {
        self.evaluate_swarm(positions, user_data)
    }
}

impl<T, U, E> SwarmObjective<U, E> for T
where
    T: CostFunction<U, E> + Sync,
    U: Sync,
    E: Send,
{
    fn evaluate_swarm(
        &self,
        positions: &DMatrix<Float>,
        user_data: &U,
    ) -> Result<DVector<Float>, E> {
        let costs = positions
            .row_iter()
            .map(|row| self.evaluate(&row.transpose(), user_data))
            .collect::<Result<Vec<Float>, E>>()?;
        Ok(DVector::from_vec(costs))
    }

    fn evaluate_swarm_in(
        &self,
        positions: &DMatrix<Float>,
        user_data: &U,
        pool: &ThreadPool,
    ) -> Result<DVector<Float>, E> {
        // Each particle is independent, so gathering in index order keeps results bit-identical
        // to the sequential path.
        let costs = pool.install(|| {
            (0..positions.nrows())
                .into_par_iter()
                .map(|i| self.evaluate(&positions.row(i).transpose(), user_data))
                .collect::<Result<Vec<Float>, E>>()
        })?;
        Ok(DVector::from_vec(costs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_functions::{Rastrigin, Sphere};
    use nalgebra::dmatrix;
    use rayon::ThreadPoolBuilder;

    #[test]
    fn test_batch_adapter_evaluates_rows() {
        let positions = dmatrix![1.0, 2.0; 0.0, 0.0; -3.0, 1.0];
        let costs = Sphere.evaluate_swarm(&positions, &()).unwrap();
        assert_eq!(costs.as_slice(), &[5.0, 0.0, 10.0]);
    }

    #[test]
    fn test_parallel_batch_matches_sequential() {
        let pool = ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        let positions = DMatrix::from_fn(37, 4, |i, j| (i as Float) * 0.37 - (j as Float) * 1.3);
        let sequential = Rastrigin.evaluate_swarm(&positions, &()).unwrap();
        let parallel = Rastrigin.evaluate_swarm_in(&positions, &(), &pool).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_batch_adapter_propagates_errors() {
        struct Picky;
        impl CostFunction<Float, String> for Picky {
            fn evaluate(&self, x: &DVector<Float>, limit: &Float) -> Result<Float, String> {
                if x[0] > *limit {
                    return Err(format!("{} is above {}", x[0], limit));
                }
                Ok(x[0])
            }
        }
        let positions = dmatrix![0.5; 2.0; 0.1];
        assert_eq!(
            Picky.evaluate_swarm(&positions, &1.0).unwrap_err(),
            "2 is above 1"
        );
        assert!(Picky.evaluate_swarm(&positions, &3.0).is_ok());
    }
}
