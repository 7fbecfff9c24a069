use crate::{
    algorithms::particles::options::Coefficients,
    core::{
        utils::{argmin_of, SampleFloat},
        Point,
    },
    error::{BoxedObjectiveError, SwarmError},
    traits::{Status, SwarmObjective},
    DMatrix, DVector, Float, SwarmResult,
};
use fastrand::Rng;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

/// What to do when the objective returns `NaN` or an infinite cost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonFinitePolicy {
    /// Treat the cost as `+inf` so the position can never become a best
    #[default]
    Penalize,
    /// Abort the run with [`SwarmError::NonFiniteValue`]
    Error,
}

/// A status for particle swarm optimization.
///
/// Every matrix has one particle per row. The neighborhood best of particle `i` is the best
/// personal best among the particles it can see through the
/// [`Topology`](crate::algorithms::particles::Topology).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SwarmStatus {
    /// Current positions
    pub position: DMatrix<Float>,
    /// Current velocities
    pub velocity: DMatrix<Float>,
    /// Cost of every particle at its position of the latest evaluation
    pub current_cost: DVector<Float>,
    /// Personal best positions
    pub pbest_pos: DMatrix<Float>,
    /// Personal best costs
    pub pbest_cost: DVector<Float>,
    /// Neighborhood best positions, one row per particle
    pub best_pos: DMatrix<Float>,
    /// Neighborhood best costs, one per particle
    pub best_cost: DVector<Float>,
    /// The best position found by the whole swarm
    pub gbest: Point,
    /// Neighbor lists of local topologies (`None` until first computed)
    pub neighbors: Option<Vec<Vec<usize>>>,
    /// Best personal-best cost after every iteration
    pub cost_history: Vec<Float>,
    /// Mean personal-best cost after every iteration
    pub mean_pbest_history: Vec<Float>,
    /// Mean neighborhood-best cost after every iteration
    pub mean_neighbor_history: Vec<Float>,
    /// The number of single-particle objective evaluations
    pub n_f_evals: usize,
    /// An indicator of whether the swarm has converged
    pub converged: bool,
    /// A message containing information about the condition of the swarm or convergence
    pub message: String,
}

impl Default for SwarmStatus {
    fn default() -> Self {
        Self::new(DMatrix::zeros(0, 0), DMatrix::zeros(0, 0))
    }
}

impl SwarmStatus {
    /// A fresh status for a swarm starting at `position` with the given `velocity`.
    ///
    /// Personal and neighborhood bests start at the initial positions with infinite cost.
    pub fn new(position: DMatrix<Float>, velocity: DMatrix<Float>) -> Self {
        let n = position.nrows();
        Self {
            pbest_pos: position.clone(),
            best_pos: position.clone(),
            current_cost: DVector::from_element(n, Float::INFINITY),
            pbest_cost: DVector::from_element(n, Float::INFINITY),
            best_cost: DVector::from_element(n, Float::INFINITY),
            position,
            velocity,
            gbest: Point::default(),
            neighbors: None,
            cost_history: Vec::new(),
            mean_pbest_history: Vec::new(),
            mean_neighbor_history: Vec::new(),
            n_f_evals: 0,
            converged: false,
            message: String::new(),
        }
    }

    /// The number of particles in the swarm.
    pub fn n_particles(&self) -> usize {
        self.position.nrows()
    }

    /// The dimension of the search space.
    pub fn n_dimensions(&self) -> usize {
        self.position.ncols()
    }

    /// Evaluate the objective at the current positions and store the costs.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::Objective`] if the objective fails, [`SwarmError::ObjectiveShape`]
    /// if it returns the wrong number of costs, and [`SwarmError::NonFiniteValue`] if a cost is
    /// not finite and `policy` is [`NonFinitePolicy::Error`].
    pub fn evaluate<P, U, E>(
        &mut self,
        problem: &P,
        user_data: &U,
        pool: Option<&ThreadPool>,
        policy: NonFinitePolicy,
    ) -> SwarmResult<()>
    where
        P: SwarmObjective<U, E>,
        E: Into<BoxedObjectiveError>,
    {
        let n = self.n_particles();
        let mut costs = match pool {
            Some(pool) => problem.evaluate_swarm_in(&self.position, user_data, pool),
            None => problem.evaluate_swarm(&self.position, user_data),
        }
        .map_err(SwarmError::objective)?;
        if costs.len() != n {
            return Err(SwarmError::ObjectiveShape {
                expected: n,
                got: costs.len(),
            });
        }
        self.n_f_evals += n;
        for (particle, cost) in costs.iter_mut().enumerate() {
            if cost.is_finite() {
                continue;
            }
            match policy {
                NonFinitePolicy::Penalize => {
                    tracing::debug!(particle, value = %cost, "penalizing non-finite cost");
                    *cost = Float::INFINITY;
                }
                NonFinitePolicy::Error => {
                    return Err(SwarmError::NonFiniteValue {
                        particle,
                        value: *cost,
                    })
                }
            }
        }
        self.current_cost = costs;
        Ok(())
    }

    /// Replace personal bests with strictly better current costs; ties keep the earlier best.
    pub fn update_personal_best(&mut self) {
        for i in 0..self.n_particles() {
            if self.current_cost[i] < self.pbest_cost[i] {
                self.pbest_cost[i] = self.current_cost[i];
                self.pbest_pos.set_row(i, &self.position.row(i));
            }
        }
    }

    /// Store the neighborhood bests computed by a topology.
    pub fn set_neighborhood_best(&mut self, best_pos: DMatrix<Float>, best_cost: DVector<Float>) {
        self.best_pos = best_pos;
        self.best_cost = best_cost;
    }

    /// Move the global best to the lowest personal best if it is strictly better.
    pub fn update_global_best(&mut self) {
        if let Some(i) = argmin_of(self.pbest_cost.as_slice(), 0..self.n_particles()) {
            let cost = self.pbest_cost[i];
            if self.gbest.fx.map_or(true, |best| cost < best) {
                self.gbest = Point::new(self.pbest_pos.row(i).transpose(), cost);
            }
        }
    }

    /// Append the best and mean costs of this iteration to the histories.
    pub fn record_history(&mut self) {
        let n = self.n_particles().max(1) as Float;
        self.cost_history.push(self.gbest.fx_or_inf());
        self.mean_pbest_history.push(self.pbest_cost.sum() / n);
        self.mean_neighbor_history.push(self.best_cost.sum() / n);
    }

    /// The unconstrained velocity update
    /// $`w v + c_1 r_1 (p - x) + c_2 r_2 (g - x)`$ with fresh `r1, r2` in `[0, 1)` for every
    /// particle and dimension.
    pub(crate) fn raw_velocity(&self, coefficients: Coefficients, rng: &mut Rng) -> DMatrix<Float> {
        let Coefficients { c1, c2, w } = coefficients;
        let mut velocity = DMatrix::zeros(self.n_particles(), self.n_dimensions());
        for i in 0..self.n_particles() {
            for j in 0..self.n_dimensions() {
                let x = self.position[(i, j)];
                let r1 = rng.float();
                let r2 = rng.float();
                let cognitive = c1 * r1 * (self.pbest_pos[(i, j)] - x);
                let social = c2 * r2 * (self.best_pos[(i, j)] - x);
                velocity[(i, j)] = w.mul_add(self.velocity[(i, j)], cognitive + social);
            }
        }
        velocity
    }
}

impl Status for SwarmStatus {
    fn reset(&mut self) {
        *self = Self::default();
    }
    fn converged(&self) -> bool {
        self.converged
    }
    fn message(&self) -> &str {
        &self.message
    }
    fn update_message(&mut self, message: &str) {
        self.message = message.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_functions::Sphere;
    use nalgebra::{dmatrix, dvector};

    struct Costs(DVector<Float>);
    impl SwarmObjective for Costs {
        fn evaluate_swarm(
            &self,
            _positions: &DMatrix<Float>,
            _user_data: &(),
        ) -> Result<DVector<Float>, std::convert::Infallible> {
            Ok(self.0.clone())
        }
    }

    fn status() -> SwarmStatus {
        SwarmStatus::new(dmatrix![1.0, 0.0; 0.0, 2.0; 3.0, 3.0], DMatrix::zeros(3, 2))
    }

    #[test]
    fn test_evaluate_and_personal_best() {
        let mut s = status();
        s.evaluate(&Sphere, &(), None, NonFinitePolicy::Penalize)
            .unwrap();
        assert_eq!(s.current_cost, dvector![1.0, 4.0, 18.0]);
        s.update_personal_best();
        assert_eq!(s.pbest_cost, dvector![1.0, 4.0, 18.0]);
        // move particle 0 somewhere worse and particle 1 somewhere equal
        s.position = dmatrix![5.0, 0.0; 2.0, 0.0; 0.0, 0.0];
        s.evaluate(&Sphere, &(), None, NonFinitePolicy::Penalize)
            .unwrap();
        s.update_personal_best();
        assert_eq!(s.pbest_cost, dvector![1.0, 4.0, 0.0]);
        assert_eq!(s.pbest_pos, dmatrix![1.0, 0.0; 0.0, 2.0; 0.0, 0.0]);
        assert_eq!(s.n_f_evals, 6);
    }

    #[test]
    fn test_global_best_lowest_index_wins() {
        let mut s = status();
        s.evaluate(&Costs(dvector![2.0, 1.0, 1.0]), &(), None, NonFinitePolicy::Penalize)
            .unwrap();
        s.update_personal_best();
        s.update_global_best();
        assert_eq!(s.gbest.fx, Some(1.0));
        assert_eq!(s.gbest.x, dvector![0.0, 2.0]);
        s.record_history();
        assert_eq!(s.cost_history, vec![1.0]);
        assert_eq!(s.mean_pbest_history, vec![4.0 / 3.0]);
    }

    #[test]
    fn test_non_finite_policies() {
        let mut s = status();
        let problem = Costs(dvector![Float::NAN, 1.0, Float::NEG_INFINITY]);
        s.evaluate(&problem, &(), None, NonFinitePolicy::Penalize)
            .unwrap();
        assert_eq!(s.current_cost, dvector![Float::INFINITY, 1.0, Float::INFINITY]);
        s.update_personal_best();
        s.update_global_best();
        assert_eq!(s.gbest.fx, Some(1.0));
        let err = s
            .evaluate(&problem, &(), None, NonFinitePolicy::Error)
            .unwrap_err();
        assert!(matches!(err, SwarmError::NonFiniteValue { particle: 0, .. }));
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let mut s = status();
        let err = s
            .evaluate(&Costs(dvector![1.0, 2.0]), &(), None, NonFinitePolicy::Penalize)
            .unwrap_err();
        assert!(matches!(
            err,
            SwarmError::ObjectiveShape {
                expected: 3,
                got: 2
            }
        ));
        let err = s
            .evaluate(&Costs(DVector::zeros(0)), &(), None, NonFinitePolicy::Penalize)
            .unwrap_err();
        assert!(err.is_objective_error());
        assert_eq!(s.n_f_evals, 0);
    }

    #[test]
    fn test_raw_velocity_at_rest() {
        // with every best equal to the position and no velocity, nothing moves
        let s = status();
        let v = s.raw_velocity(
            Coefficients {
                c1: 0.5,
                c2: 0.3,
                w: 0.9,
            },
            &mut Rng::with_seed(0),
        );
        assert_eq!(v, DMatrix::zeros(3, 2));
    }
}
