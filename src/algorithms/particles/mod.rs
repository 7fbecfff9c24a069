/// Implementation of the Binary Particle Swarm Optimization algorithm
pub mod binary;
pub use binary::{BinaryPSO, BinaryPSOConfig};

/// Strategies for repairing particles which leave the bounds
pub mod boundary;
pub use boundary::BoundaryHandler;

/// [`SwarmOptions`] and coefficient schedules
pub mod options;
pub use options::{CoefficientSchedule, Coefficients, SwarmOptions};

/// Implementation of Particle Swarm Optimization (PSO) algorithm
pub mod pso;
pub use pso::{PSOConfig, PSO};

/// Initialization strategies for swarm-based optimizers.
pub mod swarm;
pub use swarm::{Center, SwarmPositionInitializer, SwarmVelocityInitializer};

/// [`SwarmStatus`] type for swarm-based optimizers.
pub mod swarm_status;
pub use swarm_status::{NonFinitePolicy, SwarmStatus};

/// Neighborhood topologies
pub mod topology;
pub use topology::{Rewire, Topology};

/// Strategies for reshaping velocities before the position update
pub mod velocity;
pub use velocity::{VelocityClamp, VelocityHandler};

use std::{ops::ControlFlow, sync::Arc};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{
    core::Point,
    traits::{Algorithm, Observer, Status, Terminator},
    DMatrix, Float,
};

/// An [`Observer`] which stores the swarm's positions and velocities after every step as well as
/// the history of global best positions.
///
/// This is the hook for animating a run: the recorded trajectories can be exported with any
/// `serde` format.
#[derive(Serialize, Deserialize, Default, Clone, Debug)]
pub struct TrackingSwarmObserver {
    /// The positions of the swarm after every step
    pub position_history: Vec<DMatrix<Float>>,
    /// The velocities of the swarm after every step
    pub velocity_history: Vec<DMatrix<Float>>,
    /// The global best after every step
    pub best_history: Vec<Point>,
}

impl TrackingSwarmObserver {
    /// Finalize the [`Observer`] by wrapping it in an [`Arc`] and [`RwLock`]
    pub fn build() -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(Self::default()))
    }
}

impl<A, P, U, E> Observer<A, P, SwarmStatus, U, E> for TrackingSwarmObserver
where
    A: Algorithm<P, SwarmStatus, U, E>,
{
    fn observe(
        &mut self,
        _current_step: usize,
        _algorithm: &A,
        _problem: &P,
        status: &SwarmStatus,
        _user_data: &U,
    ) {
        self.position_history.push(status.position.clone());
        self.velocity_history.push(status.velocity.clone());
        self.best_history.push(status.gbest.clone());
    }
}

/// An [`Observer`] which logs the best cost after every step at the `info` level.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProgressObserver;

impl<A, P, U, E> Observer<A, P, SwarmStatus, U, E> for ProgressObserver
where
    A: Algorithm<P, SwarmStatus, U, E>,
{
    fn observe(
        &mut self,
        current_step: usize,
        _algorithm: &A,
        _problem: &P,
        status: &SwarmStatus,
        _user_data: &U,
    ) {
        tracing::info!(
            step = current_step,
            best_cost = status.gbest.fx_or_inf(),
            mean_pbest = status.mean_pbest_history.last().copied(),
            "swarm progress"
        );
    }
}

/// A [`Terminator`] which stops the run once the best cost has stalled.
///
/// An iteration counts as stalled if the best cost moved by less than
/// `ftol * (1 + |best cost|)`. The run stops (and the status is marked as converged) after
/// `ftol_iter` consecutive stalled iterations.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Patience {
    /// Relative tolerance on the change of the best cost
    pub ftol: Float,
    /// Number of consecutive stalled iterations needed to stop (at least `1`)
    pub ftol_iter: usize,
}

impl Default for Patience {
    fn default() -> Self {
        Self {
            ftol: 1e-8,
            ftol_iter: 10,
        }
    }
}

impl Patience {
    /// Create a new [`Patience`] terminator.
    pub fn new(ftol: Float, ftol_iter: usize) -> Self {
        Self {
            ftol,
            ftol_iter: ftol_iter.max(1),
        }
    }

    fn stalled_iterations(&self, history: &[Float]) -> usize {
        history
            .windows(2)
            .rev()
            .take_while(|w| (w[0] - w[1]).abs() < self.ftol * (1.0 + w[1].abs()))
            .count()
    }
}

impl<A, P, U, E> Terminator<A, P, SwarmStatus, U, E> for Patience
where
    A: Algorithm<P, SwarmStatus, U, E>,
{
    fn check_for_termination(
        &mut self,
        _current_step: usize,
        _algorithm: &mut A,
        _problem: &P,
        status: &mut SwarmStatus,
        _user_data: &U,
    ) -> ControlFlow<()> {
        let n = self.ftol_iter.max(1);
        if self.stalled_iterations(&status.cost_history) >= n {
            status.converged = true;
            status.update_message(&format!(
                "Best cost changed by less than ftol = {} for {n} iterations",
                self.ftol
            ));
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{Callbacks, MaxSteps},
        test_functions::Sphere,
    };
    use fastrand::Rng;

    #[test]
    fn test_tracking_observer_exports_trajectories() {
        let tracker = TrackingSwarmObserver::build();
        let config = PSOConfig::new(6, 2)
            .with_options(SwarmOptions::new(0.5, 0.3, 0.9))
            .with_bounds([(-3.0, 3.0), (-3.0, 3.0)]);
        let result = PSO::new(Rng::with_seed(0))
            .process(
                &Sphere,
                &(),
                config,
                Callbacks::empty()
                    .with_terminator(MaxSteps(15))
                    .with_observer(tracker.clone()),
            )
            .unwrap();
        let tracker = tracker.read();
        assert_eq!(tracker.position_history.len(), 15);
        assert_eq!(tracker.velocity_history.len(), 15);
        assert!(tracker
            .position_history
            .iter()
            .all(|p| p.shape() == (6, 2)));
        assert_eq!(tracker.best_history.last().and_then(|p| p.fx), Some(result.best_cost));
        // Trajectories can be exported to Python for plotting
        let bytes = serde_pickle::to_vec(&*tracker, Default::default()).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_patience_counts_trailing_stalls() {
        let patience = Patience::new(1e-3, 2);
        assert_eq!(patience.stalled_iterations(&[]), 0);
        assert_eq!(patience.stalled_iterations(&[5.0, 1.0, 1.0, 1.0]), 2);
        assert_eq!(patience.stalled_iterations(&[1.0, 1.0, 0.5, 0.5]), 1);
        assert_eq!(
            patience.stalled_iterations(&[Float::INFINITY, Float::INFINITY]),
            0
        );
        assert_eq!(Patience::new(1e-3, 0).ftol_iter, 1);
    }

    #[test]
    fn test_patience_stops_a_converged_run() {
        let config = PSOConfig::new(10, 2)
            .with_options(SwarmOptions::new(0.5, 0.3, 0.9))
            .with_bounds([(-10.0, 10.0), (-10.0, 10.0)]);
        let result = PSO::new(Rng::with_seed(3))
            .process(
                &Sphere,
                &(),
                config,
                Callbacks::empty()
                    .with_terminator(MaxSteps(5000))
                    .with_terminator(Patience::new(1e-6, 25)),
            )
            .unwrap();
        assert!(result.converged);
        assert!(result.iterations < 5000);
        assert!(result.message.starts_with("Best cost changed by less than"));
        let tail = &result.cost_history[result.cost_history.len() - 26..];
        assert!(tail
            .windows(2)
            .all(|w| (w[0] - w[1]).abs() < 1e-6 * (1.0 + w[1].abs())));
    }
}
