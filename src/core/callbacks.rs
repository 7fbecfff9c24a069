use crate::traits::{Algorithm, Observer, Status, Terminator};
use std::ops::ControlFlow;

/// A set of [`Terminator`]s and [`Observer`]s which can be used as an input to
/// [`Algorithm::process`].
///
/// Terminators are checked in insertion order and the first one to break stops the run; the rest
/// are not consulted for that step. Observers are always called in insertion order.
pub struct Callbacks<A, P, S, U, E> {
    terminators: Vec<Box<dyn Terminator<A, P, S, U, E>>>,
    observers: Vec<Box<dyn Observer<A, P, S, U, E>>>,
}
impl<A, P, S, U, E> Default for Callbacks<A, P, S, U, E> {
    fn default() -> Self {
        Self::empty()
    }
}
impl<A, P, S, U, E> Callbacks<A, P, S, U, E> {
    /// Create an empty set of callbacks.
    pub const fn empty() -> Self {
        Self {
            terminators: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Return the set of [`Callbacks`] with an additional [`Terminator`] added.
    pub fn with_terminator<T>(mut self, terminator: T) -> Self
    where
        T: Terminator<A, P, S, U, E> + 'static,
        A: Algorithm<P, S, U, E>,
        S: Status,
    {
        self.terminators.push(Box::new(terminator));
        self
    }

    /// Return the set of [`Callbacks`] with an additional [`Observer`] added.
    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: Observer<A, P, S, U, E> + 'static,
        A: Algorithm<P, S, U, E>,
        S: Status,
    {
        self.observers.push(Box::new(observer));
        self
    }

    /// The number of registered terminators and observers.
    pub fn len(&self) -> usize {
        self.terminators.len() + self.observers.len()
    }

    /// Returns `true` if no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn observe_all(
        &mut self,
        current_step: usize,
        algorithm: &A,
        problem: &P,
        status: &S,
        user_data: &U,
    ) where
        A: Algorithm<P, S, U, E>,
        S: Status,
    {
        for observer in &mut self.observers {
            observer.observe(current_step, algorithm, problem, status, user_data);
        }
    }
}
impl<A, P, S, U, E> Terminator<A, P, S, U, E> for Callbacks<A, P, S, U, E>
where
    A: Algorithm<P, S, U, E>,
    S: Status,
{
    fn check_for_termination(
        &mut self,
        current_step: usize,
        algorithm: &mut A,
        problem: &P,
        status: &mut S,
        user_data: &U,
    ) -> ControlFlow<()> {
        if self.terminators.iter_mut().any(|terminator| {
            terminator
                .check_for_termination(current_step, algorithm, problem, status, user_data)
                .is_break()
        }) {
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}

/// A [`Terminator`] which stops the algorithm after exactly the given number of steps.
#[derive(Clone, Copy, Debug)]
pub struct MaxSteps(pub usize);
impl Default for MaxSteps {
    fn default() -> Self {
        Self(1000)
    }
}
impl<A, P, S, U, E> Terminator<A, P, S, U, E> for MaxSteps
where
    A: Algorithm<P, S, U, E>,
    S: Status,
{
    fn check_for_termination(
        &mut self,
        current_step: usize,
        _algorithm: &mut A,
        _problem: &P,
        status: &mut S,
        _user_data: &U,
    ) -> ControlFlow<()> {
        if current_step >= self.0 {
            status.update_message(&format!("Completed {} iterations", self.0));
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algorithms::particles::{PSOConfig, SwarmOptions, SwarmStatus, PSO},
        test_functions::Sphere,
        Float,
    };
    use fastrand::Rng;

    fn config() -> PSOConfig {
        PSOConfig::new(5, 3)
            .with_options(SwarmOptions::new(0.5, 0.3, 0.9))
            .with_bounds([(-5.0, 5.0); 3])
    }

    #[test]
    fn test_max_steps_counts_exactly() {
        for n in [0, 1, 7] {
            let res = PSO::new(Rng::with_seed(3))
                .process(
                    &Sphere,
                    &(),
                    config(),
                    Callbacks::empty().with_terminator(MaxSteps(n)),
                )
                .unwrap();
            assert_eq!(res.iterations, n);
            assert_eq!(res.message, format!("Completed {n} iterations"));
        }
    }

    #[test]
    fn test_first_breaking_terminator_wins() {
        struct StopAt(usize);
        impl<A, P, U, E> Terminator<A, P, SwarmStatus, U, E> for StopAt
        where
            A: Algorithm<P, SwarmStatus, U, E>,
        {
            fn check_for_termination(
                &mut self,
                current_step: usize,
                _algorithm: &mut A,
                _problem: &P,
                status: &mut SwarmStatus,
                _user_data: &U,
            ) -> ControlFlow<()> {
                if current_step >= self.0 {
                    status.update_message("stopped early");
                    return ControlFlow::Break(());
                }
                ControlFlow::Continue(())
            }
        }
        let callbacks = Callbacks::empty()
            .with_terminator(StopAt(2))
            .with_terminator(MaxSteps(10));
        assert_eq!(callbacks.len(), 2);
        let res = PSO::new(Rng::with_seed(3))
            .process(&Sphere, &(), config(), callbacks)
            .unwrap();
        assert_eq!(res.iterations, 2);
        assert_eq!(res.message, "stopped early");
        assert!(res.best_cost < Float::INFINITY);
    }
}
