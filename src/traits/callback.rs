use parking_lot::{Mutex, RwLock};
use std::{cell::RefCell, ops::ControlFlow, rc::Rc, sync::Arc};

use crate::traits::{Algorithm, Status};

/// A trait for callbacks which may stop an [`Algorithm`] run.
///
/// Terminators are checked before every step with the number of steps completed so far. They may
/// mutate both the [`Algorithm`] and its [`Status`] (typically to leave a message explaining why
/// the run stopped).
pub trait Terminator<A, P, S, U, E>
where
    A: Algorithm<P, S, U, E>,
    S: Status,
{
    /// Return [`ControlFlow::Break`] to stop the run before the next step.
    fn check_for_termination(
        &mut self,
        current_step: usize,
        algorithm: &mut A,
        problem: &P,
        status: &mut S,
        user_data: &U,
    ) -> ControlFlow<()>;
}
impl<T, A, P, S, U, E> Terminator<A, P, S, U, E> for Rc<RefCell<T>>
where
    T: Terminator<A, P, S, U, E>,
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
        self.borrow_mut()
            .check_for_termination(current_step, algorithm, problem, status, user_data)
    }
}
impl<T, A, P, S, U, E> Terminator<A, P, S, U, E> for Arc<RwLock<T>>
where
    T: Terminator<A, P, S, U, E>,
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
        self.write()
            .check_for_termination(current_step, algorithm, problem, status, user_data)
    }
}
impl<T, A, P, S, U, E> Terminator<A, P, S, U, E> for Arc<Mutex<T>>
where
    T: Terminator<A, P, S, U, E>,
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
        self.lock()
            .check_for_termination(current_step, algorithm, problem, status, user_data)
    }
}

/// A trait for read-only callbacks which are called after every step of an [`Algorithm`].
///
/// This is the most restrictive type of callback and is not able to mutate any of its inputs aside
/// from itself. Observers are the way to stream per-iteration swarm snapshots out of a run.
pub trait Observer<A, P, S, U, E>
where
    A: Algorithm<P, S, U, E>,
    S: Status,
{
    /// Observe the state of the run after `current_step` steps have been completed.
    fn observe(
        &mut self,
        current_step: usize,
        algorithm: &A,
        problem: &P,
        status: &S,
        user_data: &U,
    );
}
impl<O, A, P, S, U, E> Observer<A, P, S, U, E> for Rc<RefCell<O>>
where
    O: Observer<A, P, S, U, E>,
    A: Algorithm<P, S, U, E>,
    S: Status,
{
    fn observe(
        &mut self,
        current_step: usize,
        algorithm: &A,
        problem: &P,
        status: &S,
        user_data: &U,
    ) {
        self.borrow_mut()
            .observe(current_step, algorithm, problem, status, user_data);
    }
}
impl<O, A, P, S, U, E> Observer<A, P, S, U, E> for Arc<RwLock<O>>
where
    O: Observer<A, P, S, U, E>,
    A: Algorithm<P, S, U, E>,
    S: Status,
{
    fn observe(
        &mut self,
        current_step: usize,
        algorithm: &A,
        problem: &P,
        status: &S,
        user_data: &U,
    ) {
        self.write()
            .observe(current_step, algorithm, problem, status, user_data);
    }
}
impl<O, A, P, S, U, E> Observer<A, P, S, U, E> for Arc<Mutex<O>>
where
    O: Observer<A, P, S, U, E>,
    A: Algorithm<P, S, U, E>,
    S: Status,
{
    fn observe(
        &mut self,
        current_step: usize,
        algorithm: &A,
        problem: &P,
        status: &S,
        user_data: &U,
    ) {
        self.lock()
            .observe(current_step, algorithm, problem, status, user_data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algorithms::particles::{PSOConfig, SwarmOptions, PSO},
        core::{Callbacks, MaxSteps},
        test_functions::Sphere,
    };
    use fastrand::Rng;

    #[derive(Default)]
    struct Counter {
        checks: usize,
        observations: Vec<usize>,
    }
    impl<A, P, S, U, E> Terminator<A, P, S, U, E> for Counter
    where
        A: Algorithm<P, S, U, E>,
        S: Status,
    {
        fn check_for_termination(
            &mut self,
            _current_step: usize,
            _algorithm: &mut A,
            _problem: &P,
            _status: &mut S,
            _user_data: &U,
        ) -> ControlFlow<()> {
            self.checks += 1;
            ControlFlow::Continue(())
        }
    }
    impl<A, P, S, U, E> Observer<A, P, S, U, E> for Counter
    where
        A: Algorithm<P, S, U, E>,
        S: Status,
    {
        fn observe(
            &mut self,
            current_step: usize,
            _algorithm: &A,
            _problem: &P,
            _status: &S,
            _user_data: &U,
        ) {
            self.observations.push(current_step);
        }
    }

    #[test]
    #[allow(clippy::arc_with_non_send_sync)]
    fn check_all_callback_wrappers() {
        let rc_refcell = Rc::new(RefCell::new(Counter::default()));
        let arc_rwlock = Arc::new(RwLock::new(Counter::default()));
        let arc_mutex = Arc::new(Mutex::new(Counter::default()));
        let config = PSOConfig::new(4, 2)
            .with_options(SwarmOptions::new(0.5, 0.3, 0.9))
            .with_bounds([(-1.0, 1.0), (-1.0, 1.0)]);
        let res = PSO::new(Rng::with_seed(1))
            .process(
                &Sphere,
                &(),
                config,
                Callbacks::empty()
                    .with_terminator(MaxSteps(5))
                    .with_terminator(rc_refcell.clone())
                    .with_terminator(arc_rwlock.clone())
                    .with_terminator(arc_mutex.clone())
                    .with_observer(rc_refcell.clone())
                    .with_observer(arc_rwlock.clone())
                    .with_observer(arc_mutex.clone()),
            )
            .unwrap();
        // MaxSteps is checked first, so the sixth check never reaches the others.
        assert_eq!(rc_refcell.borrow().checks, 5);
        assert_eq!(arc_rwlock.read().checks, 5);
        assert_eq!(arc_mutex.lock().checks, 5);
        assert_eq!(rc_refcell.borrow().observations, vec![1, 2, 3, 4, 5]);
        assert_eq!(arc_rwlock.read().observations.len(), 5);
        assert_eq!(arc_mutex.lock().observations.len(), 5);
        assert_eq!(res.iterations, 5);
        assert_eq!(res.message, "Completed 5 iterations");
    }
}
