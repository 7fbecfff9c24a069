use parking_lot::Once;
use std::{
    ops::ControlFlow,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::traits::{AbortSignal, Algorithm, Status, Terminator};

static INIT: Once = Once::new();
static CTRL_C_PRESSED: AtomicBool = AtomicBool::new(false);

/// A signal that is triggered when the user presses `Ctrl-C`.
/// <div class="warning">This signal takes over the `Ctrl-C` handler for the whole process and can interfere with
/// other libraries that use `Ctrl-C` (e.g. `tokio`).</div>
#[derive(Default)]
pub struct CtrlCAbortSignal;
impl CtrlCAbortSignal {
    /// Create a new `CtrlCAbortSignal` and register a ctrl-c handler.
    ///
    /// If another handler is already installed, a warning is logged and the signal can only be
    /// triggered through [`AbortSignal::abort`].
    pub fn new() -> Self {
        INIT.call_once(|| {
            if let Err(err) = ctrlc::set_handler(|| {
                tracing::warn!("Ctrl-C pressed, stopping the swarm after the current iteration");
                CTRL_C_PRESSED.store(true, Ordering::SeqCst);
            }) {
                tracing::warn!("could not install the Ctrl-C handler: {err}");
            }
        });
        Self
    }
}

impl AbortSignal for CtrlCAbortSignal {
    fn is_aborted(&self) -> bool {
        CTRL_C_PRESSED.load(Ordering::SeqCst)
    }

    fn abort(&self) {
        CTRL_C_PRESSED.store(true, Ordering::SeqCst);
    }

    fn reset(&self) {
        CTRL_C_PRESSED.store(false, Ordering::SeqCst);
    }
}

/// A signal that is triggered by setting an atomic boolean.
///
/// Wrap it in an [`Arc`](std::sync::Arc) to trigger it from another thread while a run is in
/// progress.
#[derive(Default)]
pub struct AtomicAbortSignal {
    abort: AtomicBool,
}

impl AtomicAbortSignal {
    /// Create a new `AtomicAbortSignal`.
    pub const fn new() -> Self {
        Self {
            abort: AtomicBool::new(false),
        }
    }
}

impl AbortSignal for AtomicAbortSignal {
    fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    fn abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.abort.store(false, Ordering::SeqCst);
    }
}

fn check_signal<T: AbortSignal + ?Sized, S: Status>(signal: &T, status: &mut S) -> ControlFlow<()> {
    if signal.is_aborted() {
        status.update_message("Aborted");
        return ControlFlow::Break(());
    }
    ControlFlow::Continue(())
}

impl<A, P, S, U, E> Terminator<A, P, S, U, E> for CtrlCAbortSignal
where
    A: Algorithm<P, S, U, E>,
    S: Status,
{
    fn check_for_termination(
        &mut self,
        _current_step: usize,
        _algorithm: &mut A,
        _problem: &P,
        status: &mut S,
        _user_data: &U,
    ) -> ControlFlow<()> {
        check_signal(self, status)
    }
}

impl<A, P, S, U, E> Terminator<A, P, S, U, E> for AtomicAbortSignal
where
    A: Algorithm<P, S, U, E>,
    S: Status,
{
    fn check_for_termination(
        &mut self,
        _current_step: usize,
        _algorithm: &mut A,
        _problem: &P,
        status: &mut S,
        _user_data: &U,
    ) -> ControlFlow<()> {
        check_signal(self, status)
    }
}

impl<A, P, S, U, E> Terminator<A, P, S, U, E> for std::sync::Arc<AtomicAbortSignal>
where
    A: Algorithm<P, S, U, E>,
    S: Status,
{
    fn check_for_termination(
        &mut self,
        _current_step: usize,
        _algorithm: &mut A,
        _problem: &P,
        status: &mut S,
        _user_data: &U,
    ) -> ControlFlow<()> {
        check_signal(self.as_ref(), status)
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
    use std::sync::Arc;

    #[test]
    fn test_atomic_signal_roundtrip() {
        let signal = AtomicAbortSignal::new();
        assert!(!signal.is_aborted());
        signal.abort();
        assert!(signal.is_aborted());
        signal.reset();
        assert!(!signal.is_aborted());
    }

    #[test]
    fn test_aborted_run_stops_immediately() {
        let signal = Arc::new(AtomicAbortSignal::new());
        signal.abort();
        let config = PSOConfig::new(4, 2)
            .with_options(SwarmOptions::new(0.5, 0.3, 0.9))
            .with_bounds([(-1.0, 1.0), (-1.0, 1.0)]);
        let res = PSO::new(Rng::with_seed(0))
            .process(
                &Sphere,
                &(),
                config,
                Callbacks::empty()
                    .with_terminator(signal.clone())
                    .with_terminator(MaxSteps(50)),
            )
            .unwrap();
        assert_eq!(res.iterations, 0);
        assert_eq!(res.message, "Aborted");
        // the initial swarm is still evaluated once
        assert_eq!(res.cost_evals, 4);
    }

    #[test]
    fn test_ctrlc_signal_stops_a_run() {
        let signal = CtrlCAbortSignal::new();
        signal.reset();
        assert!(!signal.is_aborted());
        signal.abort();
        // every handle reads the same process-wide flag
        assert!(CtrlCAbortSignal::new().is_aborted());
        let config = PSOConfig::new(4, 2)
            .with_options(SwarmOptions::new(0.5, 0.3, 0.9))
            .with_bounds([(-1.0, 1.0), (-1.0, 1.0)]);
        let res = PSO::new(Rng::with_seed(0))
            .process(
                &Sphere,
                &(),
                config,
                Callbacks::empty()
                    .with_terminator(signal)
                    .with_terminator(MaxSteps(50)),
            )
            .unwrap();
        assert_eq!(res.iterations, 0);
        assert_eq!(res.message, "Aborted");
        let signal = CtrlCAbortSignal::new();
        signal.reset();
        assert!(!signal.is_aborted());
    }
}
