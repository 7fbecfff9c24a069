use std::{convert::Infallible, ops::ControlFlow};

use crate::{
    core::Callbacks,
    traits::{Status, Terminator},
    SwarmResult,
};

/// A trait representing an iterative optimization algorithm.
///
/// This trait is implemented for the optimizers found in the
/// [`particles`](crate::algorithms::particles) module, and contains all the methods needed to be
/// run by [`Algorithm::process`].
pub trait Algorithm<P, S: Status, U = (), E = Infallible> {
    /// A type which holds a summary of the algorithm's ending state.
    type Summary;
    /// The configuration struct for the algorithm.
    type Config;

    /// Any setup work done before the main steps of the algorithm should be done here.
    ///
    /// Configuration is validated here, before the objective is evaluated for the first time.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the configuration is invalid or an evaluation fails.
    fn initialize(
        &mut self,
        config: Self::Config,
        problem: &P,
        status: &mut S,
        user_data: &U,
    ) -> SwarmResult<()>;

    /// The main "step" of an algorithm, which is repeated until a
    /// [`Terminator`](crate::traits::Terminator) stops the run.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the evaluation fails.
    fn step(
        &mut self,
        current_step: usize,
        problem: &P,
        status: &mut S,
        user_data: &U,
    ) -> SwarmResult<()>;

    /// Runs any steps needed by the [`Algorithm`] after termination. This will run regardless of
    /// how the run was terminated.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the evaluation fails.
    #[allow(unused_variables)]
    fn postprocessing(
        &mut self,
        current_step: usize,
        problem: &P,
        status: &mut S,
        user_data: &U,
    ) -> SwarmResult<()> {
        Ok(())
    }

    /// Generates a new [`Algorithm::Summary`] from the current state of the [`Algorithm`], which
    /// can be displayed or used elsewhere.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if any internal evaluation fails while creating the summary.
    fn summarize(
        &self,
        current_step: usize,
        problem: &P,
        status: &S,
        user_data: &U,
    ) -> SwarmResult<Self::Summary>;

    /// Reset the algorithm to its initial state.
    fn reset(&mut self) {}

    /// Run the algorithm to completion.
    ///
    /// Terminators are checked before every step with the number of completed steps, and
    /// observers are called after every step with the same count.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if [`Algorithm::initialize`], [`Algorithm::step`],
    /// [`Algorithm::postprocessing`] or [`Algorithm::summarize`] fail.
    fn process(
        &mut self,
        problem: &P,
        user_data: &U,
        config: Self::Config,
        mut callbacks: Callbacks<Self, P, S, U, E>,
    ) -> SwarmResult<Self::Summary>
    where
        Self: Sized,
    {
        let mut status = S::default();
        self.initialize(config, problem, &mut status, user_data)?;
        let mut current_step = 0;
        loop {
            if let ControlFlow::Break(()) = callbacks.check_for_termination(
                current_step,
                self,
                problem,
                &mut status,
                user_data,
            ) {
                break;
            }
            self.step(current_step, problem, &mut status, user_data)?;
            current_step += 1;
            callbacks.observe_all(current_step, self, problem, &status, user_data);
        }
        self.postprocessing(current_step, problem, &mut status, user_data)?;
        self.summarize(current_step, problem, &status, user_data)
    }
}
