use serde::{de::DeserializeOwned, Serialize};

/// The mutable state of a single run of an [`Algorithm`](crate::traits::Algorithm).
///
/// A fresh status is created with [`Default::default`] at the start of every
/// [`Algorithm::process`](crate::traits::Algorithm::process) call and is only ever mutated by the
/// algorithm itself and by [`Terminator`](crate::traits::Terminator)s.
pub trait Status: Clone + Default + Serialize + DeserializeOwned {
    /// Return the status to its freshly created state.
    fn reset(&mut self);
    /// Returns `true` if the run has been flagged as converged.
    fn converged(&self) -> bool;
    /// The latest human-readable message describing the run.
    fn message(&self) -> &str;
    /// Replace the message describing the run.
    fn update_message(&mut self, message: &str);
}
