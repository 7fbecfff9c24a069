/// A flag which lets code outside of a run ask for the run to stop.
///
/// Every [`AbortSignal`] in this crate is also a [`Terminator`](crate::traits::Terminator), so it
/// can be handed directly to [`Callbacks::with_terminator`](crate::core::Callbacks::with_terminator).
pub trait AbortSignal {
    /// Return `true` if an abort has been requested.
    fn is_aborted(&self) -> bool;
    /// Request an abort.
    fn abort(&self);
    /// Clear any pending abort request.
    fn reset(&self);
}
