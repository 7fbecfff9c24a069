/// Basic implementations of [`AbortSignal`](crate::traits::AbortSignal)
pub mod abort_signal;
/// [`Bounds`] type for restricting the search space to a box.
pub mod bound;
/// [`Callbacks`] container and the [`MaxSteps`] terminator.
pub mod callbacks;
/// [`Point`] type for defining a point in the parameter space.
pub mod point;
/// [`SwarmSummary`] type for the result of an optimization run.
pub mod summary;
/// Random sampling helpers shared by the optimizers.
pub mod utils;

pub use abort_signal::{AtomicAbortSignal, CtrlCAbortSignal};
pub use bound::Bounds;
pub use callbacks::{Callbacks, MaxSteps};
pub use point::Point;
pub use summary::SwarmSummary;
