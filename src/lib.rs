//! `swarmopt` provides particle swarm optimization (PSO) over bounded real and binary search
//! spaces, together with a small trait-based interface for objectives, topologies and callbacks.
//!
//! The user implements [`CostFunction`](crate::traits::CostFunction) for a single particle (or
//! [`SwarmObjective`](crate::traits::SwarmObjective) for the whole swarm at once) and hands it to
//! one of the optimizers in [`algorithms::particles`]:
//!
//! * [`PSO`](crate::algorithms::particles::PSO), the generalized real-valued optimizer, which can
//!   act as a global best optimizer ([`Topology::Star`](crate::algorithms::particles::Topology))
//!   or a local best optimizer ([`Topology::Ring`](crate::algorithms::particles::Topology)).
//! * [`BinaryPSO`](crate::algorithms::particles::BinaryPSO), the discrete variant which maps
//!   velocities to bit flips through a sigmoid.
//!
//! # Quick Start
//!
//! ```rust
//! use fastrand::Rng;
//! use swarmopt::algorithms::particles::{PSOConfig, SwarmOptions, PSO};
//! use swarmopt::test_functions::Sphere;
//!
//! let mut pso = PSO::new(Rng::with_seed(0));
//! let config = PSOConfig::new(10, 2)
//!     .with_options(SwarmOptions::new(0.5, 0.3, 0.9))
//!     .with_bounds([(-10.0, 10.0), (-10.0, 10.0)]);
//! let result = pso.optimize(&Sphere, &(), config, 100).unwrap();
//! assert!(result.best_cost < 1e-3);
//! println!("{}", result);
//! ```
//!
//! Every iteration evaluates the swarm, updates personal bests, lets the
//! [`Topology`](crate::algorithms::particles::Topology) pick a neighborhood best for every
//! particle and then moves the swarm:
//!
//! ```math
//! v_i^{t+1} = w v_i^t + c_1 r_1 (p_i^t - x_i^t) + c_2 r_2 (g_i^t - x_i^t), \quad x_i^{t+1} = x_i^t + v_i^{t+1}
//! ```
//!
//! Out-of-bounds velocities and positions are repaired by a
//! [`VelocityHandler`](crate::algorithms::particles::VelocityHandler) and a
//! [`BoundaryHandler`](crate::algorithms::particles::BoundaryHandler).
//!
//! # Logging
//!
//! The crate emits [`tracing`] events (`debug` per iteration, `info` per run) and never installs a
//! subscriber itself.
#![warn(
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::doc_markdown,
    clippy::doc_link_with_quotes,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::perf,
    clippy::style,
    missing_docs
)]

/// Module containing the swarm optimization algorithms.
pub mod algorithms;
/// Module containing the core types shared by all algorithms.
pub mod core;
/// Module containing the crate's error type.
pub mod error;
/// Module containing standard functions for testing algorithms.
pub mod test_functions;
/// Module containing the traits which connect objectives, algorithms and callbacks.
pub mod traits;

pub use error::{SwarmError, SwarmResult};
pub use nalgebra::{DMatrix, DVector};

/// The floating-point type used throughout the crate (`f64` unless the `f32` feature is enabled).
#[cfg(not(feature = "f32"))]
pub type Float = f64;
/// The floating-point type used throughout the crate (`f64` unless the `f32` feature is enabled).
#[cfg(feature = "f32")]
pub type Float = f32;

/// The mathematical constant $`\pi`$.
#[cfg(not(feature = "f32"))]
pub const PI: Float = std::f64::consts::PI;
/// The mathematical constant $`\pi`$.
#[cfg(feature = "f32")]
pub const PI: Float = std::f32::consts::PI;

/// Prelude module containing everything someone should need to use this crate for non-development
/// purposes.
pub mod prelude {
    pub use crate::{
        algorithms::particles::{
            BinaryPSO, BinaryPSOConfig, BoundaryHandler, NonFinitePolicy, PSOConfig, Patience,
            Rewire, SwarmOptions, SwarmStatus, Topology, TrackingSwarmObserver, VelocityClamp,
            VelocityHandler, PSO,
        },
        core::{Bounds, Callbacks, CtrlCAbortSignal, MaxSteps, Point, SwarmSummary},
        traits::{Algorithm, CostFunction, Observer, Status, SwarmObjective, Terminator},
        DMatrix, DVector, Float, SwarmError, SwarmResult,
    };
}
