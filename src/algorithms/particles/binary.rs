use std::sync::Arc;

use fastrand::Rng;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use crate::{
    algorithms::particles::{
        pso::{build_pool, not_initialized, summarize_status, update_bests, validate_common},
        swarm::check_shape,
        NonFinitePolicy, ProgressObserver, SwarmOptions, SwarmStatus, SwarmVelocityInitializer,
        Topology, VelocityClamp,
    },
    core::{
        utils::{sigmoid, SampleFloat},
        Callbacks, MaxSteps, SwarmSummary,
    },
    error::{BoxedObjectiveError, SwarmError},
    traits::{Algorithm, Status, SwarmObjective},
    DMatrix, Float, SwarmResult,
};

/// The configuration struct for the [`BinaryPSO`] algorithm.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BinaryPSOConfig {
    n_particles: usize,
    n_dimensions: usize,
    options: Option<SwarmOptions>,
    topology: Topology,
    velocity_clamp: Option<VelocityClamp>,
    init_pos: Option<DMatrix<Float>>,
    velocity_initializer: SwarmVelocityInitializer,
    max_active: Option<usize>,
    non_finite: NonFinitePolicy,
    n_processes: Option<usize>,
    verbose: bool,
}

impl BinaryPSOConfig {
    /// A configuration for `n_particles` bit strings of length `n_dimensions`.
    pub fn new(n_particles: usize, n_dimensions: usize) -> Self {
        Self {
            n_particles,
            n_dimensions,
            ..Default::default()
        }
    }
    /// Set the [`SwarmOptions`].
    pub fn with_options(mut self, options: SwarmOptions) -> Self {
        self.options = Some(options);
        self
    }
    /// Set the [`Topology`] (default = [`Topology::Star`]).
    pub const fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }
    /// Clip every velocity component before it is mapped to a bit.
    pub fn with_velocity_clamp<C: Into<VelocityClamp>>(mut self, clamp: C) -> Self {
        self.velocity_clamp = Some(clamp.into());
        self
    }
    /// Start from an explicit matrix of zeros and ones.
    pub fn with_init_pos(mut self, init_pos: DMatrix<Float>) -> Self {
        self.init_pos = Some(init_pos);
        self
    }
    /// Set the [`SwarmVelocityInitializer`] (default = [`SwarmVelocityInitializer::Zero`]).
    pub fn with_velocity_initializer(mut self, initializer: SwarmVelocityInitializer) -> Self {
        self.velocity_initializer = initializer;
        self
    }
    /// Allow at most `max_active` set bits per particle.
    pub const fn with_max_active(mut self, max_active: usize) -> Self {
        self.max_active = Some(max_active);
        self
    }
    /// Set what happens to non-finite costs (default = [`NonFinitePolicy::Penalize`]).
    pub const fn with_non_finite_policy(mut self, policy: NonFinitePolicy) -> Self {
        self.non_finite = policy;
        self
    }
    /// Evaluate the swarm on a dedicated pool of `n_processes` threads.
    pub const fn with_n_processes(mut self, n_processes: usize) -> Self {
        self.n_processes = Some(n_processes);
        self
    }
    /// Log the progress of every iteration at the `info` level.
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
    /// Whether progress is logged every iteration.
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Check the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::DimensionMismatch`] if the initial positions or velocity clamp
    /// disagree with the declared shape, [`SwarmError::InvalidTopology`] for an invalid neighbor
    /// count, and [`SwarmError::InvalidOption`] for anything else out of range, including initial
    /// positions which are not all `0` or `1`.
    pub fn validate(&self) -> SwarmResult<()> {
        validate_common(
            self.n_particles,
            self.n_dimensions,
            self.options.as_ref(),
            &self.topology,
            self.n_processes,
        )?;
        if let Some(clamp) = &self.velocity_clamp {
            clamp.validate(self.n_dimensions)?;
        }
        if let Some(init_pos) = &self.init_pos {
            check_shape("init_pos", init_pos, self.n_particles, self.n_dimensions)?;
            if init_pos.iter().any(|&b| b != 0.0 && b != 1.0) {
                return Err(SwarmError::invalid_option(
                    "init_pos",
                    "binary positions must be 0 or 1",
                ));
            }
        }
        if self.max_active == Some(0) {
            return Err(SwarmError::invalid_option(
                "max_active",
                "at least one bit must be allowed",
            ));
        }
        Ok(())
    }
}

/// Binary Particle Swarm Optimizer
///
/// The discrete variant of [`PSO`](crate::algorithms::particles::PSO) from [^1]. Velocities are
/// updated exactly as in the real-valued algorithm, but every position component is a bit which
/// is redrawn each iteration:
///
/// ```math
/// x_{ij}^{t+1} = \begin{cases} 1 & \text{if } u_{ij} < \sigma(v_{ij}^{t+1}) \\ 0 & \text{otherwise} \end{cases}
/// ```
/// where $`\sigma(v) = 1 / (1 + e^{-v})`$ and $`u_{ij}`$ is uniform in $`[0, 1)`$. Since the
/// sigmoid never leaves $`(0, 1)`$, there are no bounds to handle, and the only velocity handling
/// is the optional clamp.
///
/// [^1]: [Kennedy, J., & Eberhart, R. C. (1997). A discrete binary version of the particle swarm algorithm. In 1997 IEEE International Conference on Systems, Man, and Cybernetics (Vol. 5, pp. 4104–4108). IEEE.](https://doi.org/10.1109/ICSMC.1997.637339)
#[derive(Clone)]
pub struct BinaryPSO {
    rng: Rng,
    config: BinaryPSOConfig,
    options: Option<SwarmOptions>,
    pool: Option<Arc<ThreadPool>>,
}

impl Default for BinaryPSO {
    fn default() -> Self {
        Self::new(Rng::new())
    }
}

impl BinaryPSO {
    /// Construct a new binary particle swarm optimizer drawing all of its randomness from `rng`.
    pub fn new(rng: Rng) -> Self {
        Self {
            rng,
            config: BinaryPSOConfig::default(),
            options: None,
            pool: None,
        }
    }

    /// Run the optimizer for exactly `iters` iterations.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the configuration is invalid or the objective fails. See
    /// [`BinaryPSOConfig::validate`] and [`SwarmStatus::evaluate`].
    pub fn optimize<P, U, E>(
        &mut self,
        problem: &P,
        user_data: &U,
        config: BinaryPSOConfig,
        iters: usize,
    ) -> SwarmResult<SwarmSummary>
    where
        P: SwarmObjective<U, E>,
        E: Into<BoxedObjectiveError>,
    {
        let mut callbacks: Callbacks<Self, P, SwarmStatus, U, E> =
            Callbacks::empty().with_terminator(MaxSteps(iters));
        if config.verbose() {
            callbacks = callbacks.with_observer(ProgressObserver);
        }
        self.process(problem, user_data, config, callbacks)
    }

    fn update_bests<P, U, E>(
        &mut self,
        current_step: usize,
        problem: &P,
        status: &mut SwarmStatus,
        user_data: &U,
    ) -> SwarmResult<()>
    where
        P: SwarmObjective<U, E>,
        E: Into<BoxedObjectiveError>,
    {
        let options = self.options.as_ref().ok_or_else(not_initialized)?;
        update_bests(
            status,
            problem,
            user_data,
            &self.config.topology,
            options,
            current_step,
            self.pool.as_deref(),
            self.config.non_finite,
            &mut self.rng,
        )
    }

    fn sample_bits(&mut self, velocity: &DMatrix<Float>) -> DMatrix<Float> {
        let mut bits = DMatrix::zeros(velocity.nrows(), velocity.ncols());
        for i in 0..velocity.nrows() {
            for j in 0..velocity.ncols() {
                let threshold: Float = self.rng.float();
                if sigmoid(velocity[(i, j)]) > threshold {
                    bits[(i, j)] = 1.0;
                }
            }
        }
        if let Some(max_active) = self.config.max_active {
            limit_active(&mut bits, velocity, max_active);
        }
        bits
    }
}

/// Keep only the `max_active` set bits with the largest velocity in every row.
fn limit_active(bits: &mut DMatrix<Float>, velocity: &DMatrix<Float>, max_active: usize) {
    for i in 0..bits.nrows() {
        let mut active: Vec<usize> = (0..bits.ncols()).filter(|&j| bits[(i, j)] == 1.0).collect();
        if active.len() <= max_active {
            continue;
        }
        // stable sort, so equal velocities keep the lower index
        active.sort_by(|&a, &b| velocity[(i, b)].total_cmp(&velocity[(i, a)]));
        for &j in &active[max_active..] {
            bits[(i, j)] = 0.0;
        }
    }
}

impl<P, U, E> Algorithm<P, SwarmStatus, U, E> for BinaryPSO
where
    P: SwarmObjective<U, E>,
    E: Into<BoxedObjectiveError>,
{
    type Summary = SwarmSummary;
    type Config = BinaryPSOConfig;

    fn initialize(
        &mut self,
        config: Self::Config,
        _problem: &P,
        status: &mut SwarmStatus,
        _user_data: &U,
    ) -> SwarmResult<()> {
        config.validate()?;
        let (n, d) = (config.n_particles, config.n_dimensions);
        let pool = build_pool(config.n_processes)?;
        let position = match &config.init_pos {
            Some(init_pos) => init_pos.clone(),
            None => DMatrix::from_fn(n, d, |_, _| if self.rng.bool() { 1.0 } else { 0.0 }),
        };
        let clamp = config.velocity_clamp.as_ref().map(|c| c.per_dimension(d));
        let velocity =
            config
                .velocity_initializer
                .init_velocities(&mut self.rng, n, d, clamp.as_deref())?;
        *status = SwarmStatus::new(position, velocity);
        status.update_message("Initialized");
        tracing::info!(
            n_particles = n,
            n_dimensions = d,
            topology = ?config.topology,
            max_active = ?config.max_active,
            "starting binary particle swarm optimization"
        );
        self.options = config.options.clone();
        self.pool = pool;
        self.config = config;
        Ok(())
    }

    fn step(
        &mut self,
        current_step: usize,
        problem: &P,
        status: &mut SwarmStatus,
        user_data: &U,
    ) -> SwarmResult<()> {
        self.update_bests(current_step, problem, status, user_data)?;
        status.record_history();

        let coefficients = self
            .options
            .as_ref()
            .ok_or_else(not_initialized)?
            .coefficients(current_step);
        let mut velocity = status.raw_velocity(coefficients, &mut self.rng);
        if let Some(clamp) = &self.config.velocity_clamp {
            clamp.apply(&mut velocity);
        }
        status.position = self.sample_bits(&velocity);
        status.velocity = velocity;
        tracing::debug!(
            step = current_step,
            best_cost = status.gbest.fx_or_inf(),
            "completed iteration"
        );
        Ok(())
    }

    fn postprocessing(
        &mut self,
        current_step: usize,
        problem: &P,
        status: &mut SwarmStatus,
        user_data: &U,
    ) -> SwarmResult<()> {
        if current_step == 0 {
            self.update_bests(0, problem, status, user_data)?;
        }
        tracing::info!(
            iterations = current_step,
            best_cost = status.gbest.fx_or_inf(),
            evaluations = status.n_f_evals,
            "finished binary particle swarm optimization"
        );
        Ok(())
    }

    fn summarize(
        &self,
        current_step: usize,
        _problem: &P,
        status: &SwarmStatus,
        _user_data: &U,
    ) -> SwarmResult<Self::Summary> {
        Ok(summarize_status(status, current_step, None))
    }

    fn reset(&mut self) {
        self.options = None;
        self.pool = None;
    }
}
