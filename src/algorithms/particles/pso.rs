use std::sync::Arc;

use fastrand::Rng;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::{
    algorithms::particles::{
        swarm::check_shape, BoundaryHandler, Center, NonFinitePolicy, ProgressObserver,
        SwarmOptions, SwarmPositionInitializer, SwarmStatus, SwarmVelocityInitializer, Topology,
        VelocityClamp, VelocityHandler,
    },
    core::{Bounds, Callbacks, MaxSteps, SwarmSummary},
    error::{BoxedObjectiveError, SwarmError},
    traits::{Algorithm, Status, SwarmObjective},
    DMatrix, Float, SwarmResult,
};

/// The configuration struct for the [`PSO`] algorithm.
///
/// Nothing is checked until [`PSOConfig::validate`] runs, which [`PSO`] does before the first
/// evaluation of the objective.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PSOConfig {
    n_particles: usize,
    n_dimensions: usize,
    options: Option<SwarmOptions>,
    bounds: Option<Vec<(Float, Float)>>,
    topology: Topology,
    boundary_handler: BoundaryHandler,
    velocity_handler: VelocityHandler,
    velocity_clamp: Option<VelocityClamp>,
    center: Center,
    position_initializer: SwarmPositionInitializer,
    velocity_initializer: SwarmVelocityInitializer,
    non_finite: NonFinitePolicy,
    n_processes: Option<usize>,
    verbose: bool,
}

impl PSOConfig {
    /// A configuration for `n_particles` particles in an `n_dimensions` dimensional space.
    ///
    /// The [`SwarmOptions`] must be set with [`PSOConfig::with_options`] before the
    /// configuration is valid.
    pub fn new(n_particles: usize, n_dimensions: usize) -> Self {
        Self {
            n_particles,
            n_dimensions,
            ..Default::default()
        }
    }
    /// Set the [`SwarmOptions`] (`c1`, `c2`, `w` and, for local topologies, `k` and `p`).
    pub fn with_options(mut self, options: SwarmOptions) -> Self {
        self.options = Some(options);
        self
    }
    /// Restrict the search space to one `(lower, upper)` pair per dimension.
    pub fn with_bounds<I: IntoIterator<Item = (Float, Float)>>(mut self, bounds: I) -> Self {
        self.bounds = Some(bounds.into_iter().collect());
        self
    }
    /// Set the [`Topology`] (default = [`Topology::Star`]).
    pub const fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }
    /// Set the [`BoundaryHandler`] (default = [`BoundaryHandler::Nearest`]).
    pub const fn with_boundary_handler(mut self, boundary_handler: BoundaryHandler) -> Self {
        self.boundary_handler = boundary_handler;
        self
    }
    /// Set the [`VelocityHandler`] (default = [`VelocityHandler::Unmodified`]).
    pub const fn with_velocity_handler(mut self, velocity_handler: VelocityHandler) -> Self {
        self.velocity_handler = velocity_handler;
        self
    }
    /// Clip every velocity component, either with one `(min, max)` pair or one pair per
    /// dimension.
    pub fn with_velocity_clamp<C: Into<VelocityClamp>>(mut self, clamp: C) -> Self {
        self.velocity_clamp = Some(clamp.into());
        self
    }
    /// Scale generated initial positions by a scalar or per-dimension [`Center`] (default = `1`).
    pub fn with_center<C: Into<Center>>(mut self, center: C) -> Self {
        self.center = center.into();
        self
    }
    /// Start from an explicit `n_particles × n_dimensions` position matrix.
    pub fn with_init_pos(mut self, init_pos: DMatrix<Float>) -> Self {
        self.position_initializer = SwarmPositionInitializer::Custom(init_pos);
        self
    }
    /// Set the [`SwarmPositionInitializer`] (default = [`SwarmPositionInitializer::Uniform`]).
    pub fn with_position_initializer(mut self, initializer: SwarmPositionInitializer) -> Self {
        self.position_initializer = initializer;
        self
    }
    /// Set the [`SwarmVelocityInitializer`] (default = [`SwarmVelocityInitializer::Zero`]).
    pub fn with_velocity_initializer(mut self, initializer: SwarmVelocityInitializer) -> Self {
        self.velocity_initializer = initializer;
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
    /// The number of particles in the swarm.
    pub const fn n_particles(&self) -> usize {
        self.n_particles
    }
    /// The dimension of the search space.
    pub const fn n_dimensions(&self) -> usize {
        self.n_dimensions
    }
    /// Whether progress is logged every iteration.
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Check the whole configuration and build the validated [`Bounds`], if any.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::DimensionMismatch`] if the bounds, center, velocity clamp or initial
    /// positions disagree with the declared shape, [`SwarmError::InvalidTopology`] for an invalid
    /// neighbor count, and [`SwarmError::InvalidOption`] for anything else out of range.
    pub fn validate(&self) -> SwarmResult<Option<Bounds>> {
        let options = validate_common(
            self.n_particles,
            self.n_dimensions,
            self.options.as_ref(),
            &self.topology,
            self.n_processes,
        )?;
        let bounds = self
            .bounds
            .as_ref()
            .map(|pairs| {
                let bounds = Bounds::from_pairs(pairs.iter().copied())?;
                bounds.check_dimension(self.n_dimensions)?;
                Ok::<_, SwarmError>(bounds)
            })
            .transpose()?;
        if let Some(clamp) = &self.velocity_clamp {
            clamp.validate(self.n_dimensions)?;
        }
        self.velocity_handler
            .validate(self.velocity_clamp.as_ref())?;
        self.center.validate(self.n_dimensions)?;
        if let SwarmPositionInitializer::Custom(init_pos) = &self.position_initializer {
            check_shape("init_pos", init_pos, self.n_particles, self.n_dimensions)?;
        }
        if let SwarmVelocityInitializer::RandomInLimits(limits) = &self.velocity_initializer {
            if limits.len() != self.n_dimensions {
                return Err(SwarmError::DimensionMismatch {
                    what: "velocity limits",
                    expected: self.n_dimensions,
                    got: limits.len(),
                });
            }
        }
        tracing::trace!(?options, "validated swarm configuration");
        Ok(bounds)
    }
}

pub(crate) fn validate_common<'a>(
    n_particles: usize,
    n_dimensions: usize,
    options: Option<&'a SwarmOptions>,
    topology: &Topology,
    n_processes: Option<usize>,
) -> SwarmResult<&'a SwarmOptions> {
    if n_particles == 0 {
        return Err(SwarmError::invalid_option(
            "n_particles",
            "the swarm needs at least one particle",
        ));
    }
    if n_dimensions == 0 {
        return Err(SwarmError::invalid_option(
            "n_dimensions",
            "the search space needs at least one dimension",
        ));
    }
    let options = options.ok_or_else(|| {
        SwarmError::invalid_option("options", "c1, c2 and w must be provided")
    })?;
    options.validate()?;
    topology.validate(options, n_particles, n_dimensions)?;
    if n_processes == Some(0) {
        return Err(SwarmError::invalid_option(
            "n_processes",
            "at least one worker is needed",
        ));
    }
    Ok(options)
}

pub(crate) fn build_pool(n_processes: Option<usize>) -> SwarmResult<Option<Arc<ThreadPool>>> {
    n_processes
        .map(|n| {
            ThreadPoolBuilder::new()
                .num_threads(n)
                .thread_name(|i| format!("swarmopt-eval-{i}"))
                .build()
                .map(Arc::new)
                .map_err(SwarmError::from)
        })
        .transpose()
}

/// Evaluate the swarm and bring every best (personal, neighborhood and global) up to date.
#[allow(clippy::too_many_arguments)]
pub(crate) fn update_bests<P, U, E>(
    status: &mut SwarmStatus,
    problem: &P,
    user_data: &U,
    topology: &Topology,
    options: &SwarmOptions,
    step: usize,
    pool: Option<&ThreadPool>,
    policy: NonFinitePolicy,
    rng: &mut Rng,
) -> SwarmResult<()>
where
    P: SwarmObjective<U, E>,
    E: Into<BoxedObjectiveError>,
{
    status.evaluate(problem, user_data, pool, policy)?;
    status.update_personal_best();
    topology.update_neighbors(options, status, step, rng)?;
    let (best_pos, best_cost) =
        topology.compute_best(&status.pbest_pos, &status.pbest_cost, status.neighbors.as_deref());
    status.set_neighborhood_best(best_pos, best_cost);
    status.update_global_best();
    Ok(())
}

pub(crate) fn not_initialized() -> SwarmError {
    SwarmError::invalid_option("options", "the optimizer was not initialized")
}

pub(crate) fn summarize_status(
    status: &SwarmStatus,
    current_step: usize,
    bounds: Option<&Bounds>,
) -> SwarmSummary {
    SwarmSummary {
        bounds: bounds.cloned(),
        parameter_names: None,
        message: status.message.clone(),
        best_position: status.gbest.x.clone(),
        best_cost: status.gbest.fx_or_inf(),
        cost_history: status.cost_history.clone(),
        mean_pbest_history: status.mean_pbest_history.clone(),
        mean_neighbor_history: status.mean_neighbor_history.clone(),
        iterations: current_step,
        cost_evals: status.n_f_evals,
        converged: status.converged,
    }
}

/// Particle Swarm Optimizer
///
/// The PSO algorithm involves an ensemble of particles which are aware of the personal bests of
/// all or nearby particles in the swarm. The general algorithm involves updating each particle's
/// velocity as follows:
///
/// ```math
/// v_i^{t+1} = \omega v_i^t + c_1 r_{1,i}^{t+1}(p^t_i - x^t_i) + c_2 r_{2,i}^{t+1}(g^t_i - x^t_i)
/// ```
/// where $`r_1`$ and $`r_2`$ are uniformly distributed random vectors in $`[0,1)`$, $`\omega`$ is
/// an inertial weight parameter, $`c_1`$ and $`c_2`$ are cognitive and social weights
/// respectively, $`p_i^t`$ is the particle's personal best position, and $`g_i^t`$ is the best
/// personal best the particle can see through the [`Topology`]. With [`Topology::Star`] this is
/// the global best PSO, with [`Topology::Ring`] the local best PSO. See [^1] for more information.
///
/// Every iteration evaluates the swarm, updates the bests, passes the new velocity through the
/// [`VelocityHandler`] and, when bounds are set, repairs the new positions with the
/// [`BoundaryHandler`].
///
/// [^1]: [Houssein, E. H., Gad, A. G., Hussain, K., & Suganthan, P. N. (2021). Major Advances in Particle Swarm Optimization: Theory, Analysis, and Application. In Swarm and Evolutionary Computation (Vol. 63, p. 100868). Elsevier BV.](https://doi.org/10.1016/j.swevo.2021.100868)
#[derive(Clone)]
pub struct PSO {
    rng: Rng,
    config: PSOConfig,
    options: Option<SwarmOptions>,
    bounds: Option<Bounds>,
    pool: Option<Arc<ThreadPool>>,
}

impl Default for PSO {
    fn default() -> Self {
        Self::new(Rng::new())
    }
}

impl PSO {
    /// Construct a new particle swarm optimizer drawing all of its randomness from `rng`.
    pub fn new(rng: Rng) -> Self {
        Self {
            rng,
            config: PSOConfig::default(),
            options: None,
            bounds: None,
            pool: None,
        }
    }

    /// Run the optimizer for exactly `iters` iterations.
    ///
    /// This is [`Algorithm::process`] with a [`MaxSteps`] terminator, plus a
    /// [`ProgressObserver`] if the configuration is verbose.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if the configuration is invalid or the objective fails. See
    /// [`PSOConfig::validate`] and [`SwarmStatus::evaluate`].
    pub fn optimize<P, U, E>(
        &mut self,
        problem: &P,
        user_data: &U,
        config: PSOConfig,
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
}

impl<P, U, E> Algorithm<P, SwarmStatus, U, E> for PSO
where
    P: SwarmObjective<U, E>,
    E: Into<BoxedObjectiveError>,
{
    type Summary = SwarmSummary;
    type Config = PSOConfig;

    fn initialize(
        &mut self,
        config: Self::Config,
        _problem: &P,
        status: &mut SwarmStatus,
        _user_data: &U,
    ) -> SwarmResult<()> {
        let bounds = config.validate()?;
        let options = config.options.clone();
        let (n, d) = (config.n_particles, config.n_dimensions);
        let pool = build_pool(config.n_processes)?;
        let clamp = config.velocity_clamp.as_ref().map(|c| c.per_dimension(d));
        let position = config.position_initializer.init_positions(
            &mut self.rng,
            n,
            d,
            bounds.as_ref(),
            &config.center,
        )?;
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
            parallel = config.n_processes.is_some(),
            "starting particle swarm optimization"
        );
        self.options = options;
        self.bounds = bounds;
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
        self.config.velocity_handler.adjust(
            &mut velocity,
            self.config.velocity_clamp.as_ref(),
            &status.position,
            self.bounds.as_ref(),
        );
        let mut position = &status.position + &velocity;
        if let Some(bounds) = &self.bounds {
            self.config
                .boundary_handler
                .repair(&mut position, &status.position, bounds, &mut self.rng);
        }
        status.velocity = velocity;
        status.position = position;
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
            // No iteration ran, so the initial swarm has never been evaluated.
            self.update_bests(0, problem, status, user_data)?;
        }
        tracing::info!(
            iterations = current_step,
            best_cost = status.gbest.fx_or_inf(),
            evaluations = status.n_f_evals,
            "finished particle swarm optimization"
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
        Ok(summarize_status(status, current_step, self.bounds.as_ref()))
    }

    fn reset(&mut self) {
        self.options = None;
        self.bounds = None;
        self.pool = None;
    }
}
