use crate::{
    algorithms::particles::{SwarmOptions, SwarmStatus},
    core::utils::argmin_of,
    error::SwarmError,
    DMatrix, DVector, Float, SwarmResult,
};
use fastrand::Rng;
use serde::{Deserialize, Serialize};

/// When the neighbor graph of a local topology is rebuilt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rewire {
    /// Build the graph once from particle indices and keep it for the whole run
    #[default]
    Static,
    /// Rebuild the graph from the current positions every `r` iterations (starting with the
    /// first)
    Every(usize),
}

/// Swarm topologies which determine the flow of information.
///
/// A topology decides which personal bests every particle can see. The best of those becomes the
/// particle's neighborhood best, which pulls the particle through the social term of the velocity
/// update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    /// Each particle is connected to all others (global best PSO)
    #[default]
    Star,
    /// Each particle sees itself and `k - 1` others (local best PSO).
    ///
    /// With [`Rewire::Static`], the neighbors are the closest indices with wraparound, taken in
    /// the order `i, i + 1, i - 1, i + 2, i - 2, ...`. With [`Rewire::Every`], they are the `k`
    /// nearest particles under the Minkowski `p`-norm, ties going to the lower index.
    Ring {
        /// How the neighbor graph is rebuilt
        rewire: Rewire,
    },
    /// A [`Topology::Ring`] whose neighbor count is the Delannoy number
    /// $`D(n_{\text{dimensions}}, r)`$.
    VonNeumann {
        /// The range of the Von Neumann neighborhood
        r: usize,
        /// How the neighbor graph is rebuilt
        rewire: Rewire,
    },
    /// Each particle sees itself and `k - 1` other particles drawn at random
    Random {
        /// How often the random graph is redrawn
        rewire: Rewire,
    },
}

impl Topology {
    /// The number of neighbors (self included) every particle sees, or `None` for
    /// [`Topology::Star`].
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::InvalidOption`] if `k` is needed but not set.
    pub fn neighbor_count(
        &self,
        options: &SwarmOptions,
        n_dimensions: usize,
    ) -> SwarmResult<Option<usize>> {
        match self {
            Self::Star => Ok(None),
            Self::Ring { .. } | Self::Random { .. } => options.require_k().map(Some),
            Self::VonNeumann { r, .. } => Ok(Some(delannoy(n_dimensions, *r))),
        }
    }

    /// Check the topology against the options and swarm size.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::InvalidTopology`] if `k < 1` or `k > n_particles`, and
    /// [`SwarmError::InvalidOption`] if `k` or `p` is required but missing, or if a rewiring
    /// period or Von Neumann range is zero.
    pub fn validate(
        &self,
        options: &SwarmOptions,
        n_particles: usize,
        n_dimensions: usize,
    ) -> SwarmResult<()> {
        if let Self::VonNeumann { r: 0, .. } = self {
            return Err(SwarmError::invalid_option("r", "range must be at least 1"));
        }
        if let Self::Ring { rewire } | Self::VonNeumann { rewire, .. } | Self::Random { rewire } =
            self
        {
            if *rewire == Rewire::Every(0) {
                return Err(SwarmError::invalid_option(
                    "rewire",
                    "period must be at least 1",
                ));
            }
            if matches!(self, Self::Ring { .. } | Self::VonNeumann { .. })
                && matches!(rewire, Rewire::Every(_))
            {
                options.require_p()?;
            }
        }
        if let Some(k) = self.neighbor_count(options, n_dimensions)? {
            if k < 1 || k > n_particles {
                return Err(SwarmError::InvalidTopology { k, n_particles });
            }
        }
        Ok(())
    }

    /// Rebuild the neighbor lists in `status` if they are due at iteration `step`.
    ///
    /// # Errors
    ///
    /// See [`Topology::validate`].
    pub fn update_neighbors(
        &self,
        options: &SwarmOptions,
        status: &mut SwarmStatus,
        step: usize,
        rng: &mut Rng,
    ) -> SwarmResult<()> {
        let (rewire, random) = match self {
            Self::Star => return Ok(()),
            Self::Ring { rewire } | Self::VonNeumann { rewire, .. } => (*rewire, false),
            Self::Random { rewire } => (*rewire, true),
        };
        let due = match rewire {
            Rewire::Static => status.neighbors.is_none(),
            Rewire::Every(r) => status.neighbors.is_none() || step % r.max(1) == 0,
        };
        if !due {
            return Ok(());
        }
        let n = status.n_particles();
        let k = self
            .neighbor_count(options, status.n_dimensions())?
            .unwrap_or(n);
        let neighbors = if random {
            random_neighbors(n, k, rng)
        } else {
            match rewire {
                Rewire::Static => index_neighbors(n, k),
                Rewire::Every(_) => nearest_neighbors(&status.position, k, options.require_p()?),
            }
        };
        tracing::trace!(step, "rebuilt neighbor graph");
        status.neighbors = Some(neighbors);
        Ok(())
    }

    /// Compute every particle's neighborhood best from the personal bests.
    ///
    /// Lists in `neighbors` must contain valid row indices. [`Topology::Star`] (or missing
    /// neighbor lists) broadcasts the overall best. The lowest index wins ties.
    pub fn compute_best(
        &self,
        pbest_pos: &DMatrix<Float>,
        pbest_cost: &DVector<Float>,
        neighbors: Option<&[Vec<usize>]>,
    ) -> (DMatrix<Float>, DVector<Float>) {
        let n = pbest_cost.len();
        let mut best_pos = DMatrix::zeros(n, pbest_pos.ncols());
        let mut best_cost = DVector::from_element(n, Float::INFINITY);
        let costs = pbest_cost.as_slice();
        let global = argmin_of(costs, 0..n);
        for i in 0..n {
            let best = match (self, neighbors) {
                (Self::Star, _) | (_, None) => global,
                (_, Some(neighbors)) => argmin_of(costs, neighbors[i].iter().copied()),
            };
            if let Some(b) = best {
                best_pos.set_row(i, &pbest_pos.row(b));
                best_cost[i] = costs[b];
            }
        }
        (best_pos, best_cost)
    }
}

/// The Delannoy number $`D(m, n)`$, the number of lattice paths from `(0, 0)` to `(m, n)` using
/// unit steps north, east and north-east.
pub fn delannoy(m: usize, n: usize) -> usize {
    let mut row = vec![1usize; n + 1];
    for _ in 0..m {
        let mut diagonal = 1;
        for j in 1..=n {
            let up = row[j];
            row[j] = row[j]
                .saturating_add(row[j - 1])
                .saturating_add(diagonal);
            diagonal = up;
        }
    }
    row[n]
}

fn index_neighbors(n: usize, k: usize) -> Vec<Vec<usize>> {
    (0..n)
        .map(|i| {
            (0..k)
                .map(|m| {
                    let step = (m + 1) / 2;
                    if m % 2 == 1 {
                        (i + step) % n
                    } else {
                        (i + n - step % n) % n
                    }
                })
                .collect()
        })
        .collect()
}

fn minkowski(a: impl Iterator<Item = Float>, p: u32) -> Float {
    match p {
        1 => a.map(Float::abs).sum(),
        _ => a.map(|d| d * d).sum::<Float>().sqrt(),
    }
}

fn nearest_neighbors(positions: &DMatrix<Float>, k: usize, p: u32) -> Vec<Vec<usize>> {
    let n = positions.nrows();
    (0..n)
        .map(|i| {
            let mut candidates = (0..n)
                .map(|j| {
                    let diff = positions
                        .row(i)
                        .iter()
                        .zip(positions.row(j).iter())
                        .map(|(a, b)| a - b)
                        .collect::<Vec<_>>();
                    (minkowski(diff.into_iter(), p), j != i, j)
                })
                .collect::<Vec<_>>();
            candidates.sort_by(|a, b| {
                a.0.total_cmp(&b.0)
                    .then(a.1.cmp(&b.1))
                    .then(a.2.cmp(&b.2))
            });
            candidates.into_iter().take(k).map(|(_, _, j)| j).collect()
        })
        .collect()
}

fn random_neighbors(n: usize, k: usize, rng: &mut Rng) -> Vec<Vec<usize>> {
    (0..n)
        .map(|i| {
            let mut others = (0..n).filter(|&j| j != i).collect::<Vec<_>>();
            rng.shuffle(&mut others);
            std::iter::once(i)
                .chain(others.into_iter().take(k.saturating_sub(1)))
                .collect()
        })
        .collect()
}
