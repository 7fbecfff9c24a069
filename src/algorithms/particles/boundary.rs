use crate::{core::Bounds, DMatrix, Float};
use fastrand::Rng;
use serde::{Deserialize, Serialize};

/// Methods for repairing particles which left the bounds after a position update.
///
/// Only coordinates outside of the bounds are touched, with the exception of
/// [`BoundaryHandler::Shrink`], which rescales the whole step of a violating particle. After
/// repair every coordinate lies inside the bounds. See [^1] for a comparison of these methods.
///
/// [^1]: [Chu, W., Gao, X., & Sorooshian, S. (2011). Handling boundary constraints for particle swarm optimization in high-dimensional search space. In Information Sciences (Vol. 181, Issue 20, pp. 4569–4581). Elsevier BV.](https://doi.org/10.1016/j.ins.2010.11.030)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryHandler {
    /// Clip to the nearest limit
    #[default]
    Nearest,
    /// Resample the coordinate uniformly inside its interval
    Random,
    /// Shorten the particle's step along its direction so it lands on the first boundary it
    /// crosses. Coordinates still outside afterwards (when the step started outside the box)
    /// are clipped to the nearest limit.
    Shrink,
    /// Mirror the coordinate at the violated limits as many times as needed
    Reflective,
    /// Move to the midpoint of the previous coordinate and the violated limit
    Intermediate,
    /// Wrap the coordinate around the interval into `[lower, upper)`
    ///
    /// Only violating coordinates are wrapped, and both limits count as inside. A coordinate
    /// sitting exactly on `upper` is therefore kept, while `lower - width` wraps to `lower`, so
    /// `repair(x + width) == repair(x)` holds everywhere except at the limits themselves.
    Periodic,
}

impl BoundaryHandler {
    /// Repair `candidate` in place. `previous` holds the positions before the update.
    pub fn repair(
        &self,
        candidate: &mut DMatrix<Float>,
        previous: &DMatrix<Float>,
        bounds: &Bounds,
        rng: &mut Rng,
    ) {
        match self {
            Self::Shrink => shrink(candidate, previous, bounds),
            _ => {
                for i in 0..candidate.nrows() {
                    for j in 0..candidate.ncols() {
                        let x = candidate[(i, j)];
                        if bounds.contains(j, x) {
                            continue;
                        }
                        candidate[(i, j)] =
                            self.repair_coordinate(x, previous[(i, j)], j, bounds, rng);
                    }
                }
            }
        }
    }

    fn repair_coordinate(
        &self,
        x: Float,
        previous: Float,
        j: usize,
        bounds: &Bounds,
        rng: &mut Rng,
    ) -> Float {
        let (lb, ub) = bounds.limits(j);
        let width = bounds.width(j);
        let repaired = match self {
            Self::Nearest | Self::Shrink => x,
            Self::Random => bounds.sample(j, rng),
            Self::Reflective => {
                let mut y = (x - lb).rem_euclid(2.0 * width);
                if y > width {
                    y = width.mul_add(2.0, -y);
                }
                lb + y
            }
            Self::Intermediate => {
                let limit = if x < lb { lb } else { ub };
                0.5 * (previous + limit)
            }
            Self::Periodic => lb + (x - lb).rem_euclid(width),
        };
        repaired.clamp(lb, ub)
    }
}

fn shrink(candidate: &mut DMatrix<Float>, previous: &DMatrix<Float>, bounds: &Bounds) {
    for i in 0..candidate.nrows() {
        let mut t: Float = 1.0;
        for j in 0..candidate.ncols() {
            let x = candidate[(i, j)];
            let excess = bounds.excess(j, x);
            if excess == 0.0 {
                continue;
            }
            let step = x - previous[(i, j)];
            let limit = if excess < 0.0 {
                bounds.lower()[j]
            } else {
                bounds.upper()[j]
            };
            if step != 0.0 {
                t = t.min((limit - previous[(i, j)]) / step);
            }
        }
        let t = t.clamp(0.0, 1.0);
        for j in 0..candidate.ncols() {
            let (lb, ub) = bounds.limits(j);
            let x = if t < 1.0 {
                let prev = previous[(i, j)];
                t.mul_add(candidate[(i, j)] - prev, prev)
            } else {
                candidate[(i, j)]
            };
            // a step starting outside the box can stay outside after shrinking
            candidate[(i, j)] = x.clamp(lb, ub);
        }
    }
}
