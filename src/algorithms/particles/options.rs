use serde::{Deserialize, Serialize};

use crate::{error::SwarmError, Float, SwarmResult};

/// How a coefficient changes over the course of a run.
///
/// `t = min(step, over) / over` is the fraction of the schedule which has elapsed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CoefficientSchedule {
    /// Keep the starting value for the whole run
    #[default]
    Constant,
    /// Move linearly from the starting value to `end` over `over` iterations
    Linear {
        /// The value reached after `over` iterations
        end: Float,
        /// The number of iterations the transition takes
        over: usize,
    },
    /// Decay as $`end + (start - end)(1 - t)^\alpha`$
    NonlinearDecay {
        /// The value reached after `over` iterations
        end: Float,
        /// The decay exponent (`1.0` is linear)
        alpha: Float,
        /// The number of iterations the transition takes
        over: usize,
    },
}

impl CoefficientSchedule {
    /// The value of a coefficient starting at `start` at the given iteration.
    pub fn value(&self, start: Float, step: usize) -> Float {
        match *self {
            Self::Constant => start,
            Self::Linear { end, over } => {
                let t = Self::elapsed(step, over);
                (end - start).mul_add(t, start)
            }
            Self::NonlinearDecay { end, alpha, over } => {
                let t = Self::elapsed(step, over);
                (start - end).mul_add((1.0 - t).powf(alpha), end)
            }
        }
    }

    fn elapsed(step: usize, over: usize) -> Float {
        if over == 0 {
            return 1.0;
        }
        step.min(over) as Float / over as Float
    }

    fn end(&self) -> Option<Float> {
        match *self {
            Self::Constant => None,
            Self::Linear { end, .. } | Self::NonlinearDecay { end, .. } => Some(end),
        }
    }

    fn validate(&self, name: &str) -> SwarmResult<()> {
        match *self {
            Self::Constant => Ok(()),
            Self::Linear { over, .. } if over == 0 => Err(SwarmError::invalid_option(
                name,
                "schedules must run over at least one iteration",
            )),
            Self::NonlinearDecay { alpha, over, .. } => {
                if over == 0 {
                    return Err(SwarmError::invalid_option(
                        name,
                        "schedules must run over at least one iteration",
                    ));
                }
                if !(alpha.is_finite() && alpha > 0.0) {
                    return Err(SwarmError::invalid_option(
                        name,
                        format!("decay exponent must be positive, got {alpha}"),
                    ));
                }
                Ok(())
            }
            Self::Linear { .. } => Ok(()),
        }
    }
}

/// The coefficients in effect for one iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficients {
    /// Cognitive coefficient
    pub c1: Float,
    /// Social coefficient
    pub c2: Float,
    /// Inertia weight
    pub w: Float,
}

/// The numeric options of a swarm.
///
/// `c1` weighs the pull toward each particle's own best, `c2` the pull toward its neighborhood
/// best and `w` the inertia of the previous velocity. `k` (neighbor count, or the Von Neumann
/// range) and `p` (Minkowski norm, `1` or `2`) are only read by local topologies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwarmOptions {
    /// Cognitive coefficient (must be positive)
    pub c1: Float,
    /// Social coefficient (must be positive)
    pub c2: Float,
    /// Inertia weight (must be finite and non-negative)
    pub w: Float,
    /// Neighbor count for local topologies
    pub k: Option<usize>,
    /// Minkowski norm used to rank neighbors
    pub p: Option<u32>,
    /// Schedule applied to `w`
    pub w_schedule: CoefficientSchedule,
    /// Schedule applied to `c1`
    pub c1_schedule: CoefficientSchedule,
    /// Schedule applied to `c2`
    pub c2_schedule: CoefficientSchedule,
}

impl SwarmOptions {
    /// Options with the given coefficients, no neighborhood parameters and constant schedules.
    pub fn new(c1: Float, c2: Float, w: Float) -> Self {
        Self {
            c1,
            c2,
            w,
            k: None,
            p: None,
            w_schedule: CoefficientSchedule::Constant,
            c1_schedule: CoefficientSchedule::Constant,
            c2_schedule: CoefficientSchedule::Constant,
        }
    }

    /// Set the neighbor count `k` and Minkowski norm `p` used by local topologies.
    pub const fn with_neighbors(mut self, k: usize, p: u32) -> Self {
        self.k = Some(k);
        self.p = Some(p);
        self
    }

    /// Set the schedule of the inertia weight.
    pub const fn with_w_schedule(mut self, schedule: CoefficientSchedule) -> Self {
        self.w_schedule = schedule;
        self
    }

    /// Set the schedule of the cognitive coefficient.
    pub const fn with_c1_schedule(mut self, schedule: CoefficientSchedule) -> Self {
        self.c1_schedule = schedule;
        self
    }

    /// Set the schedule of the social coefficient.
    pub const fn with_c2_schedule(mut self, schedule: CoefficientSchedule) -> Self {
        self.c2_schedule = schedule;
        self
    }

    /// Build options from `(key, value)` pairs.
    ///
    /// The keys `c1`, `c2` and `w` are required; `k` and `p` are optional and must be
    /// non-negative integers.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::InvalidOption`] for unknown, repeated or missing keys and for
    /// non-integral `k` or `p`. The values themselves are checked by
    /// [`SwarmOptions::validate`].
    pub fn from_pairs<I, K>(pairs: I) -> SwarmResult<Self>
    where
        I: IntoIterator<Item = (K, Float)>,
        K: AsRef<str>,
    {
        let (mut c1, mut c2, mut w, mut k, mut p) = (None, None, None, None, None);
        for (key, value) in pairs {
            let key = key.as_ref();
            let slot = match key {
                "c1" => &mut c1,
                "c2" => &mut c2,
                "w" => &mut w,
                "k" => &mut k,
                "p" => &mut p,
                _ => return Err(SwarmError::invalid_option(key, "unknown option")),
            };
            if slot.replace(value).is_some() {
                return Err(SwarmError::invalid_option(key, "given more than once"));
            }
        }
        let missing = |name: &str| SwarmError::invalid_option(name, "missing required option");
        let mut options = Self::new(
            c1.ok_or_else(|| missing("c1"))?,
            c2.ok_or_else(|| missing("c2"))?,
            w.ok_or_else(|| missing("w"))?,
        );
        options.k = k.map(|v| integral("k", v)).transpose()?;
        options.p = p
            .map(|v| {
                let v = integral("p", v)?;
                u32::try_from(v).map_err(|_| {
                    SwarmError::invalid_option("p", format!("must be 1 (L1) or 2 (L2), got {v}"))
                })
            })
            .transpose()?;
        Ok(options)
    }

    /// Check the coefficient ranges and `p`.
    ///
    /// `k` depends on the swarm size and is checked by the
    /// [`Topology`](crate::algorithms::particles::Topology).
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::InvalidOption`] if `c1` or `c2` is not positive, `w` is negative or
    /// non-finite, `p` is not `1` or `2`, or a schedule is malformed.
    pub fn validate(&self) -> SwarmResult<()> {
        for (name, start, schedule) in [
            ("c1", self.c1, &self.c1_schedule),
            ("c2", self.c2, &self.c2_schedule),
        ] {
            for value in std::iter::once(start).chain(schedule.end()) {
                if !(value.is_finite() && value > 0.0) {
                    return Err(SwarmError::invalid_option(
                        name,
                        format!("must be positive and finite, got {value}"),
                    ));
                }
            }
            schedule.validate(name)?;
        }
        for value in std::iter::once(self.w).chain(self.w_schedule.end()) {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SwarmError::invalid_option(
                    "w",
                    format!("must be non-negative and finite, got {value}"),
                ));
            }
            if value > 1.0 {
                tracing::warn!(w = value, "inertia weight above 1 usually makes the swarm diverge");
            }
        }
        self.w_schedule.validate("w")?;
        if let Some(p) = self.p {
            if !(p == 1 || p == 2) {
                return Err(SwarmError::invalid_option(
                    "p",
                    format!("must be 1 (L1) or 2 (L2), got {p}"),
                ));
            }
        }
        Ok(())
    }

    /// The coefficients in effect at iteration `step`.
    pub fn coefficients(&self, step: usize) -> Coefficients {
        Coefficients {
            c1: self.c1_schedule.value(self.c1, step),
            c2: self.c2_schedule.value(self.c2, step),
            w: self.w_schedule.value(self.w, step),
        }
    }

    pub(crate) fn require_k(&self) -> SwarmResult<usize> {
        self.k
            .ok_or_else(|| SwarmError::invalid_option("k", "required by the selected topology"))
    }

    pub(crate) fn require_p(&self) -> SwarmResult<u32> {
        self.p
            .ok_or_else(|| SwarmError::invalid_option("p", "required by the selected topology"))
    }
}

fn integral(name: &str, value: Float) -> SwarmResult<usize> {
    if !(value.is_finite() && value >= 0.0 && value.fract() == 0.0) {
        return Err(SwarmError::invalid_option(
            name,
            format!("must be a non-negative integer, got {value}"),
        ));
    }
    Ok(value as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_pairs() {
        let options =
            SwarmOptions::from_pairs([("c1", 0.5), ("c2", 0.3), ("w", 0.9), ("k", 3.0), ("p", 2.0)])
                .unwrap();
        assert_eq!(options, SwarmOptions::new(0.5, 0.3, 0.9).with_neighbors(3, 2));
        let options = SwarmOptions::from_pairs(vec![
            ("w".to_string(), 0.7),
            ("c2".to_string(), 1.0),
            ("c1".to_string(), 1.5),
        ])
        .unwrap();
        assert_eq!(options.k, None);
        assert_eq!(options.c1, 1.5);
    }

    #[test]
    fn test_from_pairs_rejects_bad_keys() {
        let err = SwarmOptions::from_pairs([("c1", 0.5), ("c2", 0.3)]).unwrap_err();
        assert!(matches!(err, SwarmError::InvalidOption { ref name, .. } if name == "w"));
        let err =
            SwarmOptions::from_pairs([("c1", 0.5), ("c2", 0.3), ("w", 0.9), ("q", 1.0)])
                .unwrap_err();
        assert!(matches!(err, SwarmError::InvalidOption { ref name, .. } if name == "q"));
        let err = SwarmOptions::from_pairs([("c1", 0.5), ("c1", 0.3)]).unwrap_err();
        assert!(err.is_config_error());
        let err =
            SwarmOptions::from_pairs([("c1", 0.5), ("c2", 0.3), ("w", 0.9), ("k", 2.5)])
                .unwrap_err();
        assert!(matches!(err, SwarmError::InvalidOption { ref name, .. } if name == "k"));
    }

    #[test]
    fn test_from_pairs_rejects_p_beyond_u32() {
        let err = SwarmOptions::from_pairs([
            ("c1", 0.5),
            ("c2", 0.3),
            ("w", 0.9),
            ("k", 3.0),
            ("p", 4_294_967_297.0),
        ])
        .unwrap_err();
        assert!(matches!(err, SwarmError::InvalidOption { ref name, .. } if name == "p"));
        let err =
            SwarmOptions::from_pairs([("c1", 0.5), ("c2", 0.3), ("w", 0.9), ("p", 1e30)])
                .unwrap_err();
        assert!(matches!(err, SwarmError::InvalidOption { ref name, .. } if name == "p"));
        let options =
            SwarmOptions::from_pairs([("c1", 0.5), ("c2", 0.3), ("w", 0.9), ("p", 1.0)]).unwrap();
        assert_eq!(options.p, Some(1));
    }

    #[test]
    fn test_validate() {
        assert!(SwarmOptions::new(0.5, 0.3, 0.9).validate().is_ok());
        assert!(SwarmOptions::new(0.5, 0.3, 0.0).validate().is_ok());
        assert!(SwarmOptions::new(0.0, 0.3, 0.9).validate().is_err());
        assert!(SwarmOptions::new(0.5, -0.3, 0.9).validate().is_err());
        assert!(SwarmOptions::new(0.5, 0.3, Float::NAN).validate().is_err());
        assert!(SwarmOptions::new(0.5, 0.3, -0.1).validate().is_err());
        assert!(SwarmOptions::new(0.5, 0.3, 0.9)
            .with_neighbors(2, 3)
            .validate()
            .is_err());
        assert!(SwarmOptions::new(0.5, 0.3, 0.9)
            .with_w_schedule(CoefficientSchedule::Linear { end: 0.4, over: 0 })
            .validate()
            .is_err());
        assert!(SwarmOptions::new(0.5, 0.3, 0.9)
            .with_c1_schedule(CoefficientSchedule::Linear { end: 0.0, over: 10 })
            .validate()
            .is_err());
    }

    #[test]
    fn test_schedules() {
        let options = SwarmOptions::new(2.5, 0.5, 0.9)
            .with_w_schedule(CoefficientSchedule::Linear { end: 0.4, over: 10 })
            .with_c1_schedule(CoefficientSchedule::NonlinearDecay {
                end: 0.5,
                alpha: 2.0,
                over: 4,
            });
        let start = options.coefficients(0);
        assert_relative_eq!(start.w, 0.9);
        assert_relative_eq!(start.c1, 2.5);
        assert_relative_eq!(start.c2, 0.5);
        let mid = options.coefficients(5);
        assert_relative_eq!(mid.w, 0.65);
        let late = options.coefficients(2);
        // (2.5 - 0.5) * (1 - 0.5)^2 + 0.5
        assert_relative_eq!(late.c1, 1.0);
        let end = options.coefficients(100);
        assert_relative_eq!(end.w, 0.4);
        assert_relative_eq!(end.c1, 0.5);
    }
}
