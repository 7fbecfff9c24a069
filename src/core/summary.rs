use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{core::Bounds, DVector, Float};

/// A struct that holds the results of a swarm optimization run.
///
/// `best_position`, `best_cost` and `cost_history` form the narrow result contract consumed by
/// downstream tooling; the remaining fields are diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SwarmSummary {
    /// The bounds of the parameters. This is `None` if no bounds were set.
    pub bounds: Option<Bounds>,
    /// The names of the parameters. This is `None` if no names were set.
    pub parameter_names: Option<Vec<String>>,
    /// A message describing how the run ended.
    pub message: String,
    /// The position which produced [`SwarmSummary::best_cost`].
    pub best_position: DVector<Float>,
    /// The lowest cost found by any particle.
    pub best_cost: Float,
    /// The lowest personal-best cost of the swarm after every iteration (non-increasing).
    pub cost_history: Vec<Float>,
    /// The mean personal-best cost of the swarm after every iteration.
    pub mean_pbest_history: Vec<Float>,
    /// The mean neighborhood-best cost of the swarm after every iteration.
    pub mean_neighbor_history: Vec<Float>,
    /// The number of completed iterations.
    pub iterations: usize,
    /// The number of single-particle objective evaluations.
    pub cost_evals: usize,
    /// Flag that says whether or not the run was flagged as converged by a terminator.
    pub converged: bool,
}

impl SwarmSummary {
    /// Set the names associated with each parameter.
    pub fn with_parameter_names<I: IntoIterator<Item = T>, T: AsRef<str>>(
        mut self,
        parameter_names: I,
    ) -> Self {
        self.parameter_names = Some(
            parameter_names
                .into_iter()
                .map(|name| name.as_ref().to_string())
                .collect(),
        );
        self
    }

    /// The `(best_cost, best_position, cost_history)` triple.
    pub fn result(&self) -> (Float, &DVector<Float>, &[Float]) {
        (self.best_cost, &self.best_position, &self.cost_history)
    }
}

impl Display for SwarmSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use tabled::{
            builder::Builder,
            settings::{
                object::Row, style::HorizontalLine, themes::BorderCorrection, Alignment, Color,
                Padding, Span, Style, Theme,
            },
        };
        let mut builder = Builder::default();
        builder.push_record(["SWARM RESULTS"]);
        builder.push_record(["Status", "f(x)", "#iter", "#f(x)"]);
        builder.push_record([
            if self.converged {
                "Converged"
            } else {
                "Finished"
            }
            .to_string(),
            format!("{:.5}", self.best_cost),
            self.iterations.to_string(),
            self.cost_evals.to_string(),
        ]);
        builder.push_record(["Message", &self.message]);
        builder.push_record(["Parameter", "=", "Lower", "Upper"]);
        for (i, v) in self.best_position.iter().enumerate() {
            let name = self
                .parameter_names
                .as_ref()
                .and_then(|names| names.get(i).cloned())
                .unwrap_or_else(|| format!("x_{i}"));
            let (lower, upper) = self.bounds.as_ref().map_or_else(
                || ("-inf".to_string(), "+inf".to_string()),
                |b| {
                    let (lb, ub) = b.limits(i);
                    (format!("{lb:.5}"), format!("{ub:.5}"))
                },
            );
            builder.push_record([name, format!("{v:.5}"), lower, upper]);
        }
        let mut table = builder.build();
        let mut style = Theme::from_style(Style::rounded().remove_horizontals());
        for line in 1..=4 {
            style.insert_horizontal_line(line, HorizontalLine::inherit(Style::modern()));
        }
        table
            .with(style)
            .modify(
                Row::from(0),
                (Padding::new(1, 1, 1, 1), Alignment::center(), Color::BOLD),
            )
            .modify((0, 0), Span::column(4))
            .modify(Row::from(1), Color::BOLD)
            .modify((3, 0), Color::BOLD)
            .modify((3, 1), Span::column(3))
            .modify(Row::from(4), Color::BOLD)
            .with(BorderCorrection::span());
        f.write_str(&table.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    fn summary() -> SwarmSummary {
        SwarmSummary {
            bounds: Some(Bounds::from_pairs([(-10.0, 10.0), (-10.0, 10.0)]).unwrap()),
            parameter_names: None,
            message: "Completed 3 iterations".to_string(),
            best_position: dvector![0.25, -0.5],
            best_cost: 0.3125,
            cost_history: vec![4.0, 1.0, 0.3125],
            mean_pbest_history: vec![9.0, 3.0, 1.5],
            mean_neighbor_history: vec![4.0, 1.0, 0.3125],
            iterations: 3,
            cost_evals: 30,
            converged: false,
        }
    }

    #[test]
    fn test_summary_display() {
        let text = summary().with_parameter_names(["alpha", "beta"]).to_string();
        assert!(text.contains("SWARM RESULTS"));
        assert!(text.contains("alpha"));
        assert!(text.contains("beta"));
        assert!(text.contains("0.31250"));
        assert!(text.contains("Completed 3 iterations"));
        let text = summary().to_string();
        assert!(text.contains("x_0"));
        assert!(text.contains("x_1"));
    }

    #[test]
    fn test_result_triple() {
        let s = summary();
        let (cost, pos, history) = s.result();
        assert_eq!(cost, 0.3125);
        assert_eq!(pos, &dvector![0.25, -0.5]);
        assert_eq!(history.last(), Some(&cost));
    }
}
