use crate::{DVector, Float};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Describes a point in parameter space together with its evaluation.
#[derive(Clone, Default, Debug, Serialize, Deserialize)]
pub struct Point {
    /// the point's position
    pub x: DVector<Float>,
    /// the point's evaluation (`None` if the point has not yet been evaluated)
    pub fx: Option<Float>,
}

impl Point {
    /// Construct an evaluated [`Point`].
    pub const fn new(x: DVector<Float>, fx: Float) -> Self {
        Self { x, fx: Some(fx) }
    }
    /// The evaluation of the point, or `+inf` if it has not been evaluated.
    pub fn fx_or_inf(&self) -> Float {
        self.fx.unwrap_or(Float::INFINITY)
    }
    /// The dimension of the point's position.
    pub fn dimension(&self) -> usize {
        self.x.len()
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "x: {:?}, f(x): {:?}",
            self.x.iter().collect::<Vec<_>>(),
            self.fx
        )
    }
}

impl From<Vec<Float>> for Point {
    fn from(value: Vec<Float>) -> Self {
        Self {
            x: DVector::from_vec(value),
            fx: None,
        }
    }
}
impl From<DVector<Float>> for Point {
    fn from(value: DVector<Float>) -> Self {
        Self { x: value, fx: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    #[test]
    fn test_evaluation() {
        let p = Point::new(dvector![1.0, 2.0], 5.0);
        assert_eq!(p.fx_or_inf(), 5.0);
        assert_eq!(p.dimension(), 2);
        assert_eq!(Point::from(vec![0.0]).fx_or_inf(), Float::INFINITY);
    }

    #[test]
    fn test_display() {
        let s = format!("{}", Point::from(vec![1.0, 2.0]));
        assert!(s.contains("x:"));
        assert!(s.contains("f(x):"));
    }
}
