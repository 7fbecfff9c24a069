use std::convert::Infallible;

use crate::{traits::CostFunction, DVector, Float};

/// The Rosenbrock function, a non-convex function with a single minimum in a long curved valley.
///
/// ```math
/// f(\vec{x}) = \sum_{i=1}^{n-1} \left[100(x_{i+1} - x_i^2)^2 + (1 - x_i)^2 \right]
/// ```
/// This function has a minimum at $`f(\vec{1}) = 0`$. A one-dimensional input evaluates to zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rosenbrock;
impl CostFunction for Rosenbrock {
    fn evaluate(&self, x: &DVector<Float>, _user_data: &()) -> Result<Float, Infallible> {
        #[allow(clippy::suboptimal_flops)]
        Ok(x.as_slice()
            .windows(2)
            .map(|w| 100.0 * (w[1] - w[0].powi(2)).powi(2) + (1.0 - w[0]).powi(2))
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    #[test]
    fn test_rosenbrock() {
        assert_eq!(Rosenbrock.evaluate(&dvector![1.0, 1.0, 1.0], &()).unwrap(), 0.0);
        assert_eq!(Rosenbrock.evaluate(&dvector![0.0, 0.0], &()).unwrap(), 1.0);
    }
}
