use crate::{traits::CostFunction, DVector, Float};
use std::convert::Infallible;

/// The Sphere function, a convex bowl with its minimum $`f(\vec{0}) = 0`$.
///
/// ```math
/// f(\vec{x}) = \sum_{i=1}^n x_i^2
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Sphere;
impl CostFunction for Sphere {
    fn evaluate(&self, x: &DVector<Float>, _user_data: &()) -> Result<Float, Infallible> {
        Ok(x.norm_squared())
    }
}
