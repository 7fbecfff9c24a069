use crate::{DMatrix, Float};
use fastrand::Rng;
use fastrand_contrib::RngExt;

/// Fill an `n_rows × n_cols` matrix with uniform draws in `[lb, ub)`.
///
/// Values are drawn row by row so that the sequence of draws for particle `i` is contiguous.
pub(crate) fn random_matrix(
    n_rows: usize,
    n_cols: usize,
    lb: Float,
    ub: Float,
    rng: &mut Rng,
) -> DMatrix<Float> {
    let values = (0..n_rows * n_cols)
        .map(|_| rng.range(lb, ub))
        .collect::<Vec<_>>();
    DMatrix::from_row_slice(n_rows, n_cols, &values)
}

/// The logistic sigmoid $`1 / (1 + e^{-v})`$.
pub(crate) fn sigmoid(v: Float) -> Float {
    1.0 / (1.0 + Float::exp(-v))
}

/// Index of the smallest value among `candidates`, lowest index winning ties.
///
/// `NaN` values never win against finite ones.
pub(crate) fn argmin_of<I: IntoIterator<Item = usize>>(
    values: &[Float],
    candidates: I,
) -> Option<usize> {
    candidates.into_iter().fold(None, |best, i| match best {
        None => Some(i),
        Some(b) if values[i] < values[b] || (values[i] == values[b] && i < b) => Some(i),
        Some(b) if values[b].is_nan() && !values[i].is_nan() => Some(i),
        keep => keep,
    })
}

/// A helper trait to get feature-gated floating-point random values
pub trait SampleFloat {
    /// Get a random value in a range
    fn range(&mut self, lower: Float, upper: Float) -> Float;
    /// Get a random value in the range [0, 1)
    fn float(&mut self) -> Float;
}
impl SampleFloat for Rng {
    #[cfg(not(feature = "f32"))]
    fn range(&mut self, lower: Float, upper: Float) -> Float {
        self.f64_range(lower..upper)
    }
    #[cfg(feature = "f32")]
    fn range(&mut self, lower: Float, upper: Float) -> Float {
        self.f32_range(lower..upper)
    }
    #[cfg(not(feature = "f32"))]
    fn float(&mut self) -> Float {
        self.f64()
    }
    #[cfg(feature = "f32")]
    fn float(&mut self) -> Float {
        self.f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_random_matrix_shape_and_range() {
        let mut rng = Rng::with_seed(0);
        let m = random_matrix(7, 3, -2.0, 3.0, &mut rng);
        assert_eq!(m.shape(), (7, 3));
        assert!(m.iter().all(|v| (-2.0..3.0).contains(v)));
    }

    #[test]
    fn test_random_matrix_is_seeded() {
        let a = random_matrix(4, 4, 0.0, 1.0, &mut Rng::with_seed(42));
        let b = random_matrix(4, 4, 0.0, 1.0, &mut Rng::with_seed(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_sigmoid() {
        assert_relative_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.9999);
        assert!(sigmoid(-10.0) < 0.0001);
    }

    #[test]
    fn test_argmin_ties_and_nan() {
        let values = [3.0, 1.0, 1.0, Float::NAN, 0.5];
        assert_eq!(argmin_of(&values, 0..3), Some(1));
        assert_eq!(argmin_of(&values, [2, 1]), Some(1));
        assert_eq!(argmin_of(&values, [3, 0]), Some(0));
        assert_eq!(argmin_of(&values, 0..5), Some(4));
        assert_eq!(argmin_of(&values, std::iter::empty()), None);
    }
}
