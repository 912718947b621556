//! Activation Functions
//!
//! ReLU for the hidden layer and a numerically stable row-wise softmax for the
//! output layer, plus the ReLU derivative used during backpropagation.

use ndarray::Array2;

/// Rectified Linear Unit: max(0, x)
pub fn relu(x: &Array2<f64>) -> Array2<f64> {
    x.mapv(|v| v.max(0.0))
}

/// Derivative of ReLU evaluated at the pre-activation values.
///
/// The derivative at exactly zero is taken to be 0, so a unit sitting on the
/// kink passes no gradient back.
pub fn relu_derivative(x: &Array2<f64>) -> Array2<f64> {
    x.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
}

/// Row-wise softmax: exp(x_i - max) / sum_j exp(x_j - max)
///
/// Subtracting the row maximum keeps every exponent <= 0, so large logits
/// cannot overflow.
pub fn softmax(x: &Array2<f64>) -> Array2<f64> {
    let mut output = x.clone();
    for mut row in output.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_relu() {
        let x = array![[-1.0, 0.0, 1.0, 2.0]];
        assert_eq!(relu(&x), array![[0.0, 0.0, 1.0, 2.0]]);
    }

    #[test]
    fn test_relu_derivative_at_zero_is_zero() {
        let x = array![[-0.5, 0.0, 1e-12, 3.0]];
        assert_eq!(relu_derivative(&x), array![[0.0, 0.0, 1.0, 1.0]]);
    }

    #[test]
    fn test_softmax_rows_sum_to_one() {
        let x = array![[1.0, 2.0, 3.0], [-4.0, 0.0, 4.0], [0.0, 0.0, 0.0]];
        let y = softmax(&x);
        for row in y.rows() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-12);
            assert!(row.iter().all(|&p| p > 0.0 && p < 1.0));
        }
        assert_relative_eq!(y[[2, 0]], 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_softmax_large_logits_do_not_overflow() {
        let x = array![[1000.0, 1001.0], [-1000.0, -1000.0]];
        let y = softmax(&x);
        assert!(y.iter().all(|v| v.is_finite()));
        assert_relative_eq!(y[[0, 1]], 1.0 / (1.0 + (-1.0f64).exp()), epsilon = 1e-12);
        assert_relative_eq!(y[[1, 0]], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_softmax_is_shift_invariant() {
        let a = softmax(&array![[0.1, 0.7, -0.3]]);
        let b = softmax(&array![[10.1, 10.7, 9.7]]);
        for (p, q) in a.iter().zip(b.iter()) {
            assert_relative_eq!(p, q, epsilon = 1e-12);
        }
    }
}
