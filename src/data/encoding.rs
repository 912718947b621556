//! Label encoding

use ndarray::Array2;

use crate::error::{Error, Result};

/// One row per label with a single 1.0 at the label's class index
pub fn one_hot(labels: &[usize], num_classes: usize) -> Result<Array2<f64>> {
    if num_classes == 0 {
        return Err(Error::InvalidConfiguration(
            "num_classes must be positive".to_string(),
        ));
    }

    let mut encoded = Array2::zeros((labels.len(), num_classes));
    for (row, &label) in labels.iter().enumerate() {
        if label >= num_classes {
            return Err(Error::InvalidData(format!(
                "label {} out of range for {} classes",
                label, num_classes
            )));
        }
        encoded[[row, label]] = 1.0;
    }
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_one_hot() {
        let encoded = one_hot(&[0, 2, 1], 3).unwrap();
        assert_eq!(
            encoded,
            array![[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]]
        );
    }

    #[test]
    fn test_one_hot_rows_sum_to_one() {
        let labels: Vec<usize> = (0..25).map(|i| i % 10).collect();
        let encoded = one_hot(&labels, 10).unwrap();
        assert_eq!(encoded.dim(), (25, 10));
        assert!(encoded.rows().into_iter().all(|row| row.sum() == 1.0));
    }

    #[test]
    fn test_label_out_of_range() {
        assert!(matches!(one_hot(&[0, 10], 10), Err(Error::InvalidData(_))));
        assert!(matches!(
            one_hot(&[0], 0),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
