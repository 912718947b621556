//! CSV loading
//!
//! Reads labelled pixel rows (`label, p0, p1, ...`) and scales the pixel
//! intensities into [0, 1].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::batch::Batch;
use crate::error::{Error, Result};

/// How to read a labelled pixel CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Number of classes; labels must be below this
    pub num_classes: usize,
    /// Skip the first line
    pub has_header: bool,
    /// Largest raw pixel value; features are divided by it
    pub pixel_scale: f64,
    /// Read at most this many rows
    pub limit: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            num_classes: 10,
            has_header: true,
            pixel_scale: 255.0,
            limit: None,
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.num_classes == 0 {
            return Err(Error::InvalidConfiguration(
                "num_classes must be positive".to_string(),
            ));
        }
        if !self.pixel_scale.is_finite() || self.pixel_scale <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "pixel_scale must be positive, got {}",
                self.pixel_scale
            )));
        }
        Ok(())
    }
}

/// Scaled features with their integer labels
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// One sample per row, values in [0, 1]
    pub features: Array2<f64>,
    pub labels: Vec<usize>,
    pub num_classes: usize,
}

impl Dataset {
    pub fn new(features: Array2<f64>, labels: Vec<usize>, num_classes: usize) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(Error::shape_mismatch(
                "dataset labels",
                features.nrows(),
                labels.len(),
            ));
        }
        Ok(Self {
            features,
            labels,
            num_classes,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn input_dim(&self) -> usize {
        self.features.ncols()
    }

    /// One-hot encode the labels into a training batch
    pub fn to_batch(&self) -> Result<Batch> {
        Batch::from_labels(self.features.clone(), &self.labels, self.num_classes)
    }

    /// Shuffle with a seeded generator, then cut into `(first, second)` where
    /// `first` holds `fraction` of the rows
    pub fn split(&self, fraction: f64, seed: u64) -> Result<(Dataset, Dataset)> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(Error::InvalidConfiguration(format!(
                "split fraction must be in (0, 1), got {}",
                fraction
            )));
        }

        let n = self.len();
        let cut = (n as f64 * fraction).round() as usize;
        if cut == 0 || cut == n {
            return Err(Error::InvalidConfiguration(format!(
                "split of {} rows at {} leaves an empty side",
                n, fraction
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(seed));
        let (head, tail) = indices.split_at(cut);

        Ok((self.select(head), self.select(tail)))
    }

    fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            num_classes: self.num_classes,
        }
    }
}

/// Load a labelled pixel CSV from disk
pub fn load_csv<P: AsRef<Path>>(path: P, config: &LoaderConfig) -> Result<Dataset> {
    let file = File::open(&path)?;
    let dataset = read_csv(file, config)?;
    info!(
        "Loaded {} samples with {} features from {}",
        dataset.len(),
        dataset.input_dim(),
        path.as_ref().display()
    );
    Ok(dataset)
}

/// Parse labelled pixel rows from any reader
pub fn read_csv<R: Read>(source: R, config: &LoaderConfig) -> Result<Dataset> {
    config.validate()?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(config.has_header)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut labels = Vec::new();
    let mut values = Vec::new();
    let mut width = 0;

    for result in reader.records() {
        if config.limit.map_or(false, |limit| labels.len() >= limit) {
            break;
        }
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());

        if record.len() < 2 {
            return Err(Error::InvalidData(format!(
                "line {}: expected a label and at least one pixel",
                line
            )));
        }
        width = record.len() - 1;

        let label: usize = record[0].parse().map_err(|_| {
            Error::InvalidData(format!("line {}: bad label '{}'", line, &record[0]))
        })?;
        if label >= config.num_classes {
            return Err(Error::InvalidData(format!(
                "line {}: label {} out of range for {} classes",
                line, label, config.num_classes
            )));
        }

        for field in record.iter().skip(1) {
            let value: f64 = field.parse().map_err(|_| {
                Error::InvalidData(format!("line {}: bad pixel '{}'", line, field))
            })?;
            if !(0.0..=config.pixel_scale).contains(&value) {
                return Err(Error::InvalidData(format!(
                    "line {}: pixel {} outside [0, {}]",
                    line, value, config.pixel_scale
                )));
            }
            values.push(value / config.pixel_scale);
        }
        labels.push(label);
    }

    if labels.is_empty() {
        return Err(Error::InvalidData("no data rows".to_string()));
    }

    let features = Array2::from_shape_vec((labels.len(), width), values)
        .map_err(|e| Error::InvalidData(e.to_string()))?;
    Dataset::new(features, labels, config.num_classes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "label,p0,p1,p2\n3,0,255,51\n7,255,0,0\n0,102,102,102\n";

    #[test]
    fn test_read_csv_scales_pixels() {
        let dataset = read_csv(SAMPLE.as_bytes(), &LoaderConfig::default()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.input_dim(), 3);
        assert_eq!(dataset.labels, vec![3, 7, 0]);
        assert_relative_eq!(dataset.features[[0, 1]], 1.0);
        assert_relative_eq!(dataset.features[[0, 2]], 0.2);
        assert!(dataset.features.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_limit_and_headerless() {
        let config = LoaderConfig {
            has_header: false,
            limit: Some(2),
            ..LoaderConfig::default()
        };
        let dataset = read_csv("1,0,0\n2,0,0\n3,0,0\n".as_bytes(), &config).unwrap();
        assert_eq!(dataset.labels, vec![1, 2]);
    }

    #[test]
    fn test_bad_rows_rejected() {
        let config = LoaderConfig::default();
        let out_of_range = "label,p0\n10,0\n";
        assert!(matches!(
            read_csv(out_of_range.as_bytes(), &config),
            Err(Error::InvalidData(_))
        ));

        let bad_pixel = "label,p0\n1,300\n";
        assert!(matches!(
            read_csv(bad_pixel.as_bytes(), &config),
            Err(Error::InvalidData(_))
        ));

        let ragged = "label,p0,p1\n1,0,0\n2,0\n";
        assert!(matches!(
            read_csv(ragged.as_bytes(), &config),
            Err(Error::Csv(_))
        ));

        assert!(matches!(
            read_csv("label,p0\n".as_bytes(), &config),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_load_csv_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let dataset = load_csv(file.path(), &LoaderConfig::default()).unwrap();
        let batch = dataset.to_batch().unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.num_classes(), 10);
        assert_eq!(batch.labels(), vec![3, 7, 0]);
    }

    #[test]
    fn test_missing_file() {
        let result = load_csv("/nonexistent/digits.csv", &LoaderConfig::default());
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_split_is_seeded_and_complete() {
        let features = Array2::from_shape_fn((10, 2), |(i, j)| (i * 2 + j) as f64 / 20.0);
        let dataset = Dataset::new(features, (0..10).map(|i| i % 10).collect(), 10).unwrap();

        let (a1, b1) = dataset.split(0.8, 7).unwrap();
        let (a2, b2) = dataset.split(0.8, 7).unwrap();
        assert_eq!(a1, a2);
        assert_eq!(b1, b2);
        assert_eq!(a1.len(), 8);
        assert_eq!(b1.len(), 2);

        let mut all: Vec<usize> = a1.labels.iter().chain(b1.labels.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());

        assert!(dataset.split(1.0, 7).is_err());
        assert!(dataset.split(0.01, 7).is_err());
    }
}
