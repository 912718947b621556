//! Data Module
//!
//! Supplies training batches to the network:
//! - CSV loading of labelled pixel rows, scaled to [0, 1]
//! - One-hot label encoding
//! - The `Batch` type consumed by the training loop

mod batch;
mod encoding;
mod loader;

pub use batch::Batch;
pub use encoding::one_hot;
pub use loader::{load_csv, read_csv, Dataset, LoaderConfig};
