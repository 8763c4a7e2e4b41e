//! Data loading and partitioning
//!
//! This module reads delimited text resources into datasets and splits them
//! into training and test partitions.

pub mod csv;
pub mod loader;
pub mod split;

pub use self::csv::{ClassColumn, CsvLoader, LoaderOptions};
pub use self::loader::{DataLoader, DataSource};
pub use self::split::{train_test_split, train_size, DEFAULT_SEED, DEFAULT_TRAIN_PROPORTION};
