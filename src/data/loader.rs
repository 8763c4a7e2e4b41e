//! Bundled dataset resources

use crate::core::{Dataset, Result, VoteError};
use crate::data::csv::{CsvLoader, LoaderOptions};
use log::info;
use std::path::{Path, PathBuf};

const BANK_SAMPLE: &str = include_str!("../../data/bank.csv");
const BANK_FULL: &str = include_str!("../../data/bank-full.csv");

/// One of the two bundled datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// The reduced sample, `bank.csv`
    Sample,
    /// The complete dataset, `bank-full.csv`
    Full,
}

impl DataSource {
    pub fn from_full_flag(full: bool) -> Self {
        if full {
            Self::Full
        } else {
            Self::Sample
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Sample => "bank.csv",
            Self::Full => "bank-full.csv",
        }
    }

    /// Relation name given to the loaded dataset
    pub fn relation(&self) -> &'static str {
        match self {
            Self::Sample => "bank",
            Self::Full => "bank-full",
        }
    }

    /// Contents compiled into the binary
    pub fn bundled(&self) -> &'static str {
        match self {
            Self::Sample => BANK_SAMPLE,
            Self::Full => BANK_FULL,
        }
    }
}

/// Locates and parses the dataset resources
///
/// Without a data directory the copies compiled into the binary are used;
/// with one, the files of the same name in that directory replace them.
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    data_dir: Option<PathBuf>,
    loader: CsvLoader,
}

impl DataLoader {
    /// Create a loader reading resources from `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            loader: CsvLoader::new(),
        }
    }

    /// Create a loader reading the resources compiled into the binary
    pub fn bundled() -> Self {
        Self::default()
    }

    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.loader = CsvLoader::with_options(options);
        self
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Path of a resource, `None` when reading the bundled copies
    pub fn path_for(&self, source: DataSource) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|dir| dir.join(source.file_name()))
    }

    /// Load the full dataset when `full` is set, the sample otherwise
    pub fn load(&self, full: bool) -> Result<Dataset> {
        self.load_source(DataSource::from_full_flag(full))
    }

    pub fn load_source(&self, source: DataSource) -> Result<Dataset> {
        let Some(path) = self.path_for(source) else {
            info!("Loading bundled {}", source.file_name());
            return self
                .loader
                .load_reader(source.relation(), source.bundled().as_bytes());
        };

        if !path.is_file() {
            return Err(VoteError::LoadError(format!(
                "resource {} not found in {}",
                source.file_name(),
                path.parent().unwrap_or(&path).display()
            )));
        }
        self.load_file(&path)
    }

    /// Load any file with this loader's parsing options
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let path = path.as_ref();
        info!("Loading {}", path.display());
        self.loader.load_file(path)
    }
}
