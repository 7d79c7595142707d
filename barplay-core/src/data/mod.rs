//! Data source adapter.
//!
//! Produces a validated [`BarSequence`] from one of two origins:
//! 1. Seeded synthetic random walk (used when no user data is available)
//! 2. Delimited-file import (header-identified columns, bad rows dropped)
//!
//! No indicator math happens here. When an import yields nothing usable the
//! caller falls back to the synthetic generator; [`load_with_fallback`] is
//! that policy.

pub mod import;
pub mod synthetic;
pub mod timestamp;

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{BarError, BarSequence};

pub use import::{import_bytes, import_path, import_reader, import_str, ImportReport, Imported, DEFAULT_VOLUME};
pub use synthetic::{SyntheticSource, SyntheticSpec};
pub use timestamp::parse_timestamp;

/// Errors from the data layer.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no valid rows in import ({rows_read} rows read)")]
    EmptyDataset { rows_read: usize },

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Bar(#[from] BarError),
}

/// Where the session's bars came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataOrigin {
    Synthetic { seed: u64 },
    Import {
        label: String,
        report: ImportReport,
    },
}

impl DataOrigin {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, DataOrigin::Synthetic { .. })
    }
}

/// Bars plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedBars {
    pub bars: BarSequence,
    pub origin: DataOrigin,
}

/// Anything that can produce a bar sequence.
pub trait BarSource {
    fn load(&self) -> Result<LoadedBars, DataError>;
}

/// Imports a delimited file from disk.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BarSource for CsvFileSource {
    fn load(&self) -> Result<LoadedBars, DataError> {
        let imported = import_path(&self.path)?;
        Ok(LoadedBars {
            bars: imported.bars,
            origin: DataOrigin::Import {
                label: self.path.display().to_string(),
                report: imported.report,
            },
        })
    }
}

/// Load from `primary`; on any error, log it and use the synthetic `fallback`.
///
/// Returns the loaded bars and the error that forced the fallback, if any.
pub fn load_with_fallback(
    primary: &dyn BarSource,
    fallback: &SyntheticSource,
) -> (LoadedBars, Option<DataError>) {
    match primary.load() {
        Ok(loaded) => {
            info!(bars = loaded.bars.len(), "loaded bars");
            (loaded, None)
        }
        Err(err) => {
            warn!(error = %err, "data load failed, falling back to synthetic bars");
            (fallback.generate(), Some(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timeframe;

    struct Failing;

    impl BarSource for Failing {
        fn load(&self) -> Result<LoadedBars, DataError> {
            Err(DataError::EmptyDataset { rows_read: 5 })
        }
    }

    fn fallback() -> SyntheticSource {
        SyntheticSource::new(SyntheticSpec {
            symbol: "DEMO".into(),
            timeframe: Timeframe::Day1,
            count: 10,
            start_time: 1_704_153_600,
            seed: 7,
        })
    }

    #[test]
    fn failing_source_falls_back_to_synthetic() {
        let (loaded, err) = load_with_fallback(&Failing, &fallback());
        assert!(matches!(err, Some(DataError::EmptyDataset { rows_read: 5 })));
        assert!(loaded.origin.is_synthetic());
        assert_eq!(loaded.bars.len(), 10);
    }

    #[test]
    fn missing_file_falls_back() {
        let source = CsvFileSource::new("/nonexistent/bars.csv");
        let (loaded, err) = load_with_fallback(&source, &fallback());
        assert!(matches!(err, Some(DataError::Io(_))));
        assert_eq!(loaded.bars.len(), 10);
    }
}
