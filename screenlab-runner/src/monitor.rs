//! Monitoring list: instruments a user has chosen to follow.
//!
//! Stored as a CSV with columns `Stock, Date Added, Closing Price`. Entries
//! are keyed by (stock, date added); adding the same pair twice is a no-op.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use screenlab_core::PriceSeries;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("failed to access monitoring file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed monitoring file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("no price data for '{0}'")]
    UnknownInstrument(String),
}

/// One monitored instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorEntry {
    #[serde(rename = "Stock")]
    pub stock: String,
    #[serde(rename = "Date Added")]
    pub date_added: NaiveDate,
    #[serde(rename = "Closing Price")]
    pub closing_price: f64,
}

impl MonitorEntry {
    fn key(&self) -> (String, NaiveDate) {
        (self.stock.clone(), self.date_added)
    }
}

/// Handle to a monitoring CSV on disk.
#[derive(Debug, Clone)]
pub struct MonitorLog {
    path: PathBuf,
}

impl MonitorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All entries in file order. A missing file is an empty list.
    pub fn load(&self) -> Result<Vec<MonitorEntry>, MonitorError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let csv_err = |source| MonitorError::Csv {
            path: self.path.clone(),
            source,
        };
        let mut reader = csv::Reader::from_path(&self.path).map_err(csv_err)?;
        reader
            .deserialize()
            .collect::<Result<Vec<MonitorEntry>, _>>()
            .map_err(csv_err)
    }

    /// Append entries not already present and rewrite the file.
    ///
    /// Returns the number of entries actually added.
    pub fn add(&self, entries: &[MonitorEntry]) -> Result<usize, MonitorError> {
        let mut all = self.load()?;
        let mut seen: BTreeSet<(String, NaiveDate)> = all.iter().map(MonitorEntry::key).collect();

        let before = all.len();
        for entry in entries {
            if seen.insert(entry.key()) {
                all.push(entry.clone());
            }
        }
        let added = all.len() - before;
        if added == 0 {
            return Ok(0);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| MonitorError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        self.write(&all)?;
        info!(path = %self.path.display(), added, total = all.len(), "monitoring list updated");
        Ok(added)
    }

    fn write(&self, entries: &[MonitorEntry]) -> Result<(), MonitorError> {
        let csv_err = |source| MonitorError::Csv {
            path: self.path.clone(),
            source,
        };
        let mut wtr = csv::Writer::from_path(&self.path).map_err(csv_err)?;
        for entry in entries {
            wtr.serialize(entry).map_err(csv_err)?;
        }
        wtr.flush().map_err(|source| MonitorError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Build entries for the selected symbols.
///
/// The date added is the day before the (exclusive) evaluation end, i.e. the
/// last day of the evaluation window; the price is the latest close.
pub fn selection_entries(
    symbols: &[String],
    series: &BTreeMap<String, PriceSeries>,
    end: NaiveDate,
) -> Result<Vec<MonitorEntry>, MonitorError> {
    let date_added = end - Duration::days(1);
    symbols
        .iter()
        .map(|symbol| {
            let last = series
                .get(symbol)
                .and_then(PriceSeries::last)
                .ok_or_else(|| MonitorError::UnknownInstrument(symbol.clone()))?;
            Ok(MonitorEntry {
                stock: symbol.clone(),
                date_added,
                closing_price: last.close,
            })
        })
        .collect()
}
