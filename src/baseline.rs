//! Baseline files: metric name → (mean, stddev)
//!
//! Tab-delimited text, one metric per line, no header:
//!
//! ```text
//! latency_ms	100.0	2.0
//! ```
//!
//! A store is loaded whole, mutated in memory and rewritten whole.

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Accepted (mean, stddev) pair for one metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub mean: f64,
    pub stddev: f64,
}

impl BaselineEntry {
    pub fn new(mean: f64, stddev: f64) -> Self {
        Self { mean, stddev }
    }
}

/// In-memory baseline mapping, kept sorted by metric name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaselineStore {
    entries: BTreeMap<String, BaselineEntry>,
}

impl BaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a baseline file
    ///
    /// # Errors
    /// - `GateError::MissingFile` if `path` does not exist (there is no implicit
    ///   empty baseline; create the file before the first run)
    /// - `GateError::BaselineFormat` for a line that is not `name\tmean\tstddev`
    /// - `GateError::Io` for any other read failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => GateError::MissingFile(path.to_path_buf()),
            _ => GateError::Io(e),
        })?;

        let store = Self::parse(&content).map_err(|(line, reason)| GateError::BaselineFormat {
            path: path.to_path_buf(),
            line,
            reason,
        })?;
        tracing::debug!("Loaded {} baseline entries from {}", store.len(), path.display());
        Ok(store)
    }

    /// Parse baseline text
    ///
    /// On failure returns the 1-based line number and the reason.
    pub fn parse(content: &str) -> std::result::Result<Self, (usize, String)> {
        let mut store = Self::new();
        for (index, raw) in content.lines().enumerate() {
            let line_number = index + 1;
            let line = raw.strip_suffix('\r').unwrap_or(raw);

            let fields: Vec<&str> = line.split('\t').collect();
            let [name, mean, stddev] = fields.as_slice() else {
                return Err((
                    line_number,
                    format!("expected 3 tab-separated fields, found {}", fields.len()),
                ));
            };

            let parse_field = |field: &&str, what: &str| {
                field
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| (line_number, format!("{} {:?} is not a number", what, field)))
            };
            let entry = BaselineEntry::new(
                parse_field(mean, "mean")?,
                parse_field(stddev, "stddev")?,
            );

            if store.insert(name.to_string(), entry).is_some() {
                tracing::warn!(
                    "Duplicate baseline metric '{}' on line {}; keeping the later entry",
                    name,
                    line_number
                );
            }
        }
        Ok(store)
    }

    /// Render as baseline file text, in ascending name order
    ///
    /// Floats use the shortest representation that parses back to the same
    /// value.
    ///
    /// # Errors
    /// `GateError::InvalidMetricName` for a name holding a tab or newline;
    /// such a line would not load back.
    pub fn to_tsv(&self) -> Result<String> {
        let mut out = String::new();
        for (name, entry) in &self.entries {
            if !is_writable_name(name) {
                return Err(GateError::InvalidMetricName(name.clone()));
            }
            out.push_str(&format!("{}\t{:?}\t{:?}\n", name, entry.mean, entry.stddev));
        }
        Ok(out)
    }

    /// Overwrite `path` with this store
    ///
    /// Writes a temporary file next to `path` and renames it into place, so a
    /// crash never leaves a truncated baseline behind.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let text = self.to_tsv()?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.flush()?;

        // Temp files are created owner-only; keep the mode of the file we replace
        match fs::metadata(path) {
            Ok(existing) => tmp.as_file().set_permissions(existing.permissions())?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(GateError::Io(e)),
        }
        tmp.persist(path).map_err(|e| GateError::Io(e.error))?;

        tracing::info!("Wrote {} baseline entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Insert or replace an entry, returning the previous one
    pub fn insert(&mut self, name: impl Into<String>, entry: BaselineEntry) -> Option<BaselineEntry> {
        self.entries.insert(name.into(), entry)
    }

    pub fn get(&self, name: &str) -> Option<&BaselineEntry> {
        self.entries.get(name)
    }

    /// Entries in ascending name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BaselineEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_writable_name(name: &str) -> bool {
    !name.contains(|c| c == '\t' || c == '\n')
}

impl FromIterator<(String, BaselineEntry)> for BaselineStore {
    fn from_iter<I: IntoIterator<Item = (String, BaselineEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
