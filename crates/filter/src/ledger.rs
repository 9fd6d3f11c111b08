//! Cumulative seen-SKU ledger.
//!
//! A one-column CSV holding every identifier previously exported. Reading a
//! missing ledger yields an empty set. Appends are read-merge-rewrite under
//! an exclusive lock on a sidecar `.lock` file, and the rewrite goes through
//! a temp file renamed over the ledger.

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::FilterError;

const DEFAULT_FILE_NAME: &str = "seen_skus.csv";

#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    label: String,
}

impl Ledger {
    /// `label` is the header written on rewrite (e.g. "Variant SKU").
    pub fn new(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self { path: path.into(), label: label.into() }
    }

    /// Per-user default location: `<data_dir>/skufilter/seen_skus.csv`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("skufilter").join(DEFAULT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("csv.tmp")
    }

    fn is_header(&self, record: &csv::StringRecord) -> bool {
        record
            .get(0)
            .is_some_and(|first| first.trim().eq_ignore_ascii_case(self.label.trim()))
    }

    /// Every identifier in the ledger; empty if the file does not exist.
    ///
    /// The first line is skipped only when it is the header label (compared
    /// ignoring case and surrounding spaces), so hand-made ledgers without a
    /// header keep their first SKU.
    pub fn load(&self) -> Result<BTreeSet<String>, FilterError> {
        if !self.path.exists() {
            return Ok(BTreeSet::new());
        }
        let data = std::fs::read_to_string(&self.path).map_err(|e| {
            FilterError::Ledger(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let data = data.strip_prefix('\u{feff}').unwrap_or(&data);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data.as_bytes());

        let mut keys = BTreeSet::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                FilterError::Ledger(format!("{}: {e}", self.path.display()))
            })?;
            if line == 0 && self.is_header(&record) {
                continue;
            }
            if let Some(value) = record.get(0) {
                if !value.is_empty() {
                    keys.insert(value.to_string());
                }
            }
        }
        Ok(keys)
    }

    /// Merge `keys` into the ledger. Returns how many were not already present.
    pub fn append<'a, I>(&self, keys: I) -> Result<usize, FilterError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    FilterError::Ledger(format!("cannot create {}: {e}", parent.display()))
                })?;
            }
        }

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| FilterError::Ledger(format!("cannot open {}: {e}", lock_path.display())))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| FilterError::Ledger(format!("cannot lock {}: {e}", lock_path.display())))?;

        let result = self.append_locked(keys);

        if let Err(e) = FileExt::unlock(&lock_file) {
            log::warn!("cannot unlock {}: {e}", lock_path.display());
        }
        result
    }

    fn append_locked<'a, I>(&self, keys: I) -> Result<usize, FilterError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut all = self.load()?;
        let before = all.len();
        all.extend(keys.into_iter().filter(|k| !k.is_empty()).cloned());
        let added = all.len() - before;

        if added == 0 && self.path.exists() {
            return Ok(0);
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([self.label.as_str()])?;
        for key in &all {
            writer.write_record([key.as_str()])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| FilterError::Ledger(e.to_string()))?;

        // Atomic: write .tmp then rename
        let tmp_path = self.temp_path();
        std::fs::write(&tmp_path, bytes).map_err(|e| {
            FilterError::Ledger(format!("cannot write {}: {e}", tmp_path.display()))
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            FilterError::Ledger(format!("cannot replace {}: {e}", self.path.display()))
        })?;

        log::info!("ledger {}: {} added, {} total", self.path.display(), added, all.len());
        Ok(added)
    }
}
