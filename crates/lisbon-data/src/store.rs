//! Named-table factor store.
//!
//! The persistence collaborator behind the factor engine: a key-value store
//! of uniquely named tables. The canonical implementation writes one parquet
//! file per table, which round-trips every column dtype (dates and
//! fixed-precision floats included) without loss. Writes are atomic from the
//! caller's perspective: a crashed run never leaves a partial file that a
//! later run could mistake for a cache hit.

use lisbon_core::error::{Error, Result};
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// A key-value store of uniquely named tables.
///
/// Implementations must be safe to share by reference across factor
/// computations; the engine itself is sequential, but nothing here may
/// assume it stays that way.
pub trait FactorStore: Send + Sync {
    /// Loads a table by name; `None` when the name is unknown.
    fn load(&self, name: &str) -> Result<Option<DataFrame>>;

    /// Stores a table under a name, replacing any previous version.
    fn store(&self, name: &str, table: &DataFrame) -> Result<()>;

    /// True when a table with this name exists.
    fn contains(&self, name: &str) -> Result<bool>;
}

/// Parquet-backed store: one `<name>.parquet` per table under a root
/// directory.
#[derive(Debug)]
pub struct ParquetStore {
    root: PathBuf,
}

impl ParquetStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory this store writes into.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn table_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.parquet"))
    }

    /// Names of all stored tables.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "parquet") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort_unstable();
        Ok(names)
    }
}

impl FactorStore for ParquetStore {
    fn load(&self, name: &str) -> Result<Option<DataFrame>> {
        let path = self.table_path(name);
        if !path.exists() {
            debug!(name, "store miss");
            return Ok(None);
        }
        let file = File::open(&path)?;
        let table = ParquetReader::new(file)
            .finish()
            .map_err(|e| Error::Store(format!("failed to read {}: {e}", path.display())))?;
        debug!(name, rows = table.height(), "store hit");
        Ok(Some(table))
    }

    fn store(&self, name: &str, table: &DataFrame) -> Result<()> {
        // Write to a dotfile sibling and rename into place. The dot prefix
        // keeps the temp file out of list() and load() even if a crash
        // strands it.
        let final_path = self.table_path(name);
        let tmp_path = self.root.join(format!(".{name}.parquet.tmp"));
        let mut file = File::create(&tmp_path)?;
        let mut table = table.clone();
        ParquetWriter::new(&mut file)
            .finish(&mut table)
            .map_err(|e| Error::Store(format!("failed to write {}: {e}", tmp_path.display())))?;
        fs::rename(&tmp_path, &final_path)?;
        debug!(name, rows = table.height(), "stored");
        Ok(())
    }

    fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.table_path(name).exists())
    }
}

/// In-memory store for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, DataFrame>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FactorStore for MemoryStore {
    fn load(&self, name: &str) -> Result<Option<DataFrame>> {
        let tables = self
            .tables
            .read()
            .map_err(|_| Error::Store("poisoned lock".to_string()))?;
        Ok(tables.get(name).cloned())
    }

    fn store(&self, name: &str, table: &DataFrame) -> Result<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| Error::Store("poisoned lock".to_string()))?;
        tables.insert(name.to_string(), table.clone());
        Ok(())
    }

    fn contains(&self, name: &str) -> Result<bool> {
        let tables = self
            .tables
            .read()
            .map_err(|_| Error::Store("poisoned lock".to_string()))?;
        Ok(tables.contains_key(name))
    }
}

/// Store that never hits and never persists; disables caching entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl NoopStore {
    /// Creates the no-op store.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl FactorStore for NoopStore {
    fn load(&self, _name: &str) -> Result<Option<DataFrame>> {
        Ok(None)
    }

    fn store(&self, _name: &str, _table: &DataFrame) -> Result<()> {
        Ok(())
    }

    fn contains(&self, _name: &str) -> Result<bool> {
        Ok(false)
    }
}
