//! Persisted JSON state — the install path cache and the fact log
//!
//! Both files are read whole, mutated in memory and written back whole.
//! Read or parse failures degrade to empty state (logged), so a corrupt
//! file never aborts a handling call.

use anyhow::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Maps an application name to the install path discovered for it.
/// Entries are created on first detection and evicted as soon as the
/// cached path stops existing on disk.
#[derive(Debug, Default)]
pub struct PathCache {
    file: PathBuf,
    entries: BTreeMap<String, String>,
}

impl PathCache {
    pub fn load(file: &Path) -> Self {
        let entries = match fs::read_to_string(file) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    log::warn!("path cache {} is corrupt, starting empty: {}", file.display(), e);
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self {
            file: file.to_path_buf(),
            entries,
        }
    }

    pub fn get(&self, app: &str) -> Option<&str> {
        self.entries.get(app).map(|s| s.as_str())
    }

    pub fn insert(&mut self, app: &str, path: &str) {
        self.entries.insert(app.to_string(), path.to_string());
        self.save();
    }

    pub fn remove(&mut self, app: &str) {
        if self.entries.remove(app).is_some() {
            self.save();
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist the whole map, pretty-printed. Write failures are logged
    /// and swallowed.
    fn save(&self) {
        if let Err(e) = self.write_file() {
            log::warn!("failed to persist path cache {}: {}", self.file.display(), e);
        }
    }

    fn write_file(&self) -> Result<()> {
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.file, raw)?;
        Ok(())
    }
}

/// One remembered fact, timestamped at append time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactRecord {
    pub timestamp: String,
    pub data: String,
}

/// Append-only, ordered fact store backing "remember" / "recall".
/// Never mutated or deleted; duplicates allowed.
#[derive(Debug, Default)]
pub struct FactLog {
    file: PathBuf,
    records: Vec<FactRecord>,
}

impl FactLog {
    pub fn load(file: &Path) -> Self {
        let records = match fs::read_to_string(file) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(records) => records,
                Err(e) => {
                    log::warn!("fact log {} is corrupt, starting empty: {}", file.display(), e);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Self {
            file: file.to_path_buf(),
            records,
        }
    }

    pub fn append(&mut self, data: &str) {
        self.records.push(FactRecord {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            data: data.to_string(),
        });
        self.save();
    }

    pub fn records(&self) -> &[FactRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Case-insensitive substring search over the fact text.
    pub fn search(&self, query: &str) -> Vec<&str> {
        let needle = query.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.data.to_lowercase().contains(&needle))
            .map(|r| r.data.as_str())
            .collect()
    }

    fn save(&self) {
        if let Err(e) = self.write_file() {
            log::warn!("failed to persist fact log {}: {}", self.file.display(), e);
        }
    }

    fn write_file(&self) -> Result<()> {
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.file, raw)?;
        Ok(())
    }
}
