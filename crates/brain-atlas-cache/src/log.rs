// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Append-only record log with an in-memory projection.

use std::collections::{BTreeSet, HashMap};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::entries::{CacheKey, CacheRecord};
use crate::error::{CacheError, CacheResult};

/// One cache kind: a newline-delimited JSON log plus its index
///
/// The log is never rewritten. The index is last-write-wins over the log
/// and may be narrowed with [`AssetCache::invalidate`].
#[derive(Debug)]
pub struct AssetCache<E: CacheRecord> {
    path: PathBuf,
    writer: File,
    index: HashMap<CacheKey, E>,
}

impl<E: CacheRecord> AssetCache<E> {
    /// Open the log, creating it if needed, and rebuild the index from it
    ///
    /// Malformed lines (for example a record torn by an interrupted run)
    /// are skipped with a warning.
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let mut cache = Self::open_empty(path)?;
        cache.index = load_index(&cache.path)?;
        debug!(
            target: "brain-atlas-cache",
            "Loaded {} entries from {}",
            cache.index.len(),
            cache.path.display()
        );
        Ok(cache)
    }

    /// Open the log for appending but start with an empty index
    ///
    /// Existing records stay on disk and win again on the next [`open`](Self::open)
    /// unless superseded.
    pub fn open_empty(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
            }
        }

        let mut writer = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)
            .map_err(|e| CacheError::io(&path, e))?;
        terminate_torn_tail(&mut writer).map_err(|e| CacheError::io(&path, e))?;

        Ok(Self {
            path,
            writer,
            index: HashMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &CacheKey) -> Option<&E> {
        self.index.get(key)
    }

    /// Append a record to the log, then make it the indexed entry for its key
    pub fn append(&mut self, entry: E) -> CacheResult<()> {
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .and_then(|_| self.writer.flush())
            .map_err(|e| CacheError::io(&self.path, e))?;
        self.index.insert(entry.key(), entry);
        Ok(())
    }

    /// Drop every indexed entry of the given datasets; the log is untouched
    ///
    /// Returns the number of entries removed.
    pub fn invalidate(&mut self, dataset_ids: &BTreeSet<String>) -> usize {
        let before = self.index.len();
        self.index
            .retain(|key, _| !dataset_ids.contains(&key.dataset_id));
        before - self.index.len()
    }

    pub fn values(&self) -> impl Iterator<Item = &E> {
        self.index.values()
    }

    /// Indexed entries ordered by key
    pub fn snapshot(&self) -> Vec<E> {
        let mut keys: Vec<&CacheKey> = self.index.keys().collect();
        keys.sort();
        keys.into_iter()
            .filter_map(|key| self.index.get(key).cloned())
            .collect()
    }
}

fn load_index<E: CacheRecord>(path: &Path) -> CacheResult<HashMap<CacheKey, E>> {
    let file = File::open(path).map_err(|e| CacheError::io(path, e))?;
    let reader = BufReader::new(file);
    let mut index = HashMap::new();

    // Raw bytes: a torn tail may end inside a multibyte character
    for (number, line) in reader.split(b'\n').enumerate() {
        let line = line.map_err(|e| CacheError::io(path, e))?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice::<E>(&line) {
            Ok(entry) => {
                index.insert(entry.key(), entry);
            }
            Err(e) => {
                warn!(
                    target: "brain-atlas-cache",
                    "Skipping malformed record at {}:{}: {}",
                    path.display(),
                    number + 1,
                    e
                );
            }
        }
    }

    Ok(index)
}

/// Make sure the next append starts on its own line
fn terminate_torn_tail(file: &mut File) -> std::io::Result<()> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(());
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
    }
    Ok(())
}
