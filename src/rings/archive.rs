//! Cache of conformational-search results, keyed by chain identity.
//!
//! Stored torsion vectors are always in the canonical reading direction of
//! the chain; [`RingClosuresArchive`] flips them for paths that read the
//! chain backwards.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info};

use super::error::{RingClosureError, Result};
use super::params::RingClosureParams;
use super::path::ChainId;

#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    pub closable: bool,
    pub conformations: Vec<Vec<f64>>,
}

/// Key-value store behind the archive.
pub trait ArchiveStore: Send {
    fn get(&self, chain_id: &str) -> Result<Option<ArchiveEntry>>;

    /// Stores `entry` unless `chain_id` is already present. Returns whether
    /// the entry was written.
    fn put(&mut self, chain_id: &str, entry: &ArchiveEntry) -> Result<bool>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, ArchiveEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArchiveStore for MemoryStore {
    fn get(&self, chain_id: &str) -> Result<Option<ArchiveEntry>> {
        Ok(self.entries.get(chain_id).cloned())
    }

    fn put(&mut self, chain_id: &str, entry: &ArchiveEntry) -> Result<bool> {
        if self.entries.contains_key(chain_id) {
            return Ok(false);
        }
        self.entries.insert(chain_id.to_string(), entry.clone());
        Ok(true)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// File-backed store: an index with one `chain_id rcc_id T|F` line per
/// entry and, for closable chains, the torsion vectors in
/// `<folder>/<rcc_id>.json`.
#[derive(Debug)]
pub struct FileStore {
    index_path: PathBuf,
    folder: PathBuf,
    ids: HashMap<String, (usize, bool)>,
}

impl FileStore {
    /// Opens the store, loading an existing index if there is one.
    pub fn open(index_path: impl Into<PathBuf>, folder: impl Into<PathBuf>) -> Result<Self> {
        let index_path = index_path.into();
        let folder = folder.into();
        fs::create_dir_all(&folder)?;
        let mut ids = HashMap::new();
        if index_path.exists() {
            let reader = BufReader::new(File::open(&index_path)?);
            for (lineno, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let (chain_id, id, closable) = parse_index_line(&line)
                    .map_err(|msg| format_error(&index_path, lineno + 1, msg))?;
                if id != ids.len() {
                    return Err(format_error(
                        &index_path,
                        lineno + 1,
                        format!("expected id {}, found {id}", ids.len()),
                    ));
                }
                if ids.insert(chain_id.to_string(), (id, closable)).is_some() {
                    return Err(format_error(
                        &index_path,
                        lineno + 1,
                        format!("duplicate chain '{chain_id}'"),
                    ));
                }
            }
            info!(index = %index_path.display(), entries = ids.len(), "loaded ring-closure archive");
        }
        Ok(Self {
            index_path,
            folder,
            ids,
        })
    }

    fn conformations_file(&self, id: usize) -> PathBuf {
        self.folder.join(format!("{id}.json"))
    }
}

fn format_error(path: &Path, line: usize, msg: impl Into<String>) -> RingClosureError {
    RingClosureError::ArchiveFormat {
        path: path.to_path_buf(),
        line,
        msg: msg.into(),
    }
}

fn parse_index_line(line: &str) -> std::result::Result<(&str, usize, bool), String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let &[chain_id, id, flag] = fields.as_slice() else {
        return Err(format!("expected 3 fields, found {}", fields.len()));
    };
    let id = id
        .parse()
        .map_err(|_| format!("'{id}' is not an entry id"))?;
    let closable = match flag {
        "T" => true,
        "F" => false,
        other => return Err(format!("'{other}' is not a closability flag")),
    };
    Ok((chain_id, id, closable))
}

impl ArchiveStore for FileStore {
    fn get(&self, chain_id: &str) -> Result<Option<ArchiveEntry>> {
        let Some(&(id, closable)) = self.ids.get(chain_id) else {
            return Ok(None);
        };
        let conformations = if closable {
            let text = fs::read_to_string(self.conformations_file(id))?;
            serde_json::from_str(&text)?
        } else {
            Vec::new()
        };
        Ok(Some(ArchiveEntry {
            closable,
            conformations,
        }))
    }

    fn put(&mut self, chain_id: &str, entry: &ArchiveEntry) -> Result<bool> {
        if self.ids.contains_key(chain_id) {
            return Ok(false);
        }
        let id = self.ids.len();
        if entry.closable {
            fs::write(
                self.conformations_file(id),
                serde_json::to_string(&entry.conformations)?,
            )?;
        }
        let mut index = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.index_path)?;
        let flag = if entry.closable { 'T' } else { 'F' };
        writeln!(index, "{chain_id} {id} {flag}")?;
        self.ids.insert(chain_id.to_string(), (id, entry.closable));
        Ok(true)
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Shared archive of closability results. Safe to use from several
/// evaluators at once; the first result stored for a chain is kept.
pub struct RingClosuresArchive {
    store: Mutex<Box<dyn ArchiveStore>>,
}

impl RingClosuresArchive {
    pub fn new(store: impl ArchiveStore + 'static) -> Self {
        Self {
            store: Mutex::new(Box::new(store)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// A file-backed archive when both archive paths are configured,
    /// otherwise an in-memory one.
    pub fn from_params(params: &RingClosureParams) -> Result<Self> {
        match (&params.archive_index, &params.archive_folder) {
            (Some(index), Some(folder)) => Ok(Self::new(FileStore::open(index, folder)?)),
            _ => Ok(Self::in_memory()),
        }
    }

    /// Looks up `chain`; torsion vectors are returned in the reading
    /// direction of the caller's path.
    pub fn lookup(&self, chain: &ChainId) -> Result<Option<ArchiveEntry>> {
        let entry = self.store.lock().get(chain.as_str())?;
        Ok(entry.map(|mut e| {
            if chain.is_reversed() {
                e.conformations.iter_mut().for_each(|c| c.reverse());
            }
            e
        }))
    }

    /// Stores a search result given in the reading direction of the
    /// caller's path.
    pub fn record(
        &self,
        chain: &ChainId,
        closable: bool,
        conformations: &[Vec<f64>],
    ) -> Result<bool> {
        let mut conformations = conformations.to_vec();
        if chain.is_reversed() {
            conformations.iter_mut().for_each(|c| c.reverse());
        }
        let entry = ArchiveEntry {
            closable,
            conformations,
        };
        let written = self.store.lock().put(chain.as_str(), &entry)?;
        if written {
            debug!(chain = %chain, closable, "archived chain closability");
        }
        Ok(written)
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RingClosuresArchive {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for RingClosuresArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingClosuresArchive")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::AttractorKind::{Minus, Plus};
    use crate::rings::path::PathSubGraph;
    use crate::rings::test_support::ChainFixture;

    fn entry(closable: bool, conformations: Vec<Vec<f64>>) -> ArchiveEntry {
        ArchiveEntry {
            closable,
            conformations,
        }
    }

    #[test]
    fn memory_store_keeps_the_first_entry() {
        let mut store = MemoryStore::new();
        assert!(store.put("a", &entry(true, vec![vec![1.0]])).unwrap());
        assert!(!store.put("a", &entry(false, vec![])).unwrap());
        assert_eq!(store.get("a").unwrap(), Some(entry(true, vec![vec![1.0]])));
        assert_eq!(store.get("b").unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn file_store_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("rcc.index");
        let folder = dir.path().join("rcc");
        {
            let mut store = FileStore::open(&index, &folder).unwrap();
            store.put("m0/2/1_1_m0/0/2", &entry(true, vec![vec![0.0, 60.0, -120.0, 0.0]])).unwrap();
            store.put("m1/0/1", &entry(false, vec![])).unwrap();
        }
        let text = fs::read_to_string(&index).unwrap();
        assert_eq!(text, "m0/2/1_1_m0/0/2 0 T\nm1/0/1 1 F\n");
        assert!(folder.join("0.json").exists());
        assert!(!folder.join("1.json").exists());

        let store = FileStore::open(&index, &folder).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.get("m0/2/1_1_m0/0/2").unwrap(),
            Some(entry(true, vec![vec![0.0, 60.0, -120.0, 0.0]]))
        );
        assert_eq!(store.get("m1/0/1").unwrap(), Some(entry(false, vec![])));
    }

    #[test]
    fn malformed_index_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("rcc.index");
        fs::write(&index, "a 0 T\na 1 F\n").unwrap();
        let err = FileStore::open(&index, dir.path().join("rcc")).unwrap_err();
        assert!(matches!(err, RingClosureError::ArchiveFormat { line: 2, .. }));

        fs::write(&index, "a 0 T\nb 5 F\n").unwrap();
        assert!(FileStore::open(&index, dir.path().join("rcc")).is_err());

        fs::write(&index, "a 0 maybe\n").unwrap();
        assert!(FileStore::open(&index, dir.path().join("rcc")).is_err());
    }

    #[test]
    fn reversed_paths_read_vectors_backwards() {
        let fx = ChainFixture::new(6).rcv(1, Plus).rcv(4, Minus);
        let forward = PathSubGraph::new(&fx.graph, fx.rcv_id(0), fx.rcv_id(1)).unwrap();
        let backward = PathSubGraph::new(&fx.graph, fx.rcv_id(1), fx.rcv_id(0)).unwrap();
        let archive = RingClosuresArchive::in_memory();
        archive
            .record(forward.chain_id(), true, &[vec![0.0, 10.0, 20.0, 0.0]])
            .unwrap();
        let hit = archive.lookup(backward.chain_id()).unwrap().unwrap();
        assert_eq!(hit.conformations, vec![vec![0.0, 20.0, 10.0, 0.0]]);
        let hit = archive.lookup(forward.chain_id()).unwrap().unwrap();
        assert_eq!(hit.conformations, vec![vec![0.0, 10.0, 20.0, 0.0]]);
        assert!(!archive.record(backward.chain_id(), false, &[]).unwrap());
    }
}
