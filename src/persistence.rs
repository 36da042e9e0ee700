//! Persistence Module
//!
//! Adapter between the cache and an external durable blob store. The whole
//! map is encoded as one JSON snapshot, loaded when the cache is constructed
//! and saved after each mutation.

use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheEntry, EntryMetadata};
use crate::error::{CacheError, Result};

/// Snapshot format version written by this crate.
pub const SNAPSHOT_VERSION: u32 = 1;

// == Blob Store Trait ==
/// A durable store holding a single opaque blob.
pub trait BlobStore: Send + Sync + Debug {
    /// Returns the stored blob, or None if nothing has been saved yet.
    fn load(&self) -> anyhow::Result<Option<Vec<u8>>>;

    /// Replaces the stored blob.
    fn save(&self, bytes: &[u8]) -> anyhow::Result<()>;
}

// == Memory Blob Store ==
/// Blob store backed by shared memory. Clones share the same blob.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blob: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-loaded with `bytes`.
    pub fn with_contents(bytes: Vec<u8>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(bytes))),
        }
    }

    /// Returns a copy of the current blob.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.blob.lock().ok().and_then(|blob| blob.clone())
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self) -> anyhow::Result<Option<Vec<u8>>> {
        let blob = self.blob.lock().map_err(|_| anyhow!("blob lock poisoned"))?;
        Ok(blob.clone())
    }

    fn save(&self, bytes: &[u8]) -> anyhow::Result<()> {
        let mut blob = self.blob.lock().map_err(|_| anyhow!("blob lock poisoned"))?;
        *blob = Some(bytes.to_vec());
        Ok(())
    }
}

// == File Blob Store ==
/// Blob store backed by a single file.
///
/// Saves write a sibling temp file and rename it over the target, so a
/// crash mid-save leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    path: PathBuf,
}

impl FileBlobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl BlobStore for FileBlobStore {
    fn load(&self) -> anyhow::Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("reading snapshot {}", self.path.display()))
            }
        }
    }

    fn save(&self, bytes: &[u8]) -> anyhow::Result<()> {
        let temp = self.temp_path();
        fs::write(&temp, bytes)
            .with_context(|| format!("writing snapshot {}", temp.display()))?;
        fs::rename(&temp, &self.path)
            .with_context(|| format!("replacing snapshot {}", self.path.display()))?;
        Ok(())
    }
}

// == Snapshot Codec ==
#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    entries: &'a HashMap<String, CacheEntry>,
    metadata: &'a HashMap<String, EntryMetadata>,
}

/// Decoded snapshot contents.
#[derive(Debug, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    #[serde(default)]
    pub metadata: HashMap<String, EntryMetadata>,
}

/// Encodes the entry map and its metadata.
pub fn encode_snapshot(
    entries: &HashMap<String, CacheEntry>,
    metadata: &HashMap<String, EntryMetadata>,
) -> Result<Vec<u8>> {
    let snapshot = SnapshotRef {
        version: SNAPSHOT_VERSION,
        entries,
        metadata,
    };
    Ok(serde_json::to_vec(&snapshot)?)
}

/// Decodes a snapshot, rejecting versions newer than this crate understands.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Snapshot> {
    let snapshot: Snapshot = serde_json::from_slice(bytes)?;
    if snapshot.version > SNAPSHOT_VERSION {
        return Err(CacheError::Persistence(format!(
            "unsupported snapshot version {}",
            snapshot.version
        )));
    }
    Ok(snapshot)
}
