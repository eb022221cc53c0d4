//! Where protection entries live between runs

use ahash::HashMap;
use mobcap_types::EntityId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::PersistenceError;

/// Protected entity → protection timestamp in milliseconds
pub type ProtectionEntries = HashMap<EntityId, u64>;

/// Load/save backend for the protection registry
pub trait ProtectionStore: Send + Sync {
    fn load(&self) -> Result<ProtectionEntries, PersistenceError>;
    fn save(&self, entries: &ProtectionEntries) -> Result<(), PersistenceError>;
}

/// On-disk layout
#[derive(Debug, Serialize, Deserialize)]
struct ProtectionFile {
    version: u32,
    entries: Vec<(EntityId, u64)>,
}

const FILE_VERSION: u32 = 1;

/// Protection entries in a single bincode + lz4 file
///
/// Writes go to a temp file that is renamed over the target. A file that
/// cannot be decoded is moved aside to `<name>.corrupt` and treated as
/// empty.
#[derive(Debug, Clone)]
pub struct FileProtectionStore {
    path: PathBuf,
}

impl FileProtectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    fn decode(bytes: &[u8]) -> Result<ProtectionEntries, PersistenceError> {
        let serialized = lz4_flex::decompress_size_prepended(bytes)
            .map_err(|e| PersistenceError::Decompress(e.to_string()))?;
        let (file, _): (ProtectionFile, _) =
            bincode_next::serde::decode_from_slice(&serialized, bincode_next::config::standard())
                .map_err(|e| PersistenceError::Decode(format!("{:?}", e)))?;
        if file.version != FILE_VERSION {
            return Err(PersistenceError::Decode(format!(
                "unsupported version {}",
                file.version
            )));
        }
        Ok(file.entries.into_iter().collect())
    }

    fn move_aside(&self, reason: &PersistenceError) -> Result<(), PersistenceError> {
        let corrupt = self.corrupt_path();
        log::warn!(
            "Protection file {:?} is unreadable ({}), moving it to {:?}",
            self.path,
            reason,
            corrupt
        );
        std::fs::rename(&self.path, &corrupt).map_err(|e| PersistenceError::io(&self.path, e))
    }
}

impl ProtectionStore for FileProtectionStore {
    fn load(&self) -> Result<ProtectionEntries, PersistenceError> {
        if !self.path.exists() {
            log::debug!("No protection file at {:?}, starting empty", self.path);
            return Ok(ProtectionEntries::default());
        }

        let bytes = std::fs::read(&self.path).map_err(|e| PersistenceError::io(&self.path, e))?;
        match Self::decode(&bytes) {
            Ok(entries) => {
                log::debug!(
                    "Loaded {} protection entries from {:?}",
                    entries.len(),
                    self.path
                );
                Ok(entries)
            }
            Err(e) => {
                self.move_aside(&e)?;
                Ok(ProtectionEntries::default())
            }
        }
    }

    fn save(&self, entries: &ProtectionEntries) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
        }

        let mut list: Vec<(EntityId, u64)> = entries.iter().map(|(&id, &ts)| (id, ts)).collect();
        list.sort_unstable();
        let file = ProtectionFile {
            version: FILE_VERSION,
            entries: list,
        };

        let serialized =
            bincode_next::serde::encode_to_vec(&file, bincode_next::config::standard())
                .map_err(|e| PersistenceError::Encode(format!("{:?}", e)))?;
        let compressed = lz4_flex::compress_prepend_size(&serialized);

        // Atomic write: temp file, then rename
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, &compressed).map_err(|e| PersistenceError::io(&temp_path, e))?;
        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| PersistenceError::io(&self.path, e))?;

        log::debug!(
            "Saved {} protection entries to {:?} ({} bytes)",
            file.entries.len(),
            self.path,
            compressed.len()
        );
        Ok(())
    }
}

/// In-memory store for tests and ephemeral worlds
#[derive(Debug, Default)]
pub struct MemoryProtectionStore {
    entries: Mutex<ProtectionEntries>,
    failing: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryProtectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: ProtectionEntries) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Self::default()
        }
    }

    /// Make every following save fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> ProtectionEntries {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ProtectionStore for MemoryProtectionStore {
    fn load(&self) -> Result<ProtectionEntries, PersistenceError> {
        Ok(self.snapshot())
    }

    fn save(&self, entries: &ProtectionEntries) -> Result<(), PersistenceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable(
                "memory store set to fail".to_string(),
            ));
        }
        *self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = entries.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
