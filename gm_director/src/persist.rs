//! Durable record handling: the store seam and the save policy around it.

use gm_state::GmState;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::StoreError;

/// Key/value storage for GM snapshots.
pub trait SnapshotStore {
    /// Fetch a record; `Ok(None)` when it does not exist.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a record. Removing a missing record is not an error.
    fn clear(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).save(key, value)
    }

    fn clear(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).clear(key)
    }
}

/// In-process store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful saves so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// The stored record under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.records.insert(key.into(), value.into());
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.records.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), StoreError> {
        self.records.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl SnapshotStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Storage switched off: nothing loads, every write fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl SnapshotStore for NullStore {
    fn load(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn save(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Disabled)
    }

    fn clear(&mut self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Save policy: write when dirty, at most once per configured turn gap,
/// and unconditionally when forced.
#[derive(Debug, Clone)]
pub struct Persister {
    key: String,
    min_turns_between_saves: u32,
    dirty: bool,
    last_save_turn: Option<u32>,
}

impl Persister {
    pub fn new(key: impl Into<String>, min_turns_between_saves: u32) -> Self {
        Self {
            key: key.into(),
            min_turns_between_saves,
            dirty: false,
            last_save_turn: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Load the state for `run_seed`, or a fresh one when the record is
    /// missing, unreadable or belongs to another run.
    pub fn load<S: SnapshotStore>(&self, store: &S, run_seed: u32) -> GmState {
        let json = match store.load(&self.key) {
            Ok(Some(json)) => json,
            Ok(None) => {
                info!("no GM record under `{}`; starting fresh", self.key);
                return GmState::new(run_seed);
            }
            Err(err) => {
                warn!("could not read GM record `{}`: {err}; starting fresh", self.key);
                return GmState::new(run_seed);
            }
        };
        match GmState::from_snapshot(&json, run_seed) {
            Ok(state) => {
                info!("restored GM state for run seed {run_seed:#010x}");
                state
            }
            Err(err) => {
                warn!("discarding GM record `{}`: {err}", self.key);
                GmState::new(run_seed)
            }
        }
    }

    /// Opportunistic save: only when dirty and the turn gap has passed.
    pub fn save_if_due<S: SnapshotStore>(&mut self, store: &mut S, state: &GmState, turn: u32) -> bool {
        if !self.dirty {
            return false;
        }
        let due = self
            .last_save_turn
            .map_or(true, |last| turn < last || turn - last >= self.min_turns_between_saves);
        if !due {
            return false;
        }
        self.write(store, state, turn)
    }

    /// Save now regardless of the dirty flag and turn gap.
    pub fn force_save<S: SnapshotStore>(&mut self, store: &mut S, state: &GmState, turn: u32) -> bool {
        self.write(store, state, turn)
    }

    /// Drop the durable record and forget the save schedule.
    pub fn clear<S: SnapshotStore>(&mut self, store: &mut S) {
        if let Err(err) = store.clear(&self.key) {
            warn!("could not clear GM record `{}`: {err}", self.key);
        }
        self.dirty = false;
        self.last_save_turn = None;
    }

    fn write<S: SnapshotStore>(&mut self, store: &mut S, state: &GmState, turn: u32) -> bool {
        let result = state
            .to_snapshot()
            .map_err(StoreError::from)
            .and_then(|json| store.save(&self.key, &json));
        match result {
            Ok(()) => {
                debug!("saved GM state at turn {turn}");
                self.dirty = false;
                self.last_save_turn = Some(turn);
                true
            }
            Err(err) => {
                warn!("could not save GM state at turn {turn}: {err}");
                false
            }
        }
    }
}
