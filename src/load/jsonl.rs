//! Durable store: one JSON document per created record, one file per entity kind.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::transform::{CanonicalRow, Maintenance, Payment, Ride, Scooter, Tariff, User};
use crate::types::EntityKind;

use super::{MemoryStore, Store};

fn unavailable(path: &Path, e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(format!("{}: {e}", path.display()))
}

/// Appends created records to `<dir>/<entity>.jsonl`.
///
/// Constraints are checked by an inner [`MemoryStore`] that is rebuilt from the existing files on
/// [`JsonLinesStore::open`], so unique and foreign keys hold across runs. A record is kept in the
/// index only once its line has been written in full.
#[derive(Debug)]
pub struct JsonLinesStore {
    dir: PathBuf,
    index: MemoryStore,
    writers: HashMap<EntityKind, File>,
    closed: bool,
}

impl JsonLinesStore {
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| unavailable(&dir, e))?;

        let mut store = Self {
            dir,
            index: MemoryStore::new(),
            writers: HashMap::new(),
            closed: false,
        };
        // Referenced kinds first.
        let mut replayed = 0;
        replayed += store.replay(EntityKind::User, MemoryStore::create_user)?;
        replayed += store.replay(EntityKind::Scooter, MemoryStore::create_scooter)?;
        replayed += store.replay(EntityKind::Tariff, MemoryStore::create_tariff)?;
        replayed += store.replay(EntityKind::Ride, MemoryStore::create_ride)?;
        replayed += store.replay(EntityKind::Payment, MemoryStore::create_payment)?;
        replayed += store.replay(EntityKind::Maintenance, MemoryStore::create_maintenance)?;
        info!(dir = %store.dir.display(), records = replayed, "opened json-lines store");
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Records currently held, including those replayed on open.
    pub fn index(&self) -> &MemoryStore {
        &self.index
    }

    pub fn path_for(&self, kind: EntityKind) -> PathBuf {
        self.dir.join(format!("{}.jsonl", kind.as_str()))
    }

    fn replay<T, F>(&mut self, kind: EntityKind, create: F) -> StoreResult<usize>
    where
        T: DeserializeOwned,
        F: Fn(&mut MemoryStore, T) -> StoreResult<T>,
    {
        let path = self.path_for(kind);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(unavailable(&path, e)),
        };
        let mut count = 0;
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| unavailable(&path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(&line)
                .map_err(|e| unavailable(&path, format!("line {}: {e}", line_no + 1)))?;
            create(&mut self.index, record)?;
            count += 1;
        }
        debug!(path = %path.display(), records = count, "replayed");
        Ok(count)
    }

    /// Write `record` as one complete line. A partially written line is truncated away.
    fn append<T: Serialize>(&mut self, kind: EntityKind, record: &T) -> StoreResult<()> {
        let path = self.path_for(kind);
        let mut line = serde_json::to_vec(record).map_err(|e| unavailable(&path, e))?;
        line.push(b'\n');

        let file = match self.writers.entry(kind) {
            std::collections::hash_map::Entry::Occupied(slot) => slot.into_mut(),
            std::collections::hash_map::Entry::Vacant(slot) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .map_err(|e| unavailable(&path, e))?;
                slot.insert(file)
            }
        };
        let len = file.metadata().map_err(|e| unavailable(&path, e))?.len();
        if let Err(e) = file.write_all(&line) {
            if let Err(truncate) = file.set_len(len) {
                warn!(path = %path.display(), error = %truncate, "could not truncate partial line");
            }
            return Err(unavailable(&path, e));
        }
        Ok(())
    }

    fn persist<T: Serialize + Clone>(
        &mut self,
        kind: EntityKind,
        record: T,
        create: impl FnOnce(&mut MemoryStore, T) -> StoreResult<T>,
        as_row: fn(T) -> CanonicalRow,
    ) -> StoreResult<T> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        let created = create(&mut self.index, record)?;
        if let Err(e) = self.append(kind, &created) {
            self.index.forget(&as_row(created));
            return Err(e);
        }
        Ok(created)
    }
}

impl Store for JsonLinesStore {
    fn create_user(&mut self, user: User) -> StoreResult<User> {
        self.persist(EntityKind::User, user, MemoryStore::create_user, CanonicalRow::User)
    }

    fn create_scooter(&mut self, scooter: Scooter) -> StoreResult<Scooter> {
        self.persist(EntityKind::Scooter, scooter, MemoryStore::create_scooter, CanonicalRow::Scooter)
    }

    fn create_tariff(&mut self, tariff: Tariff) -> StoreResult<Tariff> {
        self.persist(EntityKind::Tariff, tariff, MemoryStore::create_tariff, CanonicalRow::Tariff)
    }

    fn create_ride(&mut self, ride: Ride) -> StoreResult<Ride> {
        self.persist(EntityKind::Ride, ride, MemoryStore::create_ride, CanonicalRow::Ride)
    }

    fn create_payment(&mut self, payment: Payment) -> StoreResult<Payment> {
        self.persist(EntityKind::Payment, payment, MemoryStore::create_payment, CanonicalRow::Payment)
    }

    fn create_maintenance(&mut self, maintenance: Maintenance) -> StoreResult<Maintenance> {
        self.persist(EntityKind::Maintenance, maintenance, MemoryStore::create_maintenance, CanonicalRow::Maintenance)
    }

    fn close(&mut self) -> StoreResult<()> {
        self.closed = true;
        for (kind, file) in self.writers.drain() {
            file.sync_all()
                .map_err(|e| unavailable(&self.dir.join(format!("{}.jsonl", kind.as_str())), e))?;
        }
        self.index.close()
    }
}
