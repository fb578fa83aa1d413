//! Loading canonical rows into a persistence collaborator.
//!
//! [`Store`] is the consumed contract: one create operation per entity kind, each of which may
//! fail on a constraint violation or an unavailable backend. The [`Loader`] owns a store for the
//! duration of a run, issues one create per row, and isolates failures so a bad row never aborts
//! its batch. Each row is its own unit of work.

pub mod jsonl;
pub mod memory;

use std::num::NonZeroUsize;

use tracing::{debug, error};

use crate::error::StoreResult;
use crate::transform::{CanonicalRow, Maintenance, Payment, Ride, Scooter, Tariff, User};
use crate::types::BatchStats;

pub use jsonl::JsonLinesStore;
pub use memory::MemoryStore;

/// Persistence collaborator contract.
///
/// Every `create_*` returns the record as stored, with its identifier assigned when the input
/// had none.
pub trait Store {
    fn create_user(&mut self, user: User) -> StoreResult<User>;
    fn create_scooter(&mut self, scooter: Scooter) -> StoreResult<Scooter>;
    fn create_tariff(&mut self, tariff: Tariff) -> StoreResult<Tariff>;
    fn create_ride(&mut self, ride: Ride) -> StoreResult<Ride>;
    fn create_payment(&mut self, payment: Payment) -> StoreResult<Payment>;
    fn create_maintenance(&mut self, maintenance: Maintenance) -> StoreResult<Maintenance>;

    /// Release the session. Further creates fail with [`crate::error::StoreError::Closed`].
    fn close(&mut self) -> StoreResult<()>;

    /// Dispatch a canonical row to the matching create operation.
    fn create(&mut self, row: CanonicalRow) -> StoreResult<CanonicalRow> {
        Ok(match row {
            CanonicalRow::User(r) => CanonicalRow::User(self.create_user(r)?),
            CanonicalRow::Scooter(r) => CanonicalRow::Scooter(self.create_scooter(r)?),
            CanonicalRow::Tariff(r) => CanonicalRow::Tariff(self.create_tariff(r)?),
            CanonicalRow::Ride(r) => CanonicalRow::Ride(self.create_ride(r)?),
            CanonicalRow::Payment(r) => CanonicalRow::Payment(self.create_payment(r)?),
            CanonicalRow::Maintenance(r) => CanonicalRow::Maintenance(self.create_maintenance(r)?),
        })
    }
}

/// Issues create requests for canonical rows and records outcomes into [`BatchStats`].
#[derive(Debug)]
pub struct Loader<S: Store> {
    store: S,
    chunk_size: NonZeroUsize,
    closed: bool,
}

impl<S: Store> Loader<S> {
    /// Create a loader owning `store` that hands rows over `chunk_size` at a time.
    pub fn new(store: S, chunk_size: NonZeroUsize) -> Self {
        Self {
            store,
            chunk_size,
            closed: false,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Create every row in order. Successes bump `stats.created`; failures append their message to
    /// `stats.errors` and processing continues with the next row.
    pub fn load(&mut self, rows: Vec<CanonicalRow>, stats: &mut BatchStats) {
        let total = rows.len();
        let mut rows = rows.into_iter().peekable();
        let mut offset = 0;
        while rows.peek().is_some() {
            let chunk: Vec<CanonicalRow> = rows.by_ref().take(self.chunk_size.get()).collect();
            let len = chunk.len();
            for row in chunk {
                let kind = row.kind();
                let id = row.id();
                match self.store.create(row) {
                    Ok(_) => stats.created += 1,
                    Err(e) => {
                        error!(entity = %kind, id = ?id, error = %e, "failed to create record");
                        stats.errors.push(e.to_string());
                    }
                }
            }
            offset += len;
            debug!(loaded = offset, total, "chunk loaded");
        }
    }

    /// Release the store session. Only the first call reaches the store.
    pub fn close(&mut self) -> StoreResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.store.close()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::error::StoreError;

    fn user(phone: &str) -> CanonicalRow {
        CanonicalRow::User(User {
            user_id: Some(Uuid::new_v4()),
            first_name: "Anna".into(),
            last_name: "K".into(),
            email: None,
            phone_number: Some(phone.into()),
            date_of_birth: None,
            registration_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            rating: 0.0,
        })
    }

    fn chunk(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn failures_do_not_abort_the_batch() {
        let mut loader = Loader::new(MemoryStore::new(), chunk(2));
        let mut stats = BatchStats::new();
        let rows = vec![
            user("+79990000001"),
            user("+79990000001"),
            user("+79990000002"),
            user("79990000003"),
            user("+79990000004"),
        ];
        loader.load(rows, &mut stats);
        assert_eq!(stats.created, 3);
        assert_eq!(stats.errors.len(), 2);
        assert!(stats.errors[0].contains("duplicate user phone_number"));
        assert_eq!(loader.store().user_count(), 3);
    }

    #[test]
    fn close_reaches_the_store_once() {
        let mut loader = Loader::new(MemoryStore::new(), chunk(10));
        loader.close().unwrap();
        loader.close().unwrap();
        assert!(loader.is_closed());
        assert_eq!(loader.store().close_calls(), 1);

        let mut stats = BatchStats::new();
        loader.load(vec![user("+79990000001")], &mut stats);
        assert_eq!(stats.created, 0);
        assert_eq!(stats.errors, vec![StoreError::Closed.to_string()]);
    }
}
