//! Two-phase optimistic mutations over keyed records.
//!
//! [`OptimisticLedger::apply`] mutates a record in place and returns a
//! [`Pending`] ticket; the ticket is later settled with [`confirm`] or
//! [`rollback`] once the remote call resolves.
//!
//! Every mutation gets a stamp. Only the most recently issued mutation for a
//! key may change visible state when it settles; older ones are reported as
//! [`Settlement::Superseded`]. Rollback restores the last state known to be
//! persisted (the baseline), so a late failure never resurrects a value the
//! backend never accepted.
//!
//! [`confirm`]: OptimisticLedger::confirm
//! [`rollback`]: OptimisticLedger::rollback

use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Task;

pub trait Keyed {
    fn key(&self) -> Uuid;
}

impl Keyed for Task {
    fn key(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Settlement {
    /// Nothing to do: the requested state was already current.
    Unchanged,
    /// Remote accepted; local state reconciled with the remote record.
    Confirmed,
    /// Remote rejected; local state restored.
    RolledBack,
    /// A later mutation of the same record owns the visible state.
    Superseded,
}

/// Ticket for an applied, not yet settled mutation.
#[derive(Debug, Clone)]
pub struct Pending<T> {
    key: Uuid,
    stamp: u64,
    previous: T,
    applied: T,
}

impl<T> Pending<T> {
    pub fn key(&self) -> Uuid {
        self.key
    }

    /// Visible state right before this mutation.
    pub fn previous(&self) -> &T {
        &self.previous
    }

    pub fn applied(&self) -> &T {
        &self.applied
    }
}

#[derive(Debug)]
struct Entry<T> {
    latest: u64,
    baseline: T,
}

#[derive(Debug)]
pub struct OptimisticLedger<T> {
    entries: HashMap<Uuid, Entry<T>>,
    counter: u64,
}

impl<T> Default for OptimisticLedger<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            counter: 0,
        }
    }
}

impl<T: Keyed + Clone> OptimisticLedger<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with unsettled mutations.
    pub fn in_flight(&self) -> usize {
        self.entries.len()
    }

    pub fn is_pending(&self, key: Uuid) -> bool {
        self.entries.contains_key(&key)
    }

    /// Applies `mutate` to the record with `key`. `None` if no such record.
    pub fn apply(
        &mut self,
        records: &mut [T],
        key: Uuid,
        mutate: impl FnOnce(&mut T),
    ) -> Option<Pending<T>> {
        let slot = records.iter_mut().find(|r| r.key() == key)?;
        let previous = slot.clone();
        mutate(&mut *slot);
        let applied = slot.clone();

        self.counter += 1;
        let stamp = self.counter;
        self.entries
            .entry(key)
            .and_modify(|e| e.latest = stamp)
            .or_insert_with(|| Entry {
                latest: stamp,
                baseline: previous.clone(),
            });

        Some(Pending {
            key,
            stamp,
            previous,
            applied,
        })
    }

    fn latest_stamp(&self, key: Uuid) -> Option<u64> {
        self.entries.get(&key).map(|e| e.latest)
    }

    /// Settles a mutation the remote accepted, adopting `remote` when current.
    pub fn confirm(&mut self, records: &mut [T], pending: Pending<T>, remote: T) -> Settlement {
        match self.latest_stamp(pending.key) {
            Some(latest) if latest == pending.stamp => {
                self.entries.remove(&pending.key);
                if let Some(slot) = records.iter_mut().find(|r| r.key() == pending.key) {
                    *slot = remote;
                }
                Settlement::Confirmed
            }
            Some(_) => {
                if let Some(entry) = self.entries.get_mut(&pending.key) {
                    entry.baseline = remote;
                }
                Settlement::Superseded
            }
            None => Settlement::Superseded,
        }
    }

    /// Settles a mutation the remote rejected, restoring the baseline when current.
    pub fn rollback(&mut self, records: &mut [T], pending: Pending<T>) -> Settlement {
        if self.latest_stamp(pending.key) != Some(pending.stamp) {
            return Settlement::Superseded;
        }
        if let Some(entry) = self.entries.remove(&pending.key) {
            if let Some(slot) = records.iter_mut().find(|r| r.key() == pending.key) {
                *slot = entry.baseline;
            }
        }
        Settlement::RolledBack
    }
}
