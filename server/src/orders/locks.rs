//! Per-table async locks
//!
//! Every lifecycle operation that can change a table's occupancy holds the
//! lock of each table it touches from before its transaction starts until
//! after it commits, so two recomputations of the same table never
//! interleave. Locks are always taken in ascending id order.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct TableLocks {
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

/// Guards for a set of tables, released on drop
#[must_use]
pub struct TableGuards {
    _guards: Vec<OwnedMutexGuard<()>>,
    tables: Vec<i64>,
}

impl TableGuards {
    pub fn tables(&self) -> &[i64] {
        &self.tables
    }
}

impl TableLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every table in `tables` (`None` entries are skipped)
    pub async fn acquire<I>(&self, tables: I) -> TableGuards
    where
        I: IntoIterator<Item = Option<i64>>,
    {
        let mut ids: Vec<i64> = tables.into_iter().flatten().collect();
        ids.sort_unstable();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in &ids {
            let lock = self
                .locks
                .entry(*id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            guards.push(lock.lock_owned().await);
        }
        TableGuards {
            _guards: guards,
            tables: ids,
        }
    }

    /// Number of tables that ever had a lock
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
