// src/trend/store.rs
//! Latest-observation table, one entry per key.
//!
//! The only mutator is `update`, which swaps in the new observation and hands
//! back the previous one in a single locked step. There is no
//! separate getter: "diff against last state" must be one indivisible call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::Observation;

/// Keyed store consulted by the trend detector.
pub trait ObservationStore: Send + Sync {
    /// Store `observation` under `key`, returning the value it replaced.
    /// `None` means this is the first observation for `key`.
    fn update(&self, key: &str, observation: Observation) -> Option<Observation>;

    /// Number of distinct keys tracked.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store. Memory grows by one observation per distinct key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Observation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with prior readings, e.g. from the persisted seen-state.
    /// Later entries for the same key win.
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = Observation>,
    {
        let map = observations
            .into_iter()
            .map(|o| (o.key.clone(), o))
            .collect::<HashMap<_, _>>();
        Self {
            inner: Mutex::new(map),
        }
    }

    // A panicking writer cannot leave a half-swapped entry behind (insert is
    // a single call), so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Observation>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ObservationStore for MemoryStore {
    fn update(&self, key: &str, observation: Observation) -> Option<Observation> {
        self.lock().insert(key.to_string(), observation)
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}
