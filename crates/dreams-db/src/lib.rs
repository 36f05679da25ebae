pub mod messages;
pub mod models;
pub mod queries;
pub mod standups;

use anyhow::{Result, anyhow};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use crate::models::State;

/// Process-wide in-memory store. Every table sits behind one lock, so any
/// closure passed to `with_state_mut` observes and commits a consistent snapshot.
pub struct Database {
    state: RwLock<State>,
}

impl Database {
    pub fn open() -> Self {
        info!("In-memory store initialised");
        Self {
            state: RwLock::new(State::default()),
        }
    }

    /// Drop every table and restart all identifier counters.
    pub fn reset(&self) -> Result<()> {
        let mut state = self.write()?;
        *state = State::default();
        info!("Store reset");
        Ok(())
    }

    pub(crate) fn with_state<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&State) -> Result<T>,
    {
        let state = self.read()?;
        f(&state)
    }

    pub(crate) fn with_state_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut State) -> Result<T>,
    {
        let mut state = self.write()?;
        f(&mut state)
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| anyhow!("Store lock poisoned: {}", e))
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| anyhow!("Store lock poisoned: {}", e))
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::open()
    }
}
