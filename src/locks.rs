//! Per-game mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arcade_engine::GameId;
use tracing::{debug, instrument};

/// One mutex per game id, created on first use and dropped once idle.
///
/// Every read-modify-write of a game (human move, join, bot turn) runs while
/// holding that game's guard; the database transaction nests inside it.
#[derive(Debug, Clone, Default)]
pub struct GameLocks {
    locks: Arc<Mutex<HashMap<GameId, Arc<Mutex<()>>>>>,
}

impl GameLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the guard of `game_id`.
    ///
    /// The table entry is removed afterwards unless another caller is
    /// holding or waiting on the same mutex.
    pub fn with_game<T>(&self, game_id: GameId, f: impl FnOnce() -> T) -> T {
        let handle = self.handle(game_id);
        let result = {
            let _guard = acquire(&handle);
            f()
        };
        drop(handle);
        self.prune(game_id);
        result
    }

    /// Number of games with a live lock.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    /// Returns true if no game is locked or waited on.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[instrument(skip(self))]
    fn handle(&self, game_id: GameId) -> Arc<Mutex<()>> {
        let mut locks = self.table();
        let handle = locks.entry(game_id).or_default().clone();
        debug!(tracked = locks.len(), "Lock handle");
        handle
    }

    /// Handles are only cloned under the table mutex, so a count of one
    /// means nobody else can reach this entry.
    fn prune(&self, game_id: GameId) {
        let mut locks = self.table();
        if locks
            .get(&game_id)
            .is_some_and(|handle| Arc::strong_count(handle) == 1)
        {
            locks.remove(&game_id);
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<GameId, Arc<Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Acquires a game guard, recovering from a panicked holder.
fn acquire(handle: &Mutex<()>) -> MutexGuard<'_, ()> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}
