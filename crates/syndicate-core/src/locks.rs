//! Per-player mutual exclusion.
//!
//! A crime attempt reads a player's jail and cooldown state, decides, and
//! writes. Two attempts for the same player must not interleave those
//! steps, but attempts for different players must never wait on each
//! other. [`PlayerLocks`] hands out one async mutex per player; entries
//! nobody holds or waits on are pruned once the map grows.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use syndicate_types::PlayerId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Idle entries are pruned once the map holds more than this many players.
const PRUNE_THRESHOLD: usize = 1_024;

/// Registry of per-player async mutexes.
#[derive(Debug, Default)]
pub struct PlayerLocks {
    slots: Mutex<HashMap<PlayerId, Arc<AsyncMutex<()>>>>,
}

/// Proof that the holder has exclusive access to one player.
///
/// Released on drop.
#[derive(Debug)]
pub struct PlayerGuard {
    _guard: OwnedMutexGuard<()>,
}

impl PlayerLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `player_id`.
    pub async fn acquire(&self, player_id: PlayerId) -> PlayerGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            if slots.len() > PRUNE_THRESHOLD {
                // Only the map holds an idle slot, so nobody can be waiting on it.
                slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            }
            Arc::clone(slots.entry(player_id).or_default())
        };
        PlayerGuard {
            _guard: slot.lock_owned().await,
        }
    }

    /// Number of players currently tracked.
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
