//! Per-player mutual exclusion over a fixed table of lock shards.
//!
//! Memory stays bounded regardless of how many players exist; two players
//! hashing to one shard merely serialize against each other.
use log::trace;
use smallvec::SmallVec;
use tokio::sync::{Mutex, MutexGuard};
use twox_hash::XxHash64;

use crate::constants::LOG_TARGET_GUARD;
use crate::ledger::PlayerId;

pub const DEFAULT_SHARDS: usize = 256;
const SHARD_SEED: u64 = 0x5348_4144_4f57;

/// Held exclusion over one or two players. Released on drop.
#[derive(Debug)]
pub struct PlayerGuard<'a> {
    _guards: SmallVec<[MutexGuard<'a, ()>; 2]>,
    shards: SmallVec<[usize; 2]>,
}

impl PlayerGuard<'_> {
    /// Shard indices held, ascending.
    #[must_use]
    pub fn shards(&self) -> &[usize] {
        &self.shards
    }
}

#[derive(Debug)]
pub struct LockTable {
    shards: Vec<Mutex<()>>,
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new(DEFAULT_SHARDS)
    }
}

impl LockTable {
    /// Build a table with `shards` locks (at least one).
    #[must_use]
    pub fn new(shards: usize) -> Self {
        Self {
            shards: (0..shards.max(1)).map(|_| Mutex::new(())).collect(),
        }
    }

    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    #[must_use]
    pub fn shard_of(&self, id: PlayerId) -> usize {
        let hash = XxHash64::oneshot(SHARD_SEED, &id.0.to_le_bytes());
        let count = u64::try_from(self.shards.len()).unwrap_or(u64::MAX);
        usize::try_from(hash % count).unwrap_or(0)
    }

    /// Exclusive access to one player's record.
    pub async fn acquire(&self, id: PlayerId) -> PlayerGuard<'_> {
        let shard = self.shard_of(id);
        trace!(target: LOG_TARGET_GUARD, "acquire player {id} shard {shard}");
        let guard = self.shards[shard].lock().await;
        PlayerGuard {
            _guards: smallvec::smallvec![guard],
            shards: smallvec::smallvec![shard],
        }
    }

    /// Exclusive access to two players' records.
    ///
    /// Shards are locked in ascending order and a shared shard only once, so
    /// concurrent pair acquisitions cannot deadlock.
    pub async fn acquire_pair(&self, first: PlayerId, second: PlayerId) -> PlayerGuard<'_> {
        let mut shards: SmallVec<[usize; 2]> =
            smallvec::smallvec![self.shard_of(first), self.shard_of(second)];
        shards.sort_unstable();
        shards.dedup();
        trace!(
            target: LOG_TARGET_GUARD,
            "acquire pair {first}/{second} shards {shards:?}"
        );
        let mut guards = SmallVec::new();
        for &shard in &shards {
            guards.push(self.shards[shard].lock().await);
        }
        PlayerGuard {
            _guards: guards,
            shards,
        }
    }
}
