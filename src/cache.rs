use std::sync::Arc;

use moka::ops::compute::{CompResult, Op};
use moka::sync::Cache;
use solana_sdk::pubkey::Pubkey;

use crate::curve::CurveState;
use crate::error::{LaunchpadError, LaunchpadResult};

/// Latest curve snapshot per token.
///
/// Entries are whole `Arc` snapshots swapped in one step, so a reader holds
/// either the old snapshot or the new one.
#[derive(Clone)]
pub struct CurveCache {
    inner: Cache<Pubkey, Arc<CurveState>>,
}

impl CurveCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn get(&self, token: &Pubkey) -> Option<Arc<CurveState>> {
        self.inner.get(token)
    }

    /// Replaces the snapshot of `state.token`.
    ///
    /// Refuses a snapshot read at an older slot than the cached one.
    pub fn replace(&self, state: CurveState) -> LaunchpadResult<Arc<CurveState>> {
        let fresh = Arc::new(state);
        let candidate = Arc::clone(&fresh);

        let result = self
            .inner
            .entry(fresh.token)
            .and_compute_with(|current| match current {
                Some(entry) if entry.value().slot > candidate.slot => Op::Nop,
                _ => Op::Put(candidate),
            });

        match result {
            CompResult::Unchanged(entry) => {
                let reason = format!(
                    "read at slot {} is behind cached slot {}",
                    fresh.slot,
                    entry.value().slot
                );
                log::warn!("stale curve read for {}: {reason}", fresh.token);
                Err(LaunchpadError::StaleRead {
                    account: fresh.curve_account,
                    reason,
                })
            }
            _ => Ok(fresh),
        }
    }

    pub fn invalidate(&self, token: &Pubkey) {
        self.inner.invalidate(token);
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}
