use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use solana_sdk::pubkey::Pubkey;

use crate::error::{LaunchpadError, LaunchpadResult};

/// Programs an outbound instruction may target.
///
/// Changes only through `add`/`remove`/`clear`; lookups never hold the lock
/// beyond the call.
#[derive(Debug, Default)]
pub struct ProgramAllowlist {
    programs: RwLock<HashSet<Pubkey>>,
}

impl ProgramAllowlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_programs(programs: impl IntoIterator<Item = Pubkey>) -> Self {
        Self {
            programs: RwLock::new(programs.into_iter().collect()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashSet<Pubkey>> {
        self.programs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<Pubkey>> {
        self.programs.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns `false` if the program was already present
    pub fn add(&self, program_id: Pubkey) -> bool {
        let added = self.write().insert(program_id);
        if added {
            log::debug!("allowlisted program {program_id}");
        }
        added
    }

    /// Returns `false` if the program was not present
    pub fn remove(&self, program_id: &Pubkey) -> bool {
        let removed = self.write().remove(program_id);
        if removed {
            log::debug!("removed program {program_id} from allowlist");
        }
        removed
    }

    pub fn contains(&self, program_id: &Pubkey) -> bool {
        self.read().contains(program_id)
    }

    /// Sorted snapshot
    pub fn programs(&self) -> Vec<Pubkey> {
        let mut programs: Vec<Pubkey> = self.read().iter().copied().collect();
        programs.sort();
        programs
    }

    pub fn clear(&self) {
        self.write().clear();
        log::info!("allowlist cleared");
    }

    pub fn check(&self, program_id: &Pubkey) -> LaunchpadResult<()> {
        if self.contains(program_id) {
            Ok(())
        } else {
            log::warn!("program {program_id} is not in the allowlist");
            Err(LaunchpadError::ProgramNotAllowed(*program_id))
        }
    }
}
