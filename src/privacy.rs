use std::time::Duration;

use solana_sdk::pubkey::Pubkey;

use crate::error::{LaunchpadError, LaunchpadResult};
use crate::types::TradeArgs;

pub const MAX_SLICES: u8 = 8;

/// Optional transaction-shaping options, applied to the trade arguments
/// before anything is encoded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrivacyConfig {
    /// Fee payer and trading authority in place of the caller's actor
    pub alternate_signer: Option<Pubkey>,
    /// Split the amount into `slice_count` sequential trade instructions
    pub order_slicing: bool,
    pub slice_count: u8,
    /// Advisory delay hint for the external scheduler, never slept on here
    pub timing_jitter: Option<Duration>,
}

/// Result of applying a [`PrivacyConfig`] to one trade
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrivacyPlan {
    pub actor: Option<Pubkey>,
    /// Per-instruction amounts, summing to the original amount
    pub slices: Vec<u64>,
    pub timing_jitter: Option<Duration>,
}

impl PrivacyConfig {
    pub fn with_alternate_signer(mut self, signer: Pubkey) -> Self {
        self.alternate_signer = Some(signer);
        self
    }

    pub fn with_slicing(mut self, slice_count: u8) -> Self {
        self.order_slicing = true;
        self.slice_count = slice_count;
        self
    }

    pub fn with_timing_jitter(mut self, jitter: Duration) -> Self {
        self.timing_jitter = Some(jitter);
        self
    }

    fn slices(&self) -> LaunchpadResult<u8> {
        if !self.order_slicing {
            return Ok(1);
        }
        if self.slice_count == 0 || self.slice_count > MAX_SLICES {
            return Err(LaunchpadError::InvalidTradeArgs(format!(
                "slice count {} outside 1..={MAX_SLICES}",
                self.slice_count
            )));
        }
        Ok(self.slice_count)
    }

    pub fn apply(&self, args: &TradeArgs) -> LaunchpadResult<PrivacyPlan> {
        let count = self.slices()?;
        Ok(PrivacyPlan {
            actor: self.alternate_signer.or(args.actor),
            slices: split_amount(args.amount, count)?,
            timing_jitter: self.timing_jitter,
        })
    }
}

impl PrivacyPlan {
    /// Plan of a trade without a privacy configuration
    pub fn passthrough(args: &TradeArgs) -> Self {
        Self {
            actor: args.actor,
            slices: vec![args.amount],
            timing_jitter: None,
        }
    }
}

/// Near-equal split, the remainder going one unit each to the first slices
pub fn split_amount(amount: u64, count: u8) -> LaunchpadResult<Vec<u64>> {
    let n = u64::from(count.max(1));
    if amount < n {
        return Err(LaunchpadError::InvalidTradeArgs(format!(
            "amount {amount} cannot be split into {n} non-empty slices"
        )));
    }
    let base = amount / n;
    let remainder = amount % n;
    Ok((0..n).map(|i| base + u64::from(i < remainder)).collect())
}
