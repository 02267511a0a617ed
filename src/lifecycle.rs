use std::fmt;

use solana_sdk::pubkey::Pubkey;

use crate::error::{LaunchpadError, LaunchpadResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TradeStage {
    Idle,
    CurveFetched,
    Quoted,
    Built,
    Simulated,
    Done,
    Rejected,
}

impl TradeStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TradeStage::Done | TradeStage::Rejected)
    }

    fn can_advance_to(&self, next: TradeStage) -> bool {
        use TradeStage::*;
        match (self, next) {
            (Idle, CurveFetched)
            | (CurveFetched, Quoted)
            | (Quoted, Built)
            | (Built, Simulated)
            | (Built, Done)
            | (Simulated, Done) => true,
            (current, Rejected) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for TradeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Stage tracking for one trade build
#[derive(Debug)]
pub struct TradeLifecycle {
    token: Pubkey,
    stage: TradeStage,
}

impl TradeLifecycle {
    pub fn new(token: Pubkey) -> Self {
        Self {
            token,
            stage: TradeStage::Idle,
        }
    }

    pub fn stage(&self) -> TradeStage {
        self.stage
    }

    pub fn advance(&mut self, next: TradeStage) -> LaunchpadResult<()> {
        if !self.stage.can_advance_to(next) {
            return Err(LaunchpadError::Internal(format!(
                "illegal trade transition {} -> {next}",
                self.stage
            )));
        }
        log::debug!("trade {}: {} -> {next}", self.token, self.stage);
        self.stage = next;
        Ok(())
    }

    /// Marks the trade rejected and hands back `err`
    pub fn reject(&mut self, err: LaunchpadError) -> LaunchpadError {
        if !self.stage.is_terminal() {
            log::debug!("trade {}: {} -> Rejected ({err})", self.token, self.stage);
            self.stage = TradeStage::Rejected;
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut trade = TradeLifecycle::new(Pubkey::new_unique());
        for stage in [
            TradeStage::CurveFetched,
            TradeStage::Quoted,
            TradeStage::Built,
            TradeStage::Simulated,
            TradeStage::Done,
        ] {
            trade.advance(stage).unwrap();
        }
        assert!(trade.stage().is_terminal());
        assert!(trade.advance(TradeStage::Rejected).is_err());
    }

    #[test]
    fn test_skipping_a_stage_fails() {
        let mut trade = TradeLifecycle::new(Pubkey::new_unique());
        assert!(trade.advance(TradeStage::Quoted).is_err());
        let err = trade.reject(LaunchpadError::Cancelled);
        assert_eq!(err, LaunchpadError::Cancelled);
        assert_eq!(trade.stage(), TradeStage::Rejected);
    }
}
