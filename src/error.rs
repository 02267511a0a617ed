use std::time::Duration;

use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::safety::InstructionKind;
use crate::types::Platform;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchpadError {
    #[error("RPC error: {0}")]
    RpcError(String),
    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),
    #[error("Malformed account data for {account}: {reason}")]
    MalformedAccountData { account: Pubkey, reason: String },
    #[error("Stale read for {account}: {reason}")]
    StaleRead { account: Pubkey, reason: String },
    #[error("Insufficient liquidity: trade needs {requested}, curve holds {available}")]
    InsufficientLiquidity { requested: u64, available: u64 },
    #[error("Quote expired at {deadline}")]
    QuoteExpired { deadline: DateTime<Utc> },
    #[error("Invalid trade args: {0}")]
    InvalidTradeArgs(String),
    #[error("Program {0} is not in the allowlist")]
    ProgramNotAllowed(Pubkey),
    #[error("Invalid {kind} instruction: {reason}")]
    InvalidInstructionShape {
        kind: InstructionKind,
        reason: String,
    },
    #[error("No program address found for program {0} within the bump search")]
    DerivationExhausted(Pubkey),
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),
    #[error("Program {program_id} is not a verified {platform} program (schema version {version})")]
    UnsupportedProgramVersion {
        platform: Platform,
        program_id: Pubkey,
        version: u16,
    },
    #[error("Bonding curve for {0} is complete")]
    CurveComplete(Pubkey),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LaunchpadError {
    /// Whether the caller may retry the same call unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LaunchpadError::RpcError(_)
                | LaunchpadError::Timeout(_)
                | LaunchpadError::StaleRead { .. }
        )
    }

    /// Rejections raised by the safety gate.
    pub fn is_safety_rejection(&self) -> bool {
        matches!(
            self,
            LaunchpadError::ProgramNotAllowed(_) | LaunchpadError::InvalidInstructionShape { .. }
        )
    }
}

pub type LaunchpadResult<T> = Result<T, LaunchpadError>;
