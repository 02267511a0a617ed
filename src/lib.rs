//! # Launchpad Adapters
//!
//! One trading surface over bonding-curve token launchpads on Solana. Every
//! supported platform (pump.fun and bonk.fun today) is reached through the
//! same five capabilities:
//!
//! 1. **Fetch**: read and decode a token's bonding curve into a [`CurveState`]
//! 2. **Quote**: price a buy or sell against that snapshot
//! 3. **Build**: assemble an [`UnsignedTransaction`] for the trade
//! 4. **Parse**: decode trade and create events out of confirmed transactions
//! 5. **Simulate**: hand a built transaction to a node for a dry run
//!
//! The crate never signs or sends anything. Transactions come back unsigned
//! and the caller's wallet layer takes it from there.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use launchpad_adapters::{AdapterConfig, AdapterRegistry, Platform, Side, TradeArgs};
//! use solana_sdk::pubkey::Pubkey;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let registry = AdapterRegistry::connect(&AdapterConfig::from_env()?)?;
//! let cancel = CancellationToken::new();
//!
//! let token = Pubkey::new_unique();
//! let wallet = Pubkey::new_unique();
//! let args = TradeArgs::new(token, 100_000_000).with_actor(wallet); // 0.1 SOL
//!
//! let quote = registry.quote(Platform::PumpFun, Side::Buy, &args, &cancel).await?;
//! println!("expected tokens: {}", quote.output_amount);
//!
//! let tx = registry
//!     .build_transaction(Platform::PumpFun, Side::Buy, &args, None, &cancel)
//!     .await?;
//! println!("{} instructions", tx.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Safety Gate
//!
//! Every instruction goes through the [`SafetyGate`] before it can be part of
//! a transaction: the target program must be on the [`ProgramAllowlist`], the
//! account list must match the instruction's template and compute budget
//! values are rounded to coarse steps. A rejected instruction fails the whole
//! build.
//!
//! ## SOL/WSOL Handling
//!
//! bonk.fun pools are quoted in WSOL. Buys wrap the SOL amount first, and
//! both sides close the WSOL account afterwards so proceeds arrive as SOL.
//! pump.fun trades take native SOL directly.

mod account_metas;
mod adapter;
mod cache;
mod codec;
mod config;
mod constants;
mod curve;
mod error;
mod events;
mod lifecycle;
mod metadata;
mod pda;
mod privacy;
mod registry;
mod rpc;
mod safety;
mod schema;
mod transaction;
mod types;
mod utils;

pub use adapter::{AdapterSettings, LaunchpadAdapter, SimulatedTrade};
pub use cache::CurveCache;
pub use codec::{
    CreateEventData, DecodedEvent, InstructionCodec, TradeEventData, TradeInstructionArgs,
};
pub use config::{AdapterConfig, DEFAULT_RPC_URL};
pub use constants::{BONK_FUN_PROGRAM_ID, PUMP_FUN_PROGRAM_ID, WSOL_MINT};
pub use curve::{ConstantProductCurve, CurveModel, CurveQuote, CurveState};
pub use error::{LaunchpadError, LaunchpadResult};
pub use events::{AdapterEvent, EventKind, ParsedInstruction, ParsedTransaction, parse_events};
pub use lifecycle::{TradeLifecycle, TradeStage};
pub use metadata::decode_token_metadata;
pub use pda::{
    associated_token_address, curve_address, derive_program_address, metadata_address, program_pda,
};
pub use privacy::{MAX_SLICES, PrivacyConfig, PrivacyPlan, split_amount};
pub use registry::AdapterRegistry;
pub use rpc::{
    AccountData, AccountReader, BalanceDelta, ReadError, RpcAccountReader, RpcTransactionSimulator,
    SimulationResult, TransactionSimulator,
};
pub use safety::{
    AccountFlags, AdmittedInstruction, InstructionKind, InstructionTemplate, ProgramAllowlist,
    SafetyGate, sanitize, validate,
};
pub use schema::{
    BONK_FUN_V1, PUMP_FUN_V1, PlatformSchema, VERIFIED_SCHEMAS, schema_for, verified_schema,
};
pub use transaction::{TransactionBuilder, UnsignedTransaction};
pub use types::{Platform, Quote, Side, TokenInfo, TradeArgs, default_slippage};
pub use utils::{apply_max_slippage, apply_min_slippage};
