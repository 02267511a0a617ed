//! Data-only descriptors of each launchpad program's binary interface.
//!
//! A [`PlatformSchema`] carries everything the codec needs to read a curve
//! account, encode a trade instruction and decode the program's events.
//! Supporting a program in an already known family of layouts is adding a
//! schema here, not new parsing code.

use solana_sdk::pubkey::Pubkey;

use crate::constants::*;
use crate::error::{LaunchpadError, LaunchpadResult};
use crate::types::{Platform, Side};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    U8,
    U64,
    I64,
    Bool,
    Pubkey,
}

impl FieldKind {
    pub const fn width(&self) -> usize {
        match self {
            FieldKind::U8 | FieldKind::Bool => 1,
            FieldKind::U64 | FieldKind::I64 => 8,
            FieldKind::Pubkey => 32,
        }
    }
}

/// Curve account fields, named from the trader's side: "sol" is the base
/// asset paid in, "token" is the launched mint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CurveField {
    VirtualTokenReserves,
    VirtualSolReserves,
    RealTokenReserves,
    RealSolReserves,
    TokenTotalSupply,
    TotalTokenSell,
    Complete,
    Status,
    Mint,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: CurveField,
    /// Absolute offset, discriminator included
    pub offset: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(field: CurveField, offset: usize, kind: FieldKind) -> Self {
        Self {
            field,
            offset,
            kind,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountLayout {
    pub discriminator: [u8; 8],
    pub fields: &'static [FieldSpec],
}

impl AccountLayout {
    /// Shortest buffer holding every field
    pub fn min_len(&self) -> usize {
        self.fields
            .iter()
            .map(|f| f.offset + f.kind.width())
            .max()
            .unwrap_or(0)
            .max(self.discriminator.len())
    }

    pub fn field(&self, field: CurveField) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.field == field)
    }
}

/// How raw curve fields map onto effective constant-product reserves
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReserveMapping {
    /// Fields already hold effective reserves and a `complete` flag
    Direct,
    /// LaunchLab pools: `base = virtual_sol + real_sol`,
    /// `token = virtual_token - real_token`, tokens left to sell are
    /// `total_token_sell - real_token`, and any non-zero status has stopped
    /// trading.
    LaunchLab,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedPart {
    Literal(&'static [u8]),
    Mint,
    QuoteMint,
}

/// Source of one u64 LE argument after the discriminator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgSource {
    Amount,
    Limit,
    Constant(u64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstructionLayout {
    pub discriminator: [u8; 8],
    pub args: &'static [ArgSource],
}

impl InstructionLayout {
    pub fn data_len(&self) -> usize {
        self.discriminator.len() + self.args.len() * 8
    }
}

/// Which quote fields fill the `Amount` and `Limit` arguments
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TradeSemantics {
    /// amount = tokens out, limit = max base in
    ExactOutput,
    /// amount = input, limit = min output
    ExactInput,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TradeInstruction {
    pub layout: InstructionLayout,
    pub semantics: TradeSemantics,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectionField {
    pub offset: usize,
    pub buy_value: u8,
}

/// Event offsets are relative to the body after the event discriminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventAmounts {
    /// Separate base and token fields
    BaseToken { base: usize, token: usize },
    /// `amount_in`/`amount_out`, meaning flips with direction
    InOut { input: usize, output: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPubkey {
    Field(usize),
    /// Account index in the trade instruction that emitted the event
    InstructionAccount(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TradeEventLayout {
    pub discriminator: [u8; 8],
    pub direction: DirectionField,
    pub amounts: EventAmounts,
    pub mint: EventPubkey,
    pub trader: EventPubkey,
    pub timestamp: Option<usize>,
}

impl TradeEventLayout {
    pub fn body_len(&self) -> usize {
        let mut len = self.direction.offset + 1;
        let (a, b) = match self.amounts {
            EventAmounts::BaseToken { base, token } => (base, token),
            EventAmounts::InOut { input, output } => (input, output),
        };
        len = len.max(a + 8).max(b + 8);
        for key in [self.mint, self.trader] {
            if let EventPubkey::Field(offset) = key {
                len = len.max(offset + 32);
            }
        }
        if let Some(ts) = self.timestamp {
            len = len.max(ts + 8);
        }
        len
    }
}

/// Borsh-encoded create event: `leading_strings` length-prefixed strings,
/// then pubkeys at offsets relative to the end of the strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateEventLayout {
    pub discriminator: [u8; 8],
    pub leading_strings: usize,
    pub mint_offset: usize,
    pub trader_offset: usize,
}

/// Account list family of the trade instructions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountScheme {
    PumpFun {
        fee_recipient: Pubkey,
    },
    LaunchLab {
        global_config: Pubkey,
        platform_config: Pubkey,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlatformSchema {
    pub platform: Platform,
    pub version: u16,
    pub program_id: Pubkey,
    pub curve_seeds: &'static [SeedPart],
    pub curve_layout: AccountLayout,
    pub reserves: ReserveMapping,
    pub buy: TradeInstruction,
    pub sell: TradeInstruction,
    pub trade_event: TradeEventLayout,
    pub create_event: Option<CreateEventLayout>,
    pub accounts: AccountScheme,
    pub fee_bps: u64,
}

impl PlatformSchema {
    pub fn trade(&self, side: Side) -> &TradeInstruction {
        match side {
            Side::Buy => &self.buy,
            Side::Sell => &self.sell,
        }
    }

    /// Side of a trade instruction payload, by discriminator
    pub fn trade_side(&self, data: &[u8]) -> Option<Side> {
        if data.starts_with(&self.buy.layout.discriminator) {
            Some(Side::Buy)
        } else if data.starts_with(&self.sell.layout.discriminator) {
            Some(Side::Sell)
        } else {
            None
        }
    }

    /// Base side is paid in wrapped SOL
    pub fn needs_wsol(&self) -> bool {
        matches!(self.accounts, AccountScheme::LaunchLab { .. })
    }
}

const U64: FieldKind = FieldKind::U64;

pub static PUMP_FUN_V1: PlatformSchema = PlatformSchema {
    platform: Platform::PumpFun,
    version: 1,
    program_id: PUMP_FUN_PROGRAM_ID,
    curve_seeds: &[SeedPart::Literal(BONDING_CURVE_SEED), SeedPart::Mint],
    curve_layout: AccountLayout {
        discriminator: PUMP_FUN_BONDING_CURVE_DISCRIMINATOR,
        fields: &[
            FieldSpec::new(CurveField::VirtualTokenReserves, 8, U64),
            FieldSpec::new(CurveField::VirtualSolReserves, 16, U64),
            FieldSpec::new(CurveField::RealTokenReserves, 24, U64),
            FieldSpec::new(CurveField::RealSolReserves, 32, U64),
            FieldSpec::new(CurveField::TokenTotalSupply, 40, U64),
            FieldSpec::new(CurveField::Complete, 48, FieldKind::Bool),
        ],
    },
    reserves: ReserveMapping::Direct,
    buy: TradeInstruction {
        layout: InstructionLayout {
            discriminator: PUMP_FUN_BUY_DISCRIMINATOR,
            args: &[ArgSource::Amount, ArgSource::Limit],
        },
        semantics: TradeSemantics::ExactOutput,
    },
    sell: TradeInstruction {
        layout: InstructionLayout {
            discriminator: PUMP_FUN_SELL_DISCRIMINATOR,
            args: &[ArgSource::Amount, ArgSource::Limit],
        },
        semantics: TradeSemantics::ExactInput,
    },
    trade_event: TradeEventLayout {
        discriminator: TRADE_EVENT_DISCRIMINATOR,
        direction: DirectionField {
            offset: 48,
            buy_value: 1,
        },
        amounts: EventAmounts::BaseToken {
            base: 32,
            token: 40,
        },
        mint: EventPubkey::Field(0),
        trader: EventPubkey::Field(49),
        timestamp: Some(81),
    },
    create_event: Some(CreateEventLayout {
        discriminator: PUMP_FUN_CREATE_EVENT_DISCRIMINATOR,
        leading_strings: 3,
        mint_offset: 0,
        // mint, bonding_curve, user
        trader_offset: 64,
    }),
    accounts: AccountScheme::PumpFun {
        fee_recipient: PUMP_FUN_FEE_RECIPIENT,
    },
    fee_bps: 100,
};

pub static BONK_FUN_V1: PlatformSchema = PlatformSchema {
    platform: Platform::BonkFun,
    version: 1,
    program_id: BONK_FUN_PROGRAM_ID,
    curve_seeds: &[SeedPart::Literal(POOL_SEED), SeedPart::Mint, SeedPart::QuoteMint],
    curve_layout: AccountLayout {
        discriminator: LAUNCHLAB_POOL_STATE_DISCRIMINATOR,
        fields: &[
            FieldSpec::new(CurveField::Status, 17, FieldKind::U8),
            FieldSpec::new(CurveField::TokenTotalSupply, 21, U64),
            FieldSpec::new(CurveField::TotalTokenSell, 29, U64),
            FieldSpec::new(CurveField::VirtualTokenReserves, 37, U64),
            FieldSpec::new(CurveField::VirtualSolReserves, 45, U64),
            FieldSpec::new(CurveField::RealTokenReserves, 53, U64),
            FieldSpec::new(CurveField::RealSolReserves, 61, U64),
            FieldSpec::new(CurveField::Mint, 205, FieldKind::Pubkey),
        ],
    },
    reserves: ReserveMapping::LaunchLab,
    buy: TradeInstruction {
        layout: InstructionLayout {
            discriminator: LAUNCHLAB_BUY_EXACT_IN_DISCRIMINATOR,
            // amount_in, minimum_amount_out, share_fee_rate
            args: &[ArgSource::Amount, ArgSource::Limit, ArgSource::Constant(0)],
        },
        semantics: TradeSemantics::ExactInput,
    },
    sell: TradeInstruction {
        layout: InstructionLayout {
            discriminator: LAUNCHLAB_SELL_EXACT_IN_DISCRIMINATOR,
            args: &[ArgSource::Amount, ArgSource::Limit, ArgSource::Constant(0)],
        },
        semantics: TradeSemantics::ExactInput,
    },
    trade_event: TradeEventLayout {
        discriminator: TRADE_EVENT_DISCRIMINATOR,
        direction: DirectionField {
            offset: 128,
            buy_value: 0,
        },
        amounts: EventAmounts::InOut {
            input: 88,
            output: 96,
        },
        mint: EventPubkey::InstructionAccount(9),
        trader: EventPubkey::InstructionAccount(0),
        timestamp: None,
    },
    create_event: None,
    accounts: AccountScheme::LaunchLab {
        global_config: BONK_FUN_GLOBAL_CONFIG,
        platform_config: BONK_FUN_PLATFORM_CONFIG,
    },
    fee_bps: 125,
};

/// Every (platform, program, version) the codec has been checked against
pub static VERIFIED_SCHEMAS: &[&PlatformSchema] = &[&PUMP_FUN_V1, &BONK_FUN_V1];

/// Latest verified schema of `platform`
pub fn schema_for(platform: Platform) -> LaunchpadResult<&'static PlatformSchema> {
    VERIFIED_SCHEMAS
        .iter()
        .copied()
        .filter(|s| s.platform == platform)
        .max_by_key(|s| s.version)
        .ok_or_else(|| LaunchpadError::UnknownPlatform(platform.to_string()))
}

/// Schema of `platform` as deployed at `program_id`.
///
/// An unverified program id is refused rather than assumed to share a
/// layout.
pub fn verified_schema(
    platform: Platform,
    program_id: &Pubkey,
) -> LaunchpadResult<&'static PlatformSchema> {
    let latest = schema_for(platform)?;
    VERIFIED_SCHEMAS
        .iter()
        .copied()
        .filter(|s| s.platform == platform && s.program_id == *program_id)
        .max_by_key(|s| s.version)
        .ok_or(LaunchpadError::UnsupportedProgramVersion {
            platform,
            program_id: *program_id,
            version: latest.version,
        })
}
