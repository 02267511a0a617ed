use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;

use crate::curve::CurveState;
use crate::error::{LaunchpadError, LaunchpadResult};
use crate::safety::InstructionKind;
use crate::schema::{
    AccountLayout, ArgSource, CurveField, EventAmounts, EventPubkey, FieldKind, PlatformSchema,
    ReserveMapping,
};
use crate::types::Side;

/// Typed arguments of a trade instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TradeInstructionArgs {
    pub side: Side,
    pub amount: u64,
    pub limit: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TradeEventData {
    pub side: Side,
    pub mint: Pubkey,
    pub trader: Pubkey,
    pub base_amount: u64,
    pub token_amount: u64,
    pub timestamp: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateEventData {
    pub mint: Pubkey,
    pub trader: Pubkey,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedEvent {
    Trade(TradeEventData),
    Create(CreateEventData),
}

/// Binary codec for one platform, driven entirely by its schema
#[derive(Clone, Copy, Debug)]
pub struct InstructionCodec {
    schema: &'static PlatformSchema,
}

impl InstructionCodec {
    pub fn new(schema: &'static PlatformSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &'static PlatformSchema {
        self.schema
    }

    fn trade_kind(&self) -> InstructionKind {
        InstructionKind::Trade(self.schema.platform)
    }

    pub fn encode_trade(&self, args: &TradeInstructionArgs) -> Vec<u8> {
        let layout = &self.schema.trade(args.side).layout;
        let mut data = Vec::with_capacity(layout.data_len());
        data.extend_from_slice(&layout.discriminator);
        for arg in layout.args {
            let value = match arg {
                ArgSource::Amount => args.amount,
                ArgSource::Limit => args.limit,
                ArgSource::Constant(value) => *value,
            };
            data.extend_from_slice(&value.to_le_bytes());
        }
        data
    }

    pub fn decode_trade(&self, data: &[u8]) -> LaunchpadResult<TradeInstructionArgs> {
        let shape_error = |reason: String| LaunchpadError::InvalidInstructionShape {
            kind: self.trade_kind(),
            reason,
        };

        let side = self
            .schema
            .trade_side(data)
            .ok_or_else(|| shape_error("unknown trade discriminator".to_string()))?;
        let layout = &self.schema.trade(side).layout;
        if data.len() < layout.data_len() {
            return Err(shape_error(format!(
                "payload of {} bytes, expected {}",
                data.len(),
                layout.data_len()
            )));
        }

        let mut args = TradeInstructionArgs {
            side,
            amount: 0,
            limit: 0,
        };
        for (i, arg) in layout.args.iter().enumerate() {
            let offset = layout.discriminator.len() + i * 8;
            let value = read_u64(data, offset)
                .ok_or_else(|| shape_error(format!("missing argument at {offset}")))?;
            match arg {
                ArgSource::Amount => args.amount = value,
                ArgSource::Limit => args.limit = value,
                ArgSource::Constant(expected) if value != *expected => {
                    return Err(shape_error(format!(
                        "argument at {offset} is {value}, expected {expected}"
                    )));
                }
                ArgSource::Constant(_) => {}
            }
        }
        Ok(args)
    }

    /// Decode the curve account of `mint` into effective reserves
    pub fn decode_curve_state(
        &self,
        curve_account: &Pubkey,
        mint: &Pubkey,
        data: &[u8],
        slot: u64,
        observed_at: DateTime<Utc>,
    ) -> LaunchpadResult<CurveState> {
        let layout = &self.schema.curve_layout;
        let malformed = |reason: String| LaunchpadError::MalformedAccountData {
            account: *curve_account,
            reason,
        };

        if !data.starts_with(&layout.discriminator) {
            return Err(malformed("account discriminator mismatch".to_string()));
        }
        if data.len() < layout.min_len() {
            return Err(malformed(format!(
                "account holds {} bytes, layout needs {}",
                data.len(),
                layout.min_len()
            )));
        }

        let reader = FieldReader { layout, data };
        let int = |field: CurveField| {
            reader
                .int(field)
                .ok_or_else(|| malformed(format!("layout lacks {field:?}")))
        };

        if let Some(stored) = reader.pubkey(CurveField::Mint) {
            if stored != *mint {
                return Err(malformed(format!("curve belongs to mint {stored}")));
            }
        }

        let state = match self.schema.reserves {
            ReserveMapping::Direct => CurveState {
                token: *mint,
                curve_account: *curve_account,
                virtual_base_reserves: int(CurveField::VirtualSolReserves)?,
                virtual_token_reserves: int(CurveField::VirtualTokenReserves)?,
                real_base_reserves: int(CurveField::RealSolReserves)?,
                real_token_reserves: int(CurveField::RealTokenReserves)?,
                total_supply: int(CurveField::TokenTotalSupply)?,
                complete: int(CurveField::Complete)? != 0,
                slot,
                observed_at,
            },
            ReserveMapping::LaunchLab => {
                let virtual_sol = int(CurveField::VirtualSolReserves)?;
                let real_sol = int(CurveField::RealSolReserves)?;
                let virtual_token = int(CurveField::VirtualTokenReserves)?;
                let sold = int(CurveField::RealTokenReserves)?;
                let for_sale = int(CurveField::TotalTokenSell)?;
                CurveState {
                    token: *mint,
                    curve_account: *curve_account,
                    virtual_base_reserves: virtual_sol
                        .checked_add(real_sol)
                        .ok_or_else(|| malformed("base reserves overflow".to_string()))?,
                    virtual_token_reserves: virtual_token
                        .checked_sub(sold)
                        .ok_or_else(|| malformed("sold more than virtual supply".to_string()))?,
                    real_base_reserves: real_sol,
                    real_token_reserves: for_sale
                        .checked_sub(sold)
                        .ok_or_else(|| malformed("sold more than offered".to_string()))?,
                    total_supply: int(CurveField::TokenTotalSupply)?,
                    complete: int(CurveField::Status)? != 0,
                    slot,
                    observed_at,
                }
            }
        };

        state.validate()?;
        Ok(state)
    }

    /// Decode an event payload, discriminator included.
    ///
    /// `trade_accounts` are the accounts of the trade instruction that
    /// emitted the event, needed by layouts that do not log the mint.
    /// Returns `None` for events this schema does not describe.
    pub fn decode_event(
        &self,
        data: &[u8],
        trade_accounts: Option<&[Pubkey]>,
    ) -> LaunchpadResult<Option<DecodedEvent>> {
        let trade = &self.schema.trade_event;
        if let Some(body) = data.strip_prefix(trade.discriminator.as_slice()) {
            return self
                .decode_trade_event(body, trade_accounts)
                .map(|e| Some(DecodedEvent::Trade(e)));
        }
        if let Some(create) = &self.schema.create_event {
            if let Some(body) = data.strip_prefix(create.discriminator.as_slice()) {
                return self
                    .decode_create_event(body)
                    .map(|e| Some(DecodedEvent::Create(e)));
            }
        }
        Ok(None)
    }

    pub fn decode_trade_event(
        &self,
        body: &[u8],
        trade_accounts: Option<&[Pubkey]>,
    ) -> LaunchpadResult<TradeEventData> {
        let layout = &self.schema.trade_event;
        let malformed = |reason: String| LaunchpadError::MalformedAccountData {
            account: self.schema.program_id,
            reason,
        };

        if body.len() < layout.body_len() {
            return Err(malformed(format!(
                "trade event of {} bytes, layout needs {}",
                body.len(),
                layout.body_len()
            )));
        }

        let direction = read_u8(body, layout.direction.offset)
            .ok_or_else(|| malformed("missing direction".to_string()))?;
        let side = if direction == layout.direction.buy_value {
            Side::Buy
        } else {
            Side::Sell
        };

        let amount = |offset: usize| {
            read_u64(body, offset).ok_or_else(|| malformed(format!("missing amount at {offset}")))
        };
        let (base_amount, token_amount) = match layout.amounts {
            EventAmounts::BaseToken { base, token } => (amount(base)?, amount(token)?),
            EventAmounts::InOut { input, output } => match side {
                Side::Buy => (amount(input)?, amount(output)?),
                Side::Sell => (amount(output)?, amount(input)?),
            },
        };

        let key = |source: EventPubkey| match source {
            EventPubkey::Field(offset) => read_pubkey(body, offset)
                .ok_or_else(|| malformed(format!("missing pubkey at {offset}"))),
            EventPubkey::InstructionAccount(index) => trade_accounts
                .and_then(|accounts| accounts.get(index).copied())
                .ok_or_else(|| malformed(format!("trade instruction lacks account {index}"))),
        };

        Ok(TradeEventData {
            side,
            mint: key(layout.mint)?,
            trader: key(layout.trader)?,
            base_amount,
            token_amount,
            timestamp: layout.timestamp.and_then(|offset| read_i64(body, offset)),
        })
    }

    pub fn decode_create_event(&self, body: &[u8]) -> LaunchpadResult<CreateEventData> {
        let malformed = |reason: &str| LaunchpadError::MalformedAccountData {
            account: self.schema.program_id,
            reason: reason.to_string(),
        };
        let layout = self
            .schema
            .create_event
            .as_ref()
            .ok_or_else(|| malformed("platform has no create event"))?;

        let mut cursor = 0usize;
        for _ in 0..layout.leading_strings {
            let len = read_u32(body, cursor).ok_or_else(|| malformed("truncated string"))?;
            cursor = cursor
                .checked_add(4 + len as usize)
                .filter(|end| *end <= body.len())
                .ok_or_else(|| malformed("truncated string"))?;
        }

        Ok(CreateEventData {
            mint: read_pubkey(body, cursor + layout.mint_offset)
                .ok_or_else(|| malformed("truncated create event"))?,
            trader: read_pubkey(body, cursor + layout.trader_offset)
                .ok_or_else(|| malformed("truncated create event"))?,
        })
    }
}

struct FieldReader<'a> {
    layout: &'a AccountLayout,
    data: &'a [u8],
}

impl FieldReader<'_> {
    fn int(&self, field: CurveField) -> Option<u64> {
        let spec = self.layout.field(field)?;
        match spec.kind {
            FieldKind::U8 | FieldKind::Bool => read_u8(self.data, spec.offset).map(u64::from),
            FieldKind::U64 => read_u64(self.data, spec.offset),
            FieldKind::I64 => read_i64(self.data, spec.offset).and_then(|v| u64::try_from(v).ok()),
            FieldKind::Pubkey => None,
        }
    }

    fn pubkey(&self, field: CurveField) -> Option<Pubkey> {
        let spec = self.layout.field(field)?;
        match spec.kind {
            FieldKind::Pubkey => read_pubkey(self.data, spec.offset),
            _ => None,
        }
    }
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> Option<[u8; N]> {
    data.get(offset..offset.checked_add(N)?)?.try_into().ok()
}

pub(crate) fn read_u8(data: &[u8], offset: usize) -> Option<u8> {
    data.get(offset).copied()
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    read_array(data, offset).map(u32::from_le_bytes)
}

pub(crate) fn read_u64(data: &[u8], offset: usize) -> Option<u64> {
    read_array(data, offset).map(u64::from_le_bytes)
}

pub(crate) fn read_i64(data: &[u8], offset: usize) -> Option<i64> {
    read_array(data, offset).map(i64::from_le_bytes)
}

pub(crate) fn read_pubkey(data: &[u8], offset: usize) -> Option<Pubkey> {
    read_array::<32>(data, offset).map(Pubkey::new_from_array)
}
