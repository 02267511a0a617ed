use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use solana_sdk::{pubkey::Pubkey, signature::Signature};

use crate::codec::{DecodedEvent, InstructionCodec};
use crate::constants::EVENT_IX_TAG;
use crate::types::{Platform, Side};

/// Confirmed transaction as handed over by the caller's RPC layer.
///
/// `instructions` lists outer and inner instructions in execution order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedTransaction {
    pub signature: Signature,
    pub slot: u64,
    pub block_time: Option<i64>,
    pub log_messages: Vec<String>,
    pub instructions: Vec<ParsedInstruction>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedInstruction {
    pub program_id: Pubkey,
    pub accounts: Vec<Pubkey>,
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Buy,
    Sell,
    Create,
}

impl From<Side> for EventKind {
    fn from(side: Side) -> Self {
        match side {
            Side::Buy => EventKind::Buy,
            Side::Sell => EventKind::Sell,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AdapterEvent {
    pub kind: EventKind,
    pub platform: Platform,
    pub token: Pubkey,
    pub trader: Pubkey,
    pub input_amount: u64,
    pub output_amount: u64,
    /// Base units per token unit, absent for creates
    pub execution_price: Option<Decimal>,
    pub timestamp: Option<DateTime<Utc>>,
    pub signature: Signature,
}

/// Event payloads emitted by `program`, discriminator included.
///
/// Self-CPI event instructions are preferred. Without any, `Program data:`
/// lines are attributed to the program on top of the invoke stack.
fn event_payloads(tx: &ParsedTransaction, program: &Pubkey) -> Vec<Vec<u8>> {
    let from_cpi: Vec<Vec<u8>> = tx
        .instructions
        .iter()
        .filter(|ix| ix.program_id == *program)
        .filter_map(|ix| ix.data.strip_prefix(EVENT_IX_TAG.as_slice()))
        .map(<[u8]>::to_vec)
        .collect();
    if !from_cpi.is_empty() {
        return from_cpi;
    }

    let program = program.to_string();
    let mut stack: Vec<&str> = Vec::new();
    let mut payloads = Vec::new();
    for line in &tx.log_messages {
        let Some(rest) = line.strip_prefix("Program ") else {
            continue;
        };
        if let Some(encoded) = rest.strip_prefix("data: ") {
            if stack.last() == Some(&program.as_str()) {
                match STANDARD.decode(encoded.trim()) {
                    Ok(bytes) => payloads.push(bytes),
                    Err(e) => log::debug!("skipping undecodable program data: {e}"),
                }
            }
            continue;
        }
        let mut words = rest.split_whitespace();
        match (words.next(), words.next()) {
            (Some(id), Some("invoke")) => stack.push(id),
            (Some(_), Some("success")) | (Some(_), Some("failed:")) => {
                stack.pop();
            }
            _ => {}
        }
    }
    payloads
}

/// Decode every event of the codec's platform in `tx`.
///
/// Payloads that belong to other programs or fail to decode are skipped, so
/// a transaction without matching events yields an empty list.
pub fn parse_events(codec: &InstructionCodec, tx: &ParsedTransaction) -> Vec<AdapterEvent> {
    let schema = codec.schema();
    let trades: Vec<&ParsedInstruction> = tx
        .instructions
        .iter()
        .filter(|ix| {
            ix.program_id == schema.program_id && schema.trade_side(&ix.data).is_some()
        })
        .collect();
    let block_time = tx.block_time.and_then(|t| DateTime::from_timestamp(t, 0));

    let mut events = Vec::new();
    let mut trade_index = 0usize;
    for payload in event_payloads(tx, &schema.program_id) {
        let accounts = trades.get(trade_index).map(|ix| ix.accounts.as_slice());
        match codec.decode_event(&payload, accounts) {
            Ok(Some(DecodedEvent::Trade(trade))) => {
                trade_index += 1;
                let (input_amount, output_amount) = match trade.side {
                    Side::Buy => (trade.base_amount, trade.token_amount),
                    Side::Sell => (trade.token_amount, trade.base_amount),
                };
                let execution_price =
                    Decimal::from(trade.base_amount).checked_div(Decimal::from(trade.token_amount));
                events.push(AdapterEvent {
                    kind: trade.side.into(),
                    platform: schema.platform,
                    token: trade.mint,
                    trader: trade.trader,
                    input_amount,
                    output_amount,
                    execution_price,
                    timestamp: trade
                        .timestamp
                        .and_then(|t| DateTime::from_timestamp(t, 0))
                        .or(block_time),
                    signature: tx.signature,
                });
            }
            Ok(Some(DecodedEvent::Create(create))) => events.push(AdapterEvent {
                kind: EventKind::Create,
                platform: schema.platform,
                token: create.mint,
                trader: create.trader,
                input_amount: 0,
                output_amount: 0,
                execution_price: None,
                timestamp: block_time,
                signature: tx.signature,
            }),
            Ok(None) => {}
            Err(e) => {
                // a trade event still consumes its instruction
                trade_index += usize::from(payload.starts_with(&schema.trade_event.discriminator));
                log::debug!(
                    "skipping {} event in {}: {e}",
                    schema.platform,
                    tx.signature
                );
            }
        }
    }
    events
}
