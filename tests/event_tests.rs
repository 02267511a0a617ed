mod common;

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::DateTime;
use launchpad_adapters::{
    AdapterRegistry, BONK_FUN_V1, EventKind, PUMP_FUN_V1, ParsedInstruction, ParsedTransaction,
    Platform,
};
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;

use common::{CountingSimulator, FakeChain, registry};

// anchor's emit_cpi! instruction tag
const EVENT_IX_TAG: [u8; 8] = [228, 69, 165, 46, 81, 203, 154, 29];

fn setup() -> AdapterRegistry {
    registry(
        Arc::new(FakeChain::default()),
        Arc::new(CountingSimulator::new(true)),
    )
}

fn pump_trade_event(mint: &Pubkey, user: &Pubkey, sol: u64, tokens: u64, is_buy: bool) -> Vec<u8> {
    let mut data = PUMP_FUN_V1.trade_event.discriminator.to_vec();
    data.extend_from_slice(mint.as_ref());
    data.extend_from_slice(&sol.to_le_bytes());
    data.extend_from_slice(&tokens.to_le_bytes());
    data.push(u8::from(is_buy));
    data.extend_from_slice(user.as_ref());
    data.extend_from_slice(&1_718_000_000i64.to_le_bytes());
    // reserves after the trade
    data.extend_from_slice(&[0u8; 32]);
    data
}

fn bonk_trade_event(amount_in: u64, amount_out: u64, is_buy: bool) -> Vec<u8> {
    let mut body = vec![0u8; 129];
    body[88..96].copy_from_slice(&amount_in.to_le_bytes());
    body[96..104].copy_from_slice(&amount_out.to_le_bytes());
    body[128] = if is_buy { 0 } else { 1 };
    let mut data = BONK_FUN_V1.trade_event.discriminator.to_vec();
    data.extend_from_slice(&body);
    data
}

fn bonk_trade_ix(trader: &Pubkey, mint: &Pubkey, side_discriminator: [u8; 8]) -> ParsedInstruction {
    let mut accounts: Vec<Pubkey> = (0..15).map(|_| Pubkey::new_unique()).collect();
    accounts[0] = *trader;
    accounts[9] = *mint;
    let mut data = side_discriminator.to_vec();
    data.extend_from_slice(&[0u8; 24]);
    ParsedInstruction {
        program_id: BONK_FUN_V1.program_id,
        accounts,
        data,
    }
}

fn event_ix(program_id: Pubkey, event: Vec<u8>) -> ParsedInstruction {
    let mut data = EVENT_IX_TAG.to_vec();
    data.extend_from_slice(&event);
    ParsedInstruction {
        program_id,
        accounts: vec![Pubkey::new_unique()],
        data,
    }
}

#[test]
fn test_pump_trade_from_logs() {
    let registry = setup();
    let mint = Pubkey::new_unique();
    let user = Pubkey::new_unique();
    let program = PUMP_FUN_V1.program_id;
    let event = pump_trade_event(&mint, &user, 2_000_000_000, 50_000_000_000, true);
    let payload = STANDARD.encode(event);

    let tx = ParsedTransaction {
        slot: 300,
        log_messages: vec![
            "Program ComputeBudget111111111111111111111111111111 invoke [1]".to_string(),
            "Program ComputeBudget111111111111111111111111111111 success".to_string(),
            format!("Program {program} invoke [1]"),
            "Program log: Instruction: Buy".to_string(),
            format!("Program data: {payload}"),
            format!("Program {program} consumed 30000 of 200000 compute units"),
            format!("Program {program} success"),
        ],
        ..ParsedTransaction::default()
    };

    let events = registry.parse_events(Platform::PumpFun, &tx).unwrap();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.kind, EventKind::Buy);
    assert_eq!(event.platform, Platform::PumpFun);
    assert_eq!(event.token, mint);
    assert_eq!(event.trader, user);
    assert_eq!(event.input_amount, 2_000_000_000);
    assert_eq!(event.output_amount, 50_000_000_000);
    assert_eq!(event.execution_price, Some(Decimal::new(4, 2)));
    assert_eq!(event.timestamp, DateTime::from_timestamp(1_718_000_000, 0));

    // the same payload under another platform is not an event of it
    assert!(registry.parse_events(Platform::BonkFun, &tx).unwrap().is_empty());
}

#[test]
fn test_pump_events_from_cpi() {
    let registry = setup();
    let program = PUMP_FUN_V1.program_id;
    let mint = Pubkey::new_unique();
    let creator = Pubkey::new_unique();

    let create = PUMP_FUN_V1.create_event.unwrap();
    let mut created = create.discriminator.to_vec();
    for value in ["Frog", "FROG", "https://example.org/frog.json"] {
        created.extend_from_slice(&(value.len() as u32).to_le_bytes());
        created.extend_from_slice(value.as_bytes());
    }
    created.extend_from_slice(mint.as_ref());
    created.extend_from_slice(Pubkey::new_unique().as_ref());
    created.extend_from_slice(creator.as_ref());

    let tx = ParsedTransaction {
        block_time: Some(1_718_000_500),
        instructions: vec![
            event_ix(program, created),
            event_ix(program, pump_trade_event(&mint, &creator, 1_000, 30_000, true)),
            event_ix(program, pump_trade_event(&mint, &creator, 900, 30_000, false)),
        ],
        // ignored while event instructions are present
        log_messages: vec![
            format!("Program {program} invoke [1]"),
            format!(
                "Program data: {}",
                STANDARD.encode(pump_trade_event(&mint, &creator, 5, 5, true))
            ),
            format!("Program {program} success"),
        ],
        ..ParsedTransaction::default()
    };

    let events = registry.parse_events(Platform::PumpFun, &tx).unwrap();
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::Create, EventKind::Buy, EventKind::Sell]);

    assert_eq!(events[0].token, mint);
    assert_eq!(events[0].trader, creator);
    assert_eq!(events[0].execution_price, None);
    assert_eq!(events[0].timestamp, DateTime::from_timestamp(1_718_000_500, 0));

    // a sell pays out base
    assert_eq!(events[2].input_amount, 30_000);
    assert_eq!(events[2].output_amount, 900);
}

#[test]
fn test_bonk_trades_take_accounts_from_instruction() {
    let registry = setup();
    let program = BONK_FUN_V1.program_id;
    let buyer = Pubkey::new_unique();
    let seller = Pubkey::new_unique();
    let mint = Pubkey::new_unique();

    let tx = ParsedTransaction {
        block_time: Some(1_718_001_000),
        instructions: vec![
            bonk_trade_ix(&buyer, &mint, BONK_FUN_V1.buy.layout.discriminator),
            event_ix(program, bonk_trade_event(1_000_000_000, 35_000_000_000_000, true)),
            bonk_trade_ix(&seller, &mint, BONK_FUN_V1.sell.layout.discriminator),
            event_ix(program, bonk_trade_event(10_000_000_000_000, 280_000_000, false)),
        ],
        ..ParsedTransaction::default()
    };

    let events = registry.parse_events(Platform::BonkFun, &tx).unwrap();
    assert_eq!(events.len(), 2);

    assert_eq!(events[0].kind, EventKind::Buy);
    assert_eq!(events[0].trader, buyer);
    assert_eq!(events[0].token, mint);
    assert_eq!(events[0].input_amount, 1_000_000_000);
    assert_eq!(events[0].output_amount, 35_000_000_000_000);

    assert_eq!(events[1].kind, EventKind::Sell);
    assert_eq!(events[1].trader, seller);
    assert_eq!(events[1].input_amount, 10_000_000_000_000);
    assert_eq!(events[1].output_amount, 280_000_000);
    assert_eq!(events[1].timestamp, DateTime::from_timestamp(1_718_001_000, 0));
}

#[test]
fn test_transaction_without_events() {
    let registry = setup();
    let tx = ParsedTransaction {
        log_messages: vec![
            "Program 11111111111111111111111111111111 invoke [1]".to_string(),
            "Program 11111111111111111111111111111111 success".to_string(),
        ],
        ..ParsedTransaction::default()
    };
    for platform in registry.list_platforms() {
        assert!(registry.parse_events(platform, &tx).unwrap().is_empty());
    }

    // truncated event body is skipped
    let mut short = pump_trade_event(&Pubkey::new_unique(), &Pubkey::new_unique(), 1, 1, true);
    short.truncate(40);
    let tx = ParsedTransaction {
        instructions: vec![event_ix(PUMP_FUN_V1.program_id, short)],
        ..ParsedTransaction::default()
    };
    assert!(registry.parse_events(Platform::PumpFun, &tx).unwrap().is_empty());
}
