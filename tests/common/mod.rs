#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use launchpad_adapters::{
    AccountData, AccountReader, AdapterConfig, AdapterRegistry, BONK_FUN_V1, CurveState,
    PUMP_FUN_V1, ReadError, SimulationResult, TransactionSimulator, UnsignedTransaction,
    curve_address,
};
use solana_sdk::pubkey::Pubkey;

/// In-memory accounts standing in for an RPC node
#[derive(Default)]
pub struct FakeChain {
    accounts: Mutex<HashMap<Pubkey, AccountData>>,
    delay: Option<Duration>,
    reads: AtomicUsize,
}

impl FakeChain {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn insert(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>, slot: u64) {
        self.accounts.lock().unwrap().insert(
            address,
            AccountData {
                data,
                owner,
                lamports: 1_000_000,
                slot,
            },
        );
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountReader for FakeChain {
    async fn read(&self, address: &Pubkey) -> Result<AccountData, ReadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.accounts
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .ok_or(ReadError::NotFound(*address))
    }
}

pub struct CountingSimulator {
    calls: AtomicUsize,
    success: bool,
    delay: Option<Duration>,
}

impl CountingSimulator {
    pub fn new(success: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            success,
            delay: None,
        }
    }

    pub fn with_delay(success: bool, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(success)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionSimulator for CountingSimulator {
    async fn simulate(&self, tx: &UnsignedTransaction) -> anyhow::Result<SimulationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(SimulationResult {
            success: self.success,
            logs: vec![format!("{} instructions", tx.len())],
            compute_units: Some(48_000),
            error: (!self.success).then(|| "custom program error: 0x1772".to_string()),
            ..SimulationResult::default()
        })
    }
}

pub fn registry(
    chain: Arc<FakeChain>,
    simulator: Arc<CountingSimulator>,
) -> AdapterRegistry {
    AdapterRegistry::new(&AdapterConfig::default(), chain, simulator).unwrap()
}

pub fn pump_curve_data(
    virtual_token: u64,
    virtual_sol: u64,
    real_token: u64,
    real_sol: u64,
    complete: bool,
) -> Vec<u8> {
    let mut data = PUMP_FUN_V1.curve_layout.discriminator.to_vec();
    for value in [virtual_token, virtual_sol, real_token, real_sol, 1_000_000_000_000_000] {
        data.extend_from_slice(&value.to_le_bytes());
    }
    data.push(u8::from(complete));
    // creator
    data.extend_from_slice(&[0u8; 32]);
    data
}

/// Pump curve as found right after launch, 30 SOL and 1.073B tokens virtual
pub fn fresh_pump_curve() -> Vec<u8> {
    pump_curve_data(
        1_073_000_000_000_000,
        30_000_000_000,
        793_100_000_000_000,
        0,
        false,
    )
}

#[allow(clippy::too_many_arguments)]
pub fn bonk_pool_data(
    mint: &Pubkey,
    status: u8,
    total_sell: u64,
    virtual_token: u64,
    virtual_sol: u64,
    sold: u64,
    real_sol: u64,
) -> Vec<u8> {
    let mut data = vec![0u8; 237];
    data[..8].copy_from_slice(&BONK_FUN_V1.curve_layout.discriminator);
    data[17] = status;
    data[21..29].copy_from_slice(&1_000_000_000_000_000u64.to_le_bytes());
    data[29..37].copy_from_slice(&total_sell.to_le_bytes());
    data[37..45].copy_from_slice(&virtual_token.to_le_bytes());
    data[45..53].copy_from_slice(&virtual_sol.to_le_bytes());
    data[53..61].copy_from_slice(&sold.to_le_bytes());
    data[61..69].copy_from_slice(&real_sol.to_le_bytes());
    data[205..237].copy_from_slice(mint.as_ref());
    data
}

pub fn fresh_bonk_pool(mint: &Pubkey) -> Vec<u8> {
    bonk_pool_data(
        mint,
        0,
        793_100_000_000_000,
        1_073_025_605_596_382,
        30_000_852_951,
        0,
        0,
    )
}

/// Adds a pump curve for a new mint and returns the mint
pub fn seed_pump_token(chain: &FakeChain, data: Vec<u8>, slot: u64) -> Pubkey {
    let mint = Pubkey::new_unique();
    let curve = curve_address(&PUMP_FUN_V1, &mint).unwrap();
    chain.insert(curve, PUMP_FUN_V1.program_id, data, slot);
    mint
}

pub fn seed_bonk_token(chain: &FakeChain, slot: u64) -> Pubkey {
    let mint = Pubkey::new_unique();
    let pool = curve_address(&BONK_FUN_V1, &mint).unwrap();
    chain.insert(pool, BONK_FUN_V1.program_id, fresh_bonk_pool(&mint), slot);
    mint
}

/// 30 SOL / 1B token curve with no real base yet
pub fn scenario_state() -> CurveState {
    CurveState {
        token: Pubkey::new_unique(),
        curve_account: Pubkey::new_unique(),
        virtual_base_reserves: 30_000_000_000,
        virtual_token_reserves: 1_000_000_000,
        real_base_reserves: 0,
        real_token_reserves: 800_000_000,
        total_supply: 1_000_000_000,
        complete: false,
        slot: 1,
        observed_at: Utc::now(),
    }
}
