use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

pub const PUMP_FUN_PROGRAM_ID: Pubkey = pubkey!("6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P");
pub const PUMP_FUN_FEE_RECIPIENT: Pubkey = pubkey!("CebN5WGQ4jvEPvsVU4EoHEpgzq1VV7AbicfhtW4xC9iM");

// Raydium LaunchLab, the program behind bonk.fun
pub const BONK_FUN_PROGRAM_ID: Pubkey = pubkey!("LanMV9sAd7wArD4vJFi2qDdfnVhFxYSUg6eADduJ3uj");
pub const BONK_FUN_GLOBAL_CONFIG: Pubkey = pubkey!("6s1xP3hpbAfFoNtUNF8mfHsjr2Bd97JxFJRWLbL6aHuX");
pub const BONK_FUN_PLATFORM_CONFIG: Pubkey =
    pubkey!("FfYek5vEz23cMkWsdJwG2oa6EphsvXSHrGpdALN4g6W1");

pub const METADATA_PROGRAM_ID: Pubkey = pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");
pub const WSOL_MINT: Pubkey = spl_token::native_mint::ID;

// SEEDS
pub const BONDING_CURVE_SEED: &[u8] = b"bonding-curve";
pub const GLOBAL_SEED: &[u8] = b"global";
pub const EVENT_AUTHORITY_SEED: &[u8] = b"__event_authority";
pub const POOL_SEED: &[u8] = b"pool";
pub const POOL_VAULT_SEED: &[u8] = b"pool_vault";
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_auth_seed";
pub const METADATA_SEED: &[u8] = b"metadata";

// DISCRIMINATORS (anchor: first 8 bytes of sha256("<namespace>:<name>"))
pub const PUMP_FUN_BONDING_CURVE_DISCRIMINATOR: [u8; 8] = [23, 183, 248, 55, 96, 216, 172, 96];
pub const PUMP_FUN_BUY_DISCRIMINATOR: [u8; 8] = [102, 6, 61, 18, 1, 218, 235, 234];
pub const PUMP_FUN_SELL_DISCRIMINATOR: [u8; 8] = [51, 230, 133, 164, 1, 127, 131, 173];
pub const PUMP_FUN_CREATE_EVENT_DISCRIMINATOR: [u8; 8] = [27, 114, 169, 77, 222, 235, 99, 118];

pub const LAUNCHLAB_POOL_STATE_DISCRIMINATOR: [u8; 8] = [247, 237, 227, 245, 215, 195, 222, 70];
pub const LAUNCHLAB_BUY_EXACT_IN_DISCRIMINATOR: [u8; 8] = [250, 234, 13, 123, 213, 156, 19, 236];
pub const LAUNCHLAB_SELL_EXACT_IN_DISCRIMINATOR: [u8; 8] = [149, 39, 222, 155, 211, 124, 152, 26];

// both programs name their trade event `TradeEvent`
pub const TRADE_EVENT_DISCRIMINATOR: [u8; 8] = [189, 219, 127, 211, 78, 230, 97, 238];

/// Prefix of an anchor `emit_cpi!` self-invocation carrying an event
pub const EVENT_IX_TAG: [u8; 8] = [228, 69, 165, 46, 81, 203, 154, 29];

pub const BPS_DENOMINATOR: u64 = 10_000;
pub const MAX_COMPUTE_UNIT_LIMIT: u32 = 1_400_000;
pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 200_000;
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CURVE_CACHE_CAPACITY: u64 = 1_024;
