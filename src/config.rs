use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use solana_sdk::commitment_config::CommitmentLevel;
use solana_sdk::pubkey::Pubkey;

use crate::constants::{
    DEFAULT_COMPUTE_UNIT_LIMIT, DEFAULT_CURVE_CACHE_CAPACITY, DEFAULT_IO_TIMEOUT_MS,
    MAX_COMPUTE_UNIT_LIMIT,
};
use crate::error::{LaunchpadError, LaunchpadResult};
use crate::types::Platform;

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

#[derive(Clone, Debug, PartialEq)]
pub struct AdapterConfig {
    pub rpc_url: String,
    pub commitment: CommitmentLevel,
    /// Ceiling on every account read and simulation
    pub io_timeout: Duration,
    pub compute_unit_limit: u32,
    /// Micro-lamports per compute unit, 0 omits the price instruction
    pub compute_unit_price: u64,
    pub curve_cache_capacity: u64,
    /// Program id per platform when not the default deployment
    pub program_overrides: HashMap<Platform, Pubkey>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: CommitmentLevel::Confirmed,
            io_timeout: Duration::from_millis(DEFAULT_IO_TIMEOUT_MS),
            compute_unit_limit: DEFAULT_COMPUTE_UNIT_LIMIT,
            compute_unit_price: 0,
            curve_cache_capacity: DEFAULT_CURVE_CACHE_CAPACITY,
            program_overrides: HashMap::new(),
        }
    }
}

impl AdapterConfig {
    /// Defaults overridden by `SOLANA_RPC_URL`, `PUMP_FUN_PROGRAM_ID`,
    /// `BONK_FUN_PROGRAM_ID`, `LAUNCHPAD_IO_TIMEOUT_MS`,
    /// `LAUNCHPAD_COMPUTE_UNIT_LIMIT` and `LAUNCHPAD_COMPUTE_UNIT_PRICE`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("SOLANA_RPC_URL") {
            config.rpc_url = url;
        }
        for (platform, key) in [
            (Platform::PumpFun, "PUMP_FUN_PROGRAM_ID"),
            (Platform::BonkFun, "BONK_FUN_PROGRAM_ID"),
        ] {
            if let Some(value) = lookup(key) {
                let program_id = Pubkey::from_str(value.trim())
                    .with_context(|| format!("Invalid {key}: {value}"))?;
                config.program_overrides.insert(platform, program_id);
            }
        }
        if let Some(value) = lookup("LAUNCHPAD_IO_TIMEOUT_MS") {
            let ms: u64 = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid LAUNCHPAD_IO_TIMEOUT_MS: {value}"))?;
            config.io_timeout = Duration::from_millis(ms);
        }
        if let Some(value) = lookup("LAUNCHPAD_COMPUTE_UNIT_LIMIT") {
            config.compute_unit_limit = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid LAUNCHPAD_COMPUTE_UNIT_LIMIT: {value}"))?;
        }
        if let Some(value) = lookup("LAUNCHPAD_COMPUTE_UNIT_PRICE") {
            config.compute_unit_price = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid LAUNCHPAD_COMPUTE_UNIT_PRICE: {value}"))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LaunchpadResult<()> {
        if self.io_timeout.is_zero() {
            return Err(LaunchpadError::InvalidConfig(
                "io timeout must be non-zero".to_string(),
            ));
        }
        if self.compute_unit_limit == 0 || self.compute_unit_limit > MAX_COMPUTE_UNIT_LIMIT {
            return Err(LaunchpadError::InvalidConfig(format!(
                "compute unit limit {} outside 1..={MAX_COMPUTE_UNIT_LIMIT}",
                self.compute_unit_limit
            )));
        }
        if self.curve_cache_capacity == 0 {
            return Err(LaunchpadError::InvalidConfig(
                "curve cache capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_program_override(mut self, platform: Platform, program_id: Pubkey) -> Self {
        self.program_overrides.insert(platform, program_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PUMP_FUN_PROGRAM_ID;

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SOLANA_RPC_URL", "http://localhost:8899"),
            ("PUMP_FUN_PROGRAM_ID", "6EF8rrecthR5Dkzon8Nwu78hRvfCKubJ14M5uBEwF6P"),
            ("LAUNCHPAD_IO_TIMEOUT_MS", "2500"),
            ("LAUNCHPAD_COMPUTE_UNIT_PRICE", "10000"),
        ]);
        let config = AdapterConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.rpc_url, "http://localhost:8899");
        assert_eq!(config.io_timeout, Duration::from_millis(2_500));
        assert_eq!(config.compute_unit_price, 10_000);
        assert_eq!(config.compute_unit_limit, DEFAULT_COMPUTE_UNIT_LIMIT);
        assert_eq!(
            config.program_overrides.get(&Platform::PumpFun),
            Some(&PUMP_FUN_PROGRAM_ID)
        );
    }

    #[test]
    fn test_bad_values_are_reported() {
        let err = AdapterConfig::from_lookup(|k| {
            (k == "LAUNCHPAD_COMPUTE_UNIT_LIMIT").then(|| "lots".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("LAUNCHPAD_COMPUTE_UNIT_LIMIT"));

        let err = AdapterConfig::from_lookup(|k| {
            (k == "LAUNCHPAD_COMPUTE_UNIT_LIMIT").then(|| "2000000".to_string())
        });
        assert!(err.is_err());
    }
}
