use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig, compute_budget, pubkey::Pubkey, system_program,
};
use tokio_util::sync::CancellationToken;

use crate::adapter::{AdapterSettings, LaunchpadAdapter, SimulatedTrade};
use crate::config::AdapterConfig;
use crate::curve::CurveState;
use crate::error::{LaunchpadError, LaunchpadResult};
use crate::events::{AdapterEvent, ParsedTransaction};
use crate::privacy::PrivacyConfig;
use crate::rpc::{
    AccountReader, RpcAccountReader, RpcTransactionSimulator, SimulationResult,
    TransactionSimulator,
};
use crate::safety::{ProgramAllowlist, SafetyGate};
use crate::schema::{schema_for, verified_schema};
use crate::transaction::UnsignedTransaction;
use crate::types::{Platform, Quote, Side, TokenInfo, TradeArgs};

/// Programs every trade may touch besides the launchpads themselves
fn support_programs() -> [Pubkey; 4] {
    [
        compute_budget::id(),
        system_program::id(),
        spl_token::ID,
        spl_associated_token_account::ID,
    ]
}

/// Platform lookup over one adapter per launchpad, built once at startup.
///
/// The mapping never changes after construction. The allowlist shared by
/// every adapter's gate stays editable through [`AdapterRegistry::allowlist`].
pub struct AdapterRegistry {
    adapters: BTreeMap<Platform, LaunchpadAdapter>,
    allowlist: Arc<ProgramAllowlist>,
}

impl AdapterRegistry {
    pub fn new(
        config: &AdapterConfig,
        reader: Arc<dyn AccountReader>,
        simulator: Arc<dyn TransactionSimulator>,
    ) -> LaunchpadResult<Self> {
        config.validate()?;

        let mut schemas = Vec::with_capacity(Platform::ALL.len());
        for platform in Platform::ALL {
            let schema = match config.program_overrides.get(&platform) {
                Some(program_id) => verified_schema(platform, program_id)?,
                None => schema_for(platform)?,
            };
            schemas.push(schema);
        }

        let allowlist = Arc::new(ProgramAllowlist::with_programs(
            schemas
                .iter()
                .map(|s| s.program_id)
                .chain(support_programs()),
        ));
        let gate = SafetyGate::new(allowlist.clone());
        let settings = AdapterSettings::from(config);

        let adapters = schemas
            .into_iter()
            .map(|schema| {
                log::info!(
                    "registered {} v{} at {}",
                    schema.platform,
                    schema.version,
                    schema.program_id
                );
                let adapter = LaunchpadAdapter::new(
                    schema,
                    reader.clone(),
                    simulator.clone(),
                    gate.clone(),
                    settings,
                );
                (schema.platform, adapter)
            })
            .collect();

        Ok(Self {
            adapters,
            allowlist,
        })
    }

    /// Registry backed by an RPC node at `config.rpc_url`
    pub fn connect(config: &AdapterConfig) -> Result<Self> {
        let commitment = CommitmentConfig {
            commitment: config.commitment,
        };
        let client = Arc::new(RpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            config.io_timeout,
            commitment,
        ));
        let reader = Arc::new(RpcAccountReader::new(client.clone(), commitment));
        let simulator = Arc::new(RpcTransactionSimulator::new(client, commitment));
        Ok(Self::new(config, reader, simulator)?)
    }

    pub fn list_platforms(&self) -> Vec<Platform> {
        self.adapters.keys().copied().collect()
    }

    pub fn adapter(&self, platform: Platform) -> LaunchpadResult<&LaunchpadAdapter> {
        self.adapters
            .get(&platform)
            .ok_or_else(|| LaunchpadError::UnknownPlatform(platform.to_string()))
    }

    /// Adapter by platform name, e.g. `"pumpfun"` or `"bonk.fun"`
    pub fn adapter_by_name(&self, name: &str) -> LaunchpadResult<&LaunchpadAdapter> {
        self.adapter(name.parse()?)
    }

    pub fn allowlist(&self) -> &Arc<ProgramAllowlist> {
        &self.allowlist
    }

    pub async fn get_curve_state(
        &self,
        platform: Platform,
        token: &Pubkey,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<CurveState> {
        let state = self
            .adapter(platform)?
            .fetch_curve_state(token, cancel)
            .await?;
        Ok(CurveState::clone(&state))
    }

    pub async fn quote(
        &self,
        platform: Platform,
        side: Side,
        args: &TradeArgs,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<Quote> {
        self.adapter(platform)?.quote(side, args, cancel).await
    }

    pub async fn build_transaction(
        &self,
        platform: Platform,
        side: Side,
        args: &TradeArgs,
        privacy: Option<&PrivacyConfig>,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<UnsignedTransaction> {
        self.adapter(platform)?
            .build_transaction(side, args, privacy, cancel)
            .await
    }

    pub async fn build_and_simulate(
        &self,
        platform: Platform,
        side: Side,
        args: &TradeArgs,
        privacy: Option<&PrivacyConfig>,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<SimulatedTrade> {
        self.adapter(platform)?
            .build_and_simulate(side, args, privacy, cancel)
            .await
    }

    pub fn parse_events(
        &self,
        platform: Platform,
        tx: &ParsedTransaction,
    ) -> LaunchpadResult<Vec<AdapterEvent>> {
        Ok(self.adapter(platform)?.parse_events(tx))
    }

    pub async fn simulate(
        &self,
        platform: Platform,
        tx: &UnsignedTransaction,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<SimulationResult> {
        self.adapter(platform)?.simulate(tx, cancel).await
    }

    pub async fn get_token_info(
        &self,
        platform: Platform,
        token: &Pubkey,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<TokenInfo> {
        self.adapter(platform)?
            .fetch_token_info(token, cancel)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BONK_FUN_PROGRAM_ID, PUMP_FUN_PROGRAM_ID};
    use crate::rpc::{AccountData, ReadError};
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    struct NoChain;

    #[async_trait]
    impl AccountReader for NoChain {
        async fn read(&self, address: &Pubkey) -> Result<AccountData, ReadError> {
            Err(ReadError::NotFound(*address))
        }
    }

    #[async_trait]
    impl TransactionSimulator for NoChain {
        async fn simulate(&self, _tx: &UnsignedTransaction) -> Result<SimulationResult> {
            anyhow::bail!("no chain")
        }
    }

    fn registry(config: &AdapterConfig) -> LaunchpadResult<AdapterRegistry> {
        AdapterRegistry::new(config, Arc::new(NoChain), Arc::new(NoChain))
    }

    #[test]
    fn test_known_platforms_registered() {
        let registry = registry(&AdapterConfig::default()).unwrap();
        assert_eq!(
            registry.list_platforms(),
            vec![Platform::PumpFun, Platform::BonkFun]
        );
        assert_eq!(
            registry.adapter(Platform::BonkFun).unwrap().program_id(),
            BONK_FUN_PROGRAM_ID
        );
        assert_eq!(
            registry.adapter_by_name("Pump.Fun").unwrap().program_id(),
            PUMP_FUN_PROGRAM_ID
        );
        assert_matches!(
            registry.adapter_by_name("moonshot").err(),
            Some(LaunchpadError::UnknownPlatform(_))
        );
    }

    #[test]
    fn test_allowlist_seeded() {
        let registry = registry(&AdapterConfig::default()).unwrap();
        let allowlist = registry.allowlist();
        assert!(allowlist.contains(&PUMP_FUN_PROGRAM_ID));
        assert!(allowlist.contains(&BONK_FUN_PROGRAM_ID));
        for program in support_programs() {
            assert!(allowlist.contains(&program));
        }
        assert_eq!(allowlist.programs().len(), 6);
    }

    #[test]
    fn test_unverified_override_refused() {
        let config =
            AdapterConfig::default().with_program_override(Platform::PumpFun, Pubkey::new_unique());
        assert_matches!(
            registry(&config).err(),
            Some(LaunchpadError::UnsupportedProgramVersion {
                platform: Platform::PumpFun,
                ..
            })
        );

        let config =
            AdapterConfig::default().with_program_override(Platform::PumpFun, PUMP_FUN_PROGRAM_ID);
        assert!(registry(&config).is_ok());
    }

    #[tokio::test]
    async fn test_missing_curve() {
        let registry = registry(&AdapterConfig::default()).unwrap();
        let err = registry
            .get_curve_state(
                Platform::PumpFun,
                &Pubkey::new_unique(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_matches!(err, LaunchpadError::AccountNotFound(_));
    }
}
