//! Collaborator seams: reading accounts and simulating transactions.
//!
//! The core only talks to the chain through [`AccountReader`] and
//! [`TransactionSimulator`]. The RPC-backed implementations below are the
//! defaults; tests and embedders may supply their own.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_account_decoder::UiAccountEncoding;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::{
    RpcSimulateTransactionAccountsConfig, RpcSimulateTransactionConfig,
};
use solana_sdk::{commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey};
use thiserror::Error;

use crate::transaction::UnsignedTransaction;

/// Raw account as seen at `slot`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountData {
    pub data: Vec<u8>,
    pub owner: Pubkey,
    pub lamports: u64,
    pub slot: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("account {0} not found")]
    NotFound(Pubkey),
    #[error("stale read of {account}: {reason}")]
    Stale { account: Pubkey, reason: String },
    #[error("rpc: {0}")]
    Rpc(String),
}

#[async_trait]
pub trait AccountReader: Send + Sync {
    async fn read(&self, address: &Pubkey) -> Result<AccountData, ReadError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceDelta {
    pub account: Pubkey,
    pub pre_lamports: u64,
    pub post_lamports: u64,
}

impl BalanceDelta {
    pub fn delta(&self) -> i128 {
        self.post_lamports as i128 - self.pre_lamports as i128
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimulationResult {
    pub success: bool,
    pub logs: Vec<String>,
    pub compute_units: Option<u64>,
    pub balance_deltas: Vec<BalanceDelta>,
    pub error: Option<String>,
}

#[async_trait]
pub trait TransactionSimulator: Send + Sync {
    /// Must not mutate or sign `tx`
    async fn simulate(&self, tx: &UnsignedTransaction) -> Result<SimulationResult>;
}

pub struct RpcAccountReader {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl RpcAccountReader {
    pub fn new(client: Arc<RpcClient>, commitment: CommitmentConfig) -> Self {
        Self { client, commitment }
    }
}

#[async_trait]
impl AccountReader for RpcAccountReader {
    async fn read(&self, address: &Pubkey) -> Result<AccountData, ReadError> {
        let response = self
            .client
            .get_account_with_commitment(address, self.commitment)
            .await
            .map_err(|e| ReadError::Rpc(e.to_string()))?;

        let account = response.value.ok_or(ReadError::NotFound(*address))?;
        Ok(AccountData {
            data: account.data,
            owner: account.owner,
            lamports: account.lamports,
            slot: response.context.slot,
        })
    }
}

pub struct RpcTransactionSimulator {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl RpcTransactionSimulator {
    pub fn new(client: Arc<RpcClient>, commitment: CommitmentConfig) -> Self {
        Self { client, commitment }
    }
}

#[async_trait]
impl TransactionSimulator for RpcTransactionSimulator {
    async fn simulate(&self, tx: &UnsignedTransaction) -> Result<SimulationResult> {
        let watched = tx.writable_accounts();

        let pre_balances: Vec<u64> = self
            .client
            .get_multiple_accounts_with_commitment(&watched, self.commitment)
            .await
            .context("Failed to fetch pre-simulation balances")?
            .value
            .into_iter()
            .map(|account| account.map(|a| a.lamports).unwrap_or(0))
            .collect();

        // the node swaps in its own blockhash
        let versioned = tx.to_versioned(Hash::default())?;

        let config = RpcSimulateTransactionConfig {
            sig_verify: false,
            replace_recent_blockhash: true,
            commitment: Some(self.commitment),
            accounts: Some(RpcSimulateTransactionAccountsConfig {
                encoding: Some(UiAccountEncoding::Base64),
                addresses: watched.iter().map(Pubkey::to_string).collect(),
            }),
            ..RpcSimulateTransactionConfig::default()
        };

        let result = self
            .client
            .simulate_transaction_with_config(&versioned, config)
            .await
            .context("Failed to simulate transaction")?
            .value;

        let post_balances = result.accounts.unwrap_or_default();
        let balance_deltas = watched
            .iter()
            .zip(pre_balances)
            .enumerate()
            .map(|(i, (account, pre_lamports))| BalanceDelta {
                account: *account,
                pre_lamports,
                post_lamports: post_balances
                    .get(i)
                    .and_then(|a| a.as_ref())
                    .map(|a| a.lamports)
                    .unwrap_or(0),
            })
            .collect();

        Ok(SimulationResult {
            success: result.err.is_none(),
            logs: result.logs.unwrap_or_default(),
            compute_units: result.units_consumed,
            balance_deltas,
            error: result.err.map(|e| e.to_string()),
        })
    }
}
