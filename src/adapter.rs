use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, system_program, sysvar};
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use tokio_util::sync::CancellationToken;

use crate::account_metas::{LaunchLabTrade, PumpFunBuy, PumpFunSell};
use crate::cache::CurveCache;
use crate::codec::{InstructionCodec, TradeInstructionArgs};
use crate::config::AdapterConfig;
use crate::constants::{
    EVENT_AUTHORITY_SEED, GLOBAL_SEED, METADATA_PROGRAM_ID, POOL_VAULT_SEED, VAULT_AUTHORITY_SEED,
    WSOL_MINT,
};
use crate::curve::{ConstantProductCurve, CurveModel, CurveState};
use crate::error::{LaunchpadError, LaunchpadResult};
use crate::events::{self, AdapterEvent, ParsedTransaction};
use crate::lifecycle::{TradeLifecycle, TradeStage};
use crate::metadata::decode_token_metadata;
use crate::pda;
use crate::privacy::{PrivacyConfig, PrivacyPlan};
use crate::rpc::{AccountData, AccountReader, ReadError, SimulationResult, TransactionSimulator};
use crate::safety::{InstructionTemplate, SafetyGate};
use crate::schema::{AccountScheme, PlatformSchema, TradeSemantics};
use crate::transaction::{TransactionBuilder, UnsignedTransaction};
use crate::types::{Platform, Quote, Side, TokenInfo, TradeArgs};
use crate::utils::{
    apply_max_slippage, apply_min_slippage, get_close_wsol_instructions,
    get_wrap_sol_to_wsol_instructions,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdapterSettings {
    pub io_timeout: Duration,
    pub compute_unit_limit: u32,
    pub compute_unit_price: u64,
    pub curve_cache_capacity: u64,
}

impl From<&AdapterConfig> for AdapterSettings {
    fn from(config: &AdapterConfig) -> Self {
        Self {
            io_timeout: config.io_timeout,
            compute_unit_limit: config.compute_unit_limit,
            compute_unit_price: config.compute_unit_price,
            curve_cache_capacity: config.curve_cache_capacity,
        }
    }
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self::from(&AdapterConfig::default())
    }
}

/// A built transaction together with its simulation
#[derive(Clone, Debug)]
pub struct SimulatedTrade {
    pub transaction: UnsignedTransaction,
    pub simulation: SimulationResult,
    pub stage: TradeStage,
}

/// One launchpad behind the unified fetch/quote/build/parse/simulate surface.
///
/// Holds no per-trade state. The only thing shared between calls is the
/// curve snapshot cache, which is replaced whole on each fetch.
pub struct LaunchpadAdapter {
    codec: InstructionCodec,
    curve: Arc<dyn CurveModel>,
    reader: Arc<dyn AccountReader>,
    simulator: Arc<dyn TransactionSimulator>,
    gate: SafetyGate,
    cache: CurveCache,
    settings: AdapterSettings,
}

impl LaunchpadAdapter {
    pub fn new(
        schema: &'static PlatformSchema,
        reader: Arc<dyn AccountReader>,
        simulator: Arc<dyn TransactionSimulator>,
        gate: SafetyGate,
        settings: AdapterSettings,
    ) -> Self {
        Self {
            codec: InstructionCodec::new(schema),
            curve: Arc::new(ConstantProductCurve::new(schema.fee_bps)),
            reader,
            simulator,
            gate,
            cache: CurveCache::new(settings.curve_cache_capacity),
            settings,
        }
    }

    /// Replace the pricing model for curves that are not constant product
    pub fn with_curve_model(mut self, curve: Arc<dyn CurveModel>) -> Self {
        self.curve = curve;
        self
    }

    pub fn platform(&self) -> Platform {
        self.codec.schema().platform
    }

    pub fn schema(&self) -> &'static PlatformSchema {
        self.codec.schema()
    }

    pub fn program_id(&self) -> Pubkey {
        self.codec.schema().program_id
    }

    pub fn codec(&self) -> &InstructionCodec {
        &self.codec
    }

    pub fn curve_model(&self) -> &dyn CurveModel {
        self.curve.as_ref()
    }

    pub fn gate(&self) -> &SafetyGate {
        &self.gate
    }

    pub fn curve_address(&self, token: &Pubkey) -> LaunchpadResult<Pubkey> {
        pda::curve_address(self.schema(), token)
    }

    /// Runs one collaborator call under the I/O timeout, giving up early on
    /// cancellation.
    async fn guarded<T, F>(&self, cancel: &CancellationToken, call: F) -> LaunchpadResult<T>
    where
        F: Future<Output = LaunchpadResult<T>>,
    {
        if cancel.is_cancelled() {
            return Err(LaunchpadError::Cancelled);
        }
        let timeout = self.settings.io_timeout;
        tokio::select! {
            _ = cancel.cancelled() => Err(LaunchpadError::Cancelled),
            result = tokio::time::timeout(timeout, call) => {
                result.unwrap_or(Err(LaunchpadError::Timeout(timeout)))
            }
        }
    }

    async fn read_account(
        &self,
        address: &Pubkey,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<AccountData> {
        self.guarded(cancel, async {
            self.reader.read(address).await.map_err(|e| match e {
                ReadError::NotFound(_) => LaunchpadError::AccountNotFound(*address),
                ReadError::Stale { account, reason } => {
                    log::warn!("stale read of {account}: {reason}");
                    LaunchpadError::StaleRead { account, reason }
                }
                ReadError::Rpc(message) => LaunchpadError::RpcError(message),
            })
        })
        .await
    }

    /// Reads and decodes the curve of `token`, replacing the cached snapshot
    pub async fn fetch_curve_state(
        &self,
        token: &Pubkey,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<Arc<CurveState>> {
        let address = self.curve_address(token)?;
        let account = self.read_account(&address, cancel).await?;

        if account.owner != self.program_id() {
            return Err(LaunchpadError::MalformedAccountData {
                account: address,
                reason: format!("owned by {}, expected {}", account.owner, self.program_id()),
            });
        }
        let state = self
            .codec
            .decode_curve_state(&address, token, &account.data, account.slot, Utc::now())?;

        if cancel.is_cancelled() {
            return Err(LaunchpadError::Cancelled);
        }
        let state = self.cache.replace(state)?;
        log::debug!(
            "{} curve {} for {token} at slot {}",
            self.platform(),
            address,
            state.slot
        );
        Ok(state)
    }

    pub fn cached_curve_state(&self, token: &Pubkey) -> Option<Arc<CurveState>> {
        self.cache.get(token)
    }

    pub fn invalidate(&self, token: &Pubkey) {
        self.cache.invalidate(token);
    }

    /// Pure quote against a known snapshot
    pub fn quote_from_state(
        &self,
        state: &CurveState,
        side: Side,
        args: &TradeArgs,
        now: DateTime<Utc>,
    ) -> LaunchpadResult<Quote> {
        args.validate(now)?;
        if state.token != args.token {
            return Err(LaunchpadError::InvalidTradeArgs(format!(
                "curve snapshot is for {}, trade is for {}",
                state.token, args.token
            )));
        }
        if state.complete {
            return Err(LaunchpadError::CurveComplete(state.token));
        }

        let step = match side {
            Side::Buy => self.curve.quote_buy(state, args.amount)?,
            Side::Sell => self.curve.quote_sell(state, args.amount)?,
        };

        Ok(Quote {
            side,
            token: args.token,
            input_amount: step.amount_in,
            output_amount: step.amount_out,
            price_impact: step.price_impact,
            slippage: args.slippage,
            fee: step.fee,
            min_output: apply_min_slippage(step.amount_out, args.slippage)?,
            max_input: apply_max_slippage(step.amount_in, args.slippage)?,
            expiry: args.deadline,
        })
    }

    /// Quotes against the cached snapshot, fetching one only if none is held
    pub async fn quote(
        &self,
        side: Side,
        args: &TradeArgs,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<Quote> {
        args.validate(Utc::now())?;
        let state = match self.cache.get(&args.token) {
            Some(state) => state,
            None => self.fetch_curve_state(&args.token, cancel).await?,
        };
        self.quote_from_state(&state, side, args, Utc::now())
    }

    /// Re-fetches the curve, quotes every slice and assembles the gated
    /// instruction list.
    pub async fn build_transaction(
        &self,
        side: Side,
        args: &TradeArgs,
        privacy: Option<&PrivacyConfig>,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<UnsignedTransaction> {
        let mut lifecycle = TradeLifecycle::new(args.token);
        match self
            .build_with_lifecycle(side, args, privacy, cancel, &mut lifecycle)
            .await
        {
            Ok(tx) => Ok(tx),
            Err(e) => Err(lifecycle.reject(e)),
        }
    }

    pub async fn build_buy_tx(
        &self,
        args: &TradeArgs,
        privacy: Option<&PrivacyConfig>,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<UnsignedTransaction> {
        self.build_transaction(Side::Buy, args, privacy, cancel)
            .await
    }

    pub async fn build_sell_tx(
        &self,
        args: &TradeArgs,
        privacy: Option<&PrivacyConfig>,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<UnsignedTransaction> {
        self.build_transaction(Side::Sell, args, privacy, cancel)
            .await
    }

    async fn build_with_lifecycle(
        &self,
        side: Side,
        args: &TradeArgs,
        privacy: Option<&PrivacyConfig>,
        cancel: &CancellationToken,
        lifecycle: &mut TradeLifecycle,
    ) -> LaunchpadResult<UnsignedTransaction> {
        args.validate(Utc::now())?;
        let plan = match privacy {
            Some(config) => config.apply(args)?,
            None => PrivacyPlan::passthrough(args),
        };
        let actor = plan.actor.ok_or_else(|| {
            LaunchpadError::InvalidTradeArgs("no actor or alternate signer given".to_string())
        })?;
        self.gate.allowlist().check(&self.program_id())?;

        let state = self.fetch_curve_state(&args.token, cancel).await?;
        lifecycle.advance(TradeStage::CurveFetched)?;

        let now = Utc::now();
        args.check_deadline(now)?;

        let mut quotes = Vec::with_capacity(plan.slices.len());
        let mut current = (*state).clone();
        for amount in &plan.slices {
            let slice = TradeArgs {
                amount: *amount,
                ..args.clone()
            };
            quotes.push(self.quote_from_state(&current, side, &slice, now)?);
            current = match side {
                Side::Buy => self.curve.apply_buy(&current, *amount)?,
                Side::Sell => self.curve.apply_sell(&current, *amount)?,
            };
        }
        lifecycle.advance(TradeStage::Quoted)?;

        let mut builder = TransactionBuilder::new(&self.gate, self.platform(), actor);
        builder.compute_budget(
            self.settings.compute_unit_limit,
            self.settings.compute_unit_price,
        )?;
        self.push_preparation(&mut builder, side, &actor, &args.token, &plan.slices)?;

        let template = InstructionTemplate::trade(self.schema(), side);
        for quote in quotes {
            let ix = self.trade_instruction(side, &actor, &state, &quote)?;
            builder.push(&template, &ix)?;
            builder.record_quote(quote);
        }
        self.push_cleanup(&mut builder, &actor)?;
        builder.timing_jitter(plan.timing_jitter);

        let tx = builder.build()?;
        lifecycle.advance(TradeStage::Built)?;
        log::info!(
            "built {} {side} of {} for {actor}: {} instructions, {} slices",
            self.platform(),
            args.token,
            tx.len(),
            plan.slices.len()
        );
        Ok(tx)
    }

    fn push_preparation(
        &self,
        builder: &mut TransactionBuilder<'_>,
        side: Side,
        actor: &Pubkey,
        token: &Pubkey,
        slices: &[u64],
    ) -> LaunchpadResult<()> {
        let create_ata = InstructionTemplate::create_associated_token_account();
        match (self.schema().accounts, side) {
            (AccountScheme::PumpFun { .. }, Side::Buy) => builder.push(
                &create_ata,
                &create_associated_token_account_idempotent(actor, actor, token, &spl_token::ID),
            ),
            (AccountScheme::PumpFun { .. }, Side::Sell) => Ok(()),
            (AccountScheme::LaunchLab { .. }, Side::Buy) => {
                let total: u64 = slices.iter().sum();
                let wrap = get_wrap_sol_to_wsol_instructions(actor, total)?;
                let templates = [
                    create_ata.clone(),
                    InstructionTemplate::system_transfer(),
                    InstructionTemplate::sync_native(),
                ];
                for (template, ix) in templates.iter().zip(&wrap) {
                    builder.push(template, ix)?;
                }
                builder.push(
                    &create_ata,
                    &create_associated_token_account_idempotent(
                        actor,
                        actor,
                        token,
                        &spl_token::ID,
                    ),
                )
            }
            (AccountScheme::LaunchLab { .. }, Side::Sell) => builder.push(
                &create_ata,
                &create_associated_token_account_idempotent(
                    actor,
                    actor,
                    &WSOL_MINT,
                    &spl_token::ID,
                ),
            ),
        }
    }

    fn push_cleanup(
        &self,
        builder: &mut TransactionBuilder<'_>,
        actor: &Pubkey,
    ) -> LaunchpadResult<()> {
        if self.schema().needs_wsol() {
            let template = InstructionTemplate::close_account();
            for ix in get_close_wsol_instructions(actor)? {
                builder.push(&template, &ix)?;
            }
        }
        Ok(())
    }

    fn trade_instruction(
        &self,
        side: Side,
        actor: &Pubkey,
        state: &CurveState,
        quote: &Quote,
    ) -> LaunchpadResult<Instruction> {
        let schema = self.schema();
        let program = schema.program_id;
        let mint = state.token;
        let curve = state.curve_account;

        let args = match schema.trade(side).semantics {
            TradeSemantics::ExactOutput => TradeInstructionArgs {
                side,
                amount: quote.output_amount,
                limit: quote.max_input,
            },
            TradeSemantics::ExactInput => TradeInstructionArgs {
                side,
                amount: quote.input_amount,
                limit: quote.min_output,
            },
        };
        let event_authority = pda::program_pda(&[EVENT_AUTHORITY_SEED], &program)?;

        let accounts = match schema.accounts {
            AccountScheme::PumpFun { fee_recipient } => {
                let global = pda::program_pda(&[GLOBAL_SEED], &program)?;
                let associated_bonding_curve =
                    pda::associated_token_address(&curve, &mint, &spl_token::ID)?;
                let associated_user = pda::associated_token_address(actor, &mint, &spl_token::ID)?;
                match side {
                    Side::Buy => PumpFunBuy {
                        global,
                        fee_recipient,
                        mint,
                        bonding_curve: curve,
                        associated_bonding_curve,
                        associated_user,
                        user: *actor,
                        system_program: system_program::ID,
                        token_program: spl_token::ID,
                        rent: sysvar::rent::ID,
                        event_authority,
                        program,
                    }
                    .into(),
                    Side::Sell => PumpFunSell {
                        global,
                        fee_recipient,
                        mint,
                        bonding_curve: curve,
                        associated_bonding_curve,
                        associated_user,
                        user: *actor,
                        system_program: system_program::ID,
                        associated_token_program: spl_associated_token_account::ID,
                        token_program: spl_token::ID,
                        event_authority,
                        program,
                    }
                    .into(),
                }
            }
            AccountScheme::LaunchLab {
                global_config,
                platform_config,
            } => LaunchLabTrade {
                payer: *actor,
                authority: pda::program_pda(&[VAULT_AUTHORITY_SEED], &program)?,
                global_config,
                platform_config,
                pool_state: curve,
                user_base_token: pda::associated_token_address(actor, &mint, &spl_token::ID)?,
                user_quote_token: pda::associated_token_address(actor, &WSOL_MINT, &spl_token::ID)?,
                base_vault: pda::program_pda(
                    &[POOL_VAULT_SEED, curve.as_ref(), mint.as_ref()],
                    &program,
                )?,
                quote_vault: pda::program_pda(
                    &[POOL_VAULT_SEED, curve.as_ref(), WSOL_MINT.as_ref()],
                    &program,
                )?,
                base_token_mint: mint,
                quote_token_mint: WSOL_MINT,
                base_token_program: spl_token::ID,
                quote_token_program: spl_token::ID,
                event_authority,
                program,
            }
            .into(),
        };

        Ok(Instruction {
            program_id: program,
            accounts,
            data: self.codec.encode_trade(&args),
        })
    }

    /// Hands `tx` to the simulator unchanged
    pub async fn simulate(
        &self,
        tx: &UnsignedTransaction,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<SimulationResult> {
        if tx.platform() != self.platform() {
            return Err(LaunchpadError::InvalidTradeArgs(format!(
                "{} transaction given to the {} adapter",
                tx.platform(),
                self.platform()
            )));
        }
        self.guarded(cancel, async {
            self.simulator
                .simulate(tx)
                .await
                .map_err(|e| LaunchpadError::RpcError(format!("{e:#}")))
        })
        .await
    }

    /// Build, then simulate, tracking the trade through to `Done` or
    /// `Rejected`
    pub async fn build_and_simulate(
        &self,
        side: Side,
        args: &TradeArgs,
        privacy: Option<&PrivacyConfig>,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<SimulatedTrade> {
        let mut lifecycle = TradeLifecycle::new(args.token);
        let transaction = match self
            .build_with_lifecycle(side, args, privacy, cancel, &mut lifecycle)
            .await
        {
            Ok(tx) => tx,
            Err(e) => return Err(lifecycle.reject(e)),
        };
        let simulation = match self.simulate(&transaction, cancel).await {
            Ok(result) => result,
            Err(e) => return Err(lifecycle.reject(e)),
        };
        lifecycle.advance(TradeStage::Simulated)?;
        if simulation.success {
            lifecycle.advance(TradeStage::Done)?;
        } else {
            log::warn!(
                "simulation of {} {side} failed: {}",
                self.platform(),
                simulation.error.as_deref().unwrap_or("unknown error")
            );
            lifecycle.reject(LaunchpadError::Internal("simulation failed".to_string()));
        }
        Ok(SimulatedTrade {
            transaction,
            simulation,
            stage: lifecycle.stage(),
        })
    }

    pub fn parse_events(&self, tx: &ParsedTransaction) -> Vec<AdapterEvent> {
        events::parse_events(&self.codec, tx)
    }

    /// Name, symbol and uri from the token's metadata account
    pub async fn fetch_token_info(
        &self,
        token: &Pubkey,
        cancel: &CancellationToken,
    ) -> LaunchpadResult<TokenInfo> {
        let address = pda::metadata_address(token)?;
        let account = self.read_account(&address, cancel).await?;
        if account.owner != METADATA_PROGRAM_ID {
            return Err(LaunchpadError::MalformedAccountData {
                account: address,
                reason: format!("owned by {}", account.owner),
            });
        }
        decode_token_metadata(&address, token, &account.data)
    }
}
