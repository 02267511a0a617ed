use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;

use crate::constants::BPS_DENOMINATOR;
use crate::error::{LaunchpadError, LaunchpadResult};
use crate::utils::ceil_div;

/// Snapshot of a bonding curve as decoded from its account.
///
/// Reserves are effective reserves in the smallest unit of each asset: the
/// base asset is lamports, the token asset is the mint's base unit. A newer
/// fetch supersedes a snapshot, nothing mutates one in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurveState {
    pub token: Pubkey,
    pub curve_account: Pubkey,
    pub virtual_base_reserves: u64,
    pub virtual_token_reserves: u64,
    pub real_base_reserves: u64,
    pub real_token_reserves: u64,
    pub total_supply: u64,
    /// Curve has graduated and no longer trades
    pub complete: bool,
    /// RPC context slot of the read
    pub slot: u64,
    pub observed_at: DateTime<Utc>,
}

impl CurveState {
    pub fn validate(&self) -> LaunchpadResult<()> {
        let malformed = |reason: &str| LaunchpadError::MalformedAccountData {
            account: self.curve_account,
            reason: reason.to_string(),
        };

        if self.virtual_base_reserves == 0 || self.virtual_token_reserves == 0 {
            return Err(malformed("virtual reserves must be non-zero"));
        }
        if self.virtual_base_reserves < self.real_base_reserves {
            return Err(malformed("virtual base reserves below real base reserves"));
        }
        if self.virtual_token_reserves < self.real_token_reserves {
            return Err(malformed("virtual token reserves below real token reserves"));
        }
        Ok(())
    }

    /// `virtual_base / virtual_token`
    pub fn spot_price(&self) -> Option<Decimal> {
        Decimal::from(self.virtual_base_reserves)
            .checked_div(Decimal::from(self.virtual_token_reserves))
    }

    /// Spot price times total supply, in base units
    pub fn market_cap(&self) -> Option<Decimal> {
        self.spot_price()?
            .checked_mul(Decimal::from(self.total_supply))
    }

    pub fn liquidity(&self) -> u64 {
        self.real_base_reserves
    }
}

/// Result of a single curve step
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurveQuote {
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee: u64,
    pub price_impact: Decimal,
}

/// Bonding curve pricing, a pure function of a [`CurveState`]
pub trait CurveModel: Send + Sync {
    fn fee_bps(&self) -> u64;

    /// Spot price in base units per token unit
    fn price(&self, state: &CurveState) -> LaunchpadResult<Decimal>;

    /// Tokens received for `base_in` lamports, fee taken from the input
    fn quote_buy(&self, state: &CurveState, base_in: u64) -> LaunchpadResult<CurveQuote>;

    /// Lamports received for `token_in` tokens, fee taken from the output
    fn quote_sell(&self, state: &CurveState, token_in: u64) -> LaunchpadResult<CurveQuote>;

    /// Successor snapshot after a buy of `base_in`
    fn apply_buy(&self, state: &CurveState, base_in: u64) -> LaunchpadResult<CurveState>;

    /// Successor snapshot after a sell of `token_in`
    fn apply_sell(&self, state: &CurveState, token_in: u64) -> LaunchpadResult<CurveState>;
}

/// `virtual_base * virtual_token = k`, rounded so the caller is never
/// promised more than the program pays out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstantProductCurve {
    pub fee_bps: u64,
}

struct CurveStep {
    fee: u64,
    base_delta: u64,
    token_delta: u64,
}

impl ConstantProductCurve {
    pub fn new(fee_bps: u64) -> Self {
        Self { fee_bps }
    }

    fn fee_on(&self, amount: u64) -> LaunchpadResult<u64> {
        let fee = ceil_div(
            amount as u128 * self.fee_bps as u128,
            BPS_DENOMINATOR as u128,
        )
        .ok_or(LaunchpadError::ArithmeticOverflow("fee"))?;
        u64::try_from(fee).map_err(|_| LaunchpadError::ArithmeticOverflow("fee"))
    }

    fn buy_step(&self, state: &CurveState, base_in: u64) -> LaunchpadResult<CurveStep> {
        state.validate()?;
        let fee = self.fee_on(base_in)?;
        let net_in = base_in.saturating_sub(fee);

        let vb = state.virtual_base_reserves as u128;
        let vt = state.virtual_token_reserves as u128;
        let k = vb * vt;
        let new_vb = vb
            .checked_add(net_in as u128)
            .ok_or(LaunchpadError::ArithmeticOverflow("buy"))?;
        let new_vt = ceil_div(k, new_vb).ok_or(LaunchpadError::ArithmeticOverflow("buy"))?;
        let token_out = vt.saturating_sub(new_vt) as u64;

        if token_out > state.real_token_reserves {
            return Err(LaunchpadError::InsufficientLiquidity {
                requested: token_out,
                available: state.real_token_reserves,
            });
        }

        Ok(CurveStep {
            fee,
            base_delta: net_in,
            token_delta: token_out,
        })
    }

    fn sell_step(&self, state: &CurveState, token_in: u64) -> LaunchpadResult<CurveStep> {
        state.validate()?;
        let vb = state.virtual_base_reserves as u128;
        let vt = state.virtual_token_reserves as u128;
        let k = vb * vt;
        let new_vt = vt
            .checked_add(token_in as u128)
            .ok_or(LaunchpadError::ArithmeticOverflow("sell"))?;
        let new_vb = ceil_div(k, new_vt).ok_or(LaunchpadError::ArithmeticOverflow("sell"))?;
        let gross_out = vb.saturating_sub(new_vb) as u64;

        if gross_out > state.real_base_reserves {
            return Err(LaunchpadError::InsufficientLiquidity {
                requested: gross_out,
                available: state.real_base_reserves,
            });
        }

        Ok(CurveStep {
            fee: self.fee_on(gross_out)?,
            base_delta: gross_out,
            token_delta: token_in,
        })
    }

    fn impact(&self, state: &CurveState, step: &CurveStep) -> LaunchpadResult<Decimal> {
        let spot = self.price(state)?;
        if step.token_delta == 0 {
            return Err(LaunchpadError::InvalidTradeArgs(
                "amount too small to move the curve".to_string(),
            ));
        }
        let executed = Decimal::from(step.base_delta)
            .checked_div(Decimal::from(step.token_delta))
            .ok_or(LaunchpadError::ArithmeticOverflow("price impact"))?;
        let impact = (executed - spot)
            .checked_div(spot)
            .ok_or(LaunchpadError::ArithmeticOverflow("price impact"))?;
        Ok(impact.abs())
    }
}

impl CurveModel for ConstantProductCurve {
    fn fee_bps(&self) -> u64 {
        self.fee_bps
    }

    fn price(&self, state: &CurveState) -> LaunchpadResult<Decimal> {
        state.validate()?;
        state
            .spot_price()
            .ok_or(LaunchpadError::ArithmeticOverflow("spot price"))
    }

    fn quote_buy(&self, state: &CurveState, base_in: u64) -> LaunchpadResult<CurveQuote> {
        let step = self.buy_step(state, base_in)?;
        let price_impact = self.impact(state, &step)?;
        Ok(CurveQuote {
            amount_in: base_in,
            amount_out: step.token_delta,
            fee: step.fee,
            price_impact,
        })
    }

    fn quote_sell(&self, state: &CurveState, token_in: u64) -> LaunchpadResult<CurveQuote> {
        let step = self.sell_step(state, token_in)?;
        if step.base_delta <= step.fee {
            return Err(LaunchpadError::InvalidTradeArgs(
                "sell output does not cover the fee".to_string(),
            ));
        }
        let price_impact = self.impact(state, &step)?;
        Ok(CurveQuote {
            amount_in: token_in,
            amount_out: step.base_delta - step.fee,
            fee: step.fee,
            price_impact,
        })
    }

    fn apply_buy(&self, state: &CurveState, base_in: u64) -> LaunchpadResult<CurveState> {
        let step = self.buy_step(state, base_in)?;
        let virtual_base_reserves = state
            .virtual_base_reserves
            .checked_add(step.base_delta)
            .ok_or(LaunchpadError::ArithmeticOverflow("buy"))?;
        let real_base_reserves = state
            .real_base_reserves
            .checked_add(step.base_delta)
            .ok_or(LaunchpadError::ArithmeticOverflow("buy"))?;
        Ok(CurveState {
            virtual_base_reserves,
            virtual_token_reserves: state.virtual_token_reserves - step.token_delta,
            real_base_reserves,
            real_token_reserves: state.real_token_reserves - step.token_delta,
            ..state.clone()
        })
    }

    fn apply_sell(&self, state: &CurveState, token_in: u64) -> LaunchpadResult<CurveState> {
        let step = self.sell_step(state, token_in)?;
        let virtual_token_reserves = state
            .virtual_token_reserves
            .checked_add(step.token_delta)
            .ok_or(LaunchpadError::ArithmeticOverflow("sell"))?;
        let real_token_reserves = state
            .real_token_reserves
            .checked_add(step.token_delta)
            .ok_or(LaunchpadError::ArithmeticOverflow("sell"))?;
        Ok(CurveState {
            virtual_base_reserves: state.virtual_base_reserves - step.base_delta,
            virtual_token_reserves,
            real_base_reserves: state.real_base_reserves - step.base_delta,
            real_token_reserves,
            ..state.clone()
        })
    }
}
