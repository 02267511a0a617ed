use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;

use crate::error::{LaunchpadError, LaunchpadResult};

/// Supported launchpads
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    PumpFun,
    BonkFun,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::PumpFun, Platform::BonkFun];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::PumpFun => "pumpfun",
            Platform::BonkFun => "bonkfun",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = LaunchpadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pumpfun" | "pump.fun" => Ok(Platform::PumpFun),
            "bonkfun" | "bonk.fun" => Ok(Platform::BonkFun),
            _ => Err(LaunchpadError::UnknownPlatform(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("buy"),
            Side::Sell => f.write_str("sell"),
        }
    }
}

/// 5%
pub fn default_slippage() -> Decimal {
    Decimal::new(5, 2)
}

/// Parameters of a single buy or sell.
///
/// For a buy `amount` is the base asset (lamports) spent, for a sell it is
/// the token amount (smallest unit) sold.
#[derive(Clone, Debug, PartialEq)]
pub struct TradeArgs {
    pub token: Pubkey,
    pub amount: u64,
    pub slippage: Decimal,
    pub actor: Option<Pubkey>,
    pub deadline: Option<DateTime<Utc>>,
}

impl TradeArgs {
    pub fn new(token: Pubkey, amount: u64) -> Self {
        Self {
            token,
            amount,
            slippage: default_slippage(),
            actor: None,
            deadline: None,
        }
    }

    pub fn with_slippage(mut self, slippage: Decimal) -> Self {
        self.slippage = slippage;
        self
    }

    pub fn with_actor(mut self, actor: Pubkey) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Checks amount and slippage range, then the deadline against `now`.
    pub fn validate(&self, now: DateTime<Utc>) -> LaunchpadResult<()> {
        if self.amount == 0 {
            return Err(LaunchpadError::InvalidTradeArgs(
                "amount must be greater than zero".to_string(),
            ));
        }
        if self.slippage < Decimal::ZERO || self.slippage >= Decimal::ONE {
            return Err(LaunchpadError::InvalidTradeArgs(format!(
                "slippage {} outside [0, 1)",
                self.slippage
            )));
        }
        self.check_deadline(now)
    }

    pub fn check_deadline(&self, now: DateTime<Utc>) -> LaunchpadResult<()> {
        match self.deadline {
            Some(deadline) if deadline <= now => Err(LaunchpadError::QuoteExpired { deadline }),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Quote {
    pub side: Side,
    pub token: Pubkey,
    pub input_amount: u64,
    pub output_amount: u64,
    pub price_impact: Decimal,
    pub slippage: Decimal,
    pub fee: u64,
    /// `floor(output_amount * (1 - slippage))`
    pub min_output: u64,
    /// `ceil(input_amount * (1 + slippage))`
    pub max_input: u64,
    pub expiry: Option<DateTime<Utc>>,
}

impl Quote {
    /// Base asset per token of this fill
    pub fn execution_price(&self) -> Option<Decimal> {
        let (base, token) = match self.side {
            Side::Buy => (self.input_amount, self.output_amount),
            Side::Sell => (self.output_amount, self.input_amount),
        };
        if token == 0 {
            return None;
        }
        Decimal::from(base).checked_div(Decimal::from(token))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenInfo {
    pub mint: Pubkey,
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_platform_parse() {
        assert_eq!("pump.fun".parse::<Platform>().unwrap(), Platform::PumpFun);
        assert_eq!("BonkFun".parse::<Platform>().unwrap(), Platform::BonkFun);
        assert!("raydium".parse::<Platform>().is_err());
        assert_eq!(Platform::BonkFun.to_string(), "bonkfun");
    }

    #[test]
    fn test_trade_args_validation() {
        let now = Utc::now();
        let args = TradeArgs::new(Pubkey::new_unique(), 10);
        assert!(args.validate(now).is_ok());

        let zero = TradeArgs::new(Pubkey::new_unique(), 0);
        assert!(matches!(
            zero.validate(now),
            Err(LaunchpadError::InvalidTradeArgs(_))
        ));

        let full_slippage = args.clone().with_slippage(Decimal::ONE);
        assert!(matches!(
            full_slippage.validate(now),
            Err(LaunchpadError::InvalidTradeArgs(_))
        ));

        let negative = args.clone().with_slippage(Decimal::new(-1, 2));
        assert!(negative.validate(now).is_err());

        let expired = args.with_deadline(now - Duration::seconds(1));
        assert!(matches!(
            expired.validate(now),
            Err(LaunchpadError::QuoteExpired { .. })
        ));
    }
}
