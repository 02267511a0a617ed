use solana_sdk::instruction::AccountMeta;
use solana_sdk::pubkey::Pubkey;

use crate::safety::AccountFlags;
use crate::safety::AccountFlags as F;
use crate::schema::{AccountScheme, PlatformSchema};

pub(crate) struct PumpFunBuy {
    pub global: Pubkey,
    pub fee_recipient: Pubkey,
    pub mint: Pubkey,
    pub bonding_curve: Pubkey,
    pub associated_bonding_curve: Pubkey,
    pub associated_user: Pubkey,
    pub user: Pubkey,
    pub system_program: Pubkey,
    pub token_program: Pubkey,
    pub rent: Pubkey,
    pub event_authority: Pubkey,
    pub program: Pubkey,
}

impl From<PumpFunBuy> for Vec<AccountMeta> {
    fn from(accounts: PumpFunBuy) -> Self {
        vec![
            AccountMeta::new_readonly(accounts.global, false),
            AccountMeta::new(accounts.fee_recipient, false),
            AccountMeta::new_readonly(accounts.mint, false),
            AccountMeta::new(accounts.bonding_curve, false),
            AccountMeta::new(accounts.associated_bonding_curve, false),
            AccountMeta::new(accounts.associated_user, false),
            AccountMeta::new(accounts.user, true),
            AccountMeta::new_readonly(accounts.system_program, false),
            AccountMeta::new_readonly(accounts.token_program, false),
            AccountMeta::new_readonly(accounts.rent, false),
            AccountMeta::new_readonly(accounts.event_authority, false),
            AccountMeta::new_readonly(accounts.program, false),
        ]
    }
}

pub(crate) struct PumpFunSell {
    pub global: Pubkey,
    pub fee_recipient: Pubkey,
    pub mint: Pubkey,
    pub bonding_curve: Pubkey,
    pub associated_bonding_curve: Pubkey,
    pub associated_user: Pubkey,
    pub user: Pubkey,
    pub system_program: Pubkey,
    pub associated_token_program: Pubkey,
    pub token_program: Pubkey,
    pub event_authority: Pubkey,
    pub program: Pubkey,
}

impl From<PumpFunSell> for Vec<AccountMeta> {
    fn from(accounts: PumpFunSell) -> Self {
        vec![
            AccountMeta::new_readonly(accounts.global, false),
            AccountMeta::new(accounts.fee_recipient, false),
            AccountMeta::new_readonly(accounts.mint, false),
            AccountMeta::new(accounts.bonding_curve, false),
            AccountMeta::new(accounts.associated_bonding_curve, false),
            AccountMeta::new(accounts.associated_user, false),
            AccountMeta::new(accounts.user, true),
            AccountMeta::new_readonly(accounts.system_program, false),
            AccountMeta::new_readonly(accounts.associated_token_program, false),
            AccountMeta::new_readonly(accounts.token_program, false),
            AccountMeta::new_readonly(accounts.event_authority, false),
            AccountMeta::new_readonly(accounts.program, false),
        ]
    }
}

/// `buy_exact_in` and `sell_exact_in` share one account list
pub(crate) struct LaunchLabTrade {
    pub payer: Pubkey,
    pub authority: Pubkey,
    pub global_config: Pubkey,
    pub platform_config: Pubkey,
    pub pool_state: Pubkey,
    pub user_base_token: Pubkey,
    pub user_quote_token: Pubkey,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub base_token_mint: Pubkey,
    pub quote_token_mint: Pubkey,
    pub base_token_program: Pubkey,
    pub quote_token_program: Pubkey,
    pub event_authority: Pubkey,
    pub program: Pubkey,
}

impl From<LaunchLabTrade> for Vec<AccountMeta> {
    fn from(accounts: LaunchLabTrade) -> Self {
        vec![
            AccountMeta::new_readonly(accounts.payer, true),
            AccountMeta::new_readonly(accounts.authority, false),
            AccountMeta::new_readonly(accounts.global_config, false),
            AccountMeta::new_readonly(accounts.platform_config, false),
            AccountMeta::new(accounts.pool_state, false),
            AccountMeta::new(accounts.user_base_token, false),
            AccountMeta::new(accounts.user_quote_token, false),
            AccountMeta::new(accounts.base_vault, false),
            AccountMeta::new(accounts.quote_vault, false),
            AccountMeta::new_readonly(accounts.base_token_mint, false),
            AccountMeta::new_readonly(accounts.quote_token_mint, false),
            AccountMeta::new_readonly(accounts.base_token_program, false),
            AccountMeta::new_readonly(accounts.quote_token_program, false),
            AccountMeta::new_readonly(accounts.event_authority, false),
            AccountMeta::new_readonly(accounts.program, false),
        ]
    }
}

// buy and sell lists differ in which programs they name, not in flags
const PUMP_FUN_TRADE_FLAGS: [AccountFlags; 12] = [
    F::READONLY,
    F::WRITABLE,
    F::READONLY,
    F::WRITABLE,
    F::WRITABLE,
    F::WRITABLE,
    F::WRITABLE_SIGNER,
    F::READONLY,
    F::READONLY,
    F::READONLY,
    F::READONLY,
    F::READONLY,
];

const LAUNCHLAB_TRADE_FLAGS: [AccountFlags; 15] = [
    F::SIGNER,
    F::READONLY,
    F::READONLY,
    F::READONLY,
    F::WRITABLE,
    F::WRITABLE,
    F::WRITABLE,
    F::WRITABLE,
    F::WRITABLE,
    F::READONLY,
    F::READONLY,
    F::READONLY,
    F::READONLY,
    F::READONLY,
    F::READONLY,
];

/// Expected account flags of the trade instruction on `schema`
pub(crate) fn trade_flags(schema: &PlatformSchema) -> &'static [AccountFlags] {
    match schema.accounts {
        AccountScheme::PumpFun { .. } => &PUMP_FUN_TRADE_FLAGS,
        AccountScheme::LaunchLab { .. } => &LAUNCHLAB_TRADE_FLAGS,
    }
}
