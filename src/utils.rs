use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, system_instruction};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};

use crate::constants::WSOL_MINT;
use crate::error::{LaunchpadError, LaunchpadResult};

/// `ceil(a / b)`, `None` when `b` is zero
pub fn ceil_div(a: u128, b: u128) -> Option<u128> {
    if b == 0 {
        return None;
    }
    Some(a / b + u128::from(a % b != 0))
}

/// `floor(amount * (1 - slippage))`
pub fn apply_min_slippage(amount: u64, slippage: Decimal) -> LaunchpadResult<u64> {
    let factor = Decimal::ONE - slippage;
    Decimal::from(amount)
        .checked_mul(factor)
        .and_then(|v| v.floor().to_u64())
        .ok_or(LaunchpadError::ArithmeticOverflow("slippage"))
}

/// `ceil(amount * (1 + slippage))`
pub fn apply_max_slippage(amount: u64, slippage: Decimal) -> LaunchpadResult<u64> {
    let factor = Decimal::ONE + slippage;
    Decimal::from(amount)
        .checked_mul(factor)
        .and_then(|v| v.ceil().to_u64())
        .ok_or(LaunchpadError::ArithmeticOverflow("slippage"))
}

/// Create the owner's WSOL account if needed, fund it with `amount` and sync it
pub fn get_wrap_sol_to_wsol_instructions(
    owner: &Pubkey,
    amount: u64,
) -> LaunchpadResult<Vec<Instruction>> {
    let wsol_account = get_associated_token_address(owner, &WSOL_MINT);

    let sync = spl_token::instruction::sync_native(&spl_token::ID, &wsol_account)
        .map_err(|e| LaunchpadError::Internal(e.to_string()))?;

    Ok(vec![
        create_associated_token_account_idempotent(owner, owner, &WSOL_MINT, &spl_token::ID),
        system_instruction::transfer(owner, &wsol_account, amount),
        sync,
    ])
}

/// Close the owner's WSOL account, returning its lamports as SOL
pub fn get_close_wsol_instructions(owner: &Pubkey) -> LaunchpadResult<Vec<Instruction>> {
    let wsol_account = get_associated_token_address(owner, &WSOL_MINT);

    let close = spl_token::instruction::close_account(
        &spl_token::ID,
        &wsol_account,
        owner,
        owner,
        &[],
    )
    .map_err(|e| LaunchpadError::Internal(e.to_string()))?;

    Ok(vec![close])
}
