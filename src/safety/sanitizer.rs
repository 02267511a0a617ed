use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::instruction::Instruction;

use crate::codec::{read_u32, read_u64};
use crate::constants::MAX_COMPUTE_UNIT_LIMIT;
use crate::safety::{InstructionKind, InstructionTemplate};

pub const COMPUTE_UNIT_LIMIT_STEP: u32 = 10_000;
pub const COMPUTE_UNIT_PRICE_STEP: u64 = 1_000;

/// Removes caller-identifying variance from an already validated
/// instruction without changing what it does.
///
/// Compute budget values are rounded up to coarse steps, payload bytes past
/// the template's canonical length are dropped and interchangeable account
/// ranges are put in pubkey order. Applying it twice changes nothing.
pub fn sanitize(template: &InstructionTemplate, ix: &Instruction) -> Instruction {
    let mut out = match template.kind {
        InstructionKind::ComputeUnitLimit => match read_u32(&ix.data, 1) {
            Some(units) => ComputeBudgetInstruction::set_compute_unit_limit(round_limit(units)),
            None => ix.clone(),
        },
        InstructionKind::ComputeUnitPrice => match read_u64(&ix.data, 1) {
            Some(price) => ComputeBudgetInstruction::set_compute_unit_price(round_price(price)),
            None => ix.clone(),
        },
        _ => ix.clone(),
    };

    if let Some(len) = template.data_len {
        out.data.truncate(len);
    }

    for range in &template.interchangeable {
        if let Some(slot) = out.accounts.get_mut(range.clone()) {
            slot.sort_by(|a, b| a.pubkey.cmp(&b.pubkey));
        }
    }

    out
}

fn round_limit(units: u32) -> u32 {
    let rounded = units
        .div_ceil(COMPUTE_UNIT_LIMIT_STEP)
        .saturating_mul(COMPUTE_UNIT_LIMIT_STEP);
    rounded.min(MAX_COMPUTE_UNIT_LIMIT)
}

fn round_price(micro_lamports: u64) -> u64 {
    let steps = micro_lamports.div_ceil(COMPUTE_UNIT_PRICE_STEP);
    steps
        .checked_mul(COMPUTE_UNIT_PRICE_STEP)
        .unwrap_or(u64::MAX / COMPUTE_UNIT_PRICE_STEP * COMPUTE_UNIT_PRICE_STEP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::instruction::AccountMeta;
    use solana_sdk::pubkey::Pubkey;

    #[test]
    fn test_compute_budget_rounding() {
        let template = InstructionTemplate::compute_unit_limit();
        let ix = ComputeBudgetInstruction::set_compute_unit_limit(123_456);
        assert_eq!(
            sanitize(&template, &ix),
            ComputeBudgetInstruction::set_compute_unit_limit(130_000)
        );
        let ix = ComputeBudgetInstruction::set_compute_unit_limit(u32::MAX);
        assert_eq!(
            sanitize(&template, &ix),
            ComputeBudgetInstruction::set_compute_unit_limit(MAX_COMPUTE_UNIT_LIMIT)
        );

        let template = InstructionTemplate::compute_unit_price();
        let ix = ComputeBudgetInstruction::set_compute_unit_price(1);
        assert_eq!(
            sanitize(&template, &ix),
            ComputeBudgetInstruction::set_compute_unit_price(1_000)
        );
        assert_eq!(round_price(0), 0);
        assert_eq!(round_price(u64::MAX) % COMPUTE_UNIT_PRICE_STEP, 0);
    }

    #[test]
    fn test_trailing_bytes_are_dropped() {
        let template = InstructionTemplate::sync_native();
        let ix = Instruction {
            program_id: spl_token::ID,
            accounts: vec![AccountMeta::new(Pubkey::new_unique(), false)],
            data: vec![17, 0xde, 0xad],
        };
        assert_eq!(sanitize(&template, &ix).data, vec![17]);
    }

    #[test]
    fn test_interchangeable_accounts_sorted() {
        let template =
            InstructionTemplate::create_associated_token_account().with_interchangeable(4..6);
        let mut keys: Vec<Pubkey> = (0..6).map(|_| Pubkey::new_unique()).collect();
        keys[4..6].sort();
        keys.swap(4, 5);
        let ix = Instruction {
            program_id: spl_associated_token_account::ID,
            accounts: keys
                .iter()
                .map(|k| AccountMeta::new_readonly(*k, false))
                .collect(),
            data: vec![1],
        };
        let out = sanitize(&template, &ix);
        assert!(out.accounts[4].pubkey < out.accounts[5].pubkey);
        assert_eq!(out.accounts[0].pubkey, keys[0]);
    }
}
