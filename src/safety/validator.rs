use std::fmt;
use std::ops::Range;

use solana_sdk::{compute_budget, instruction::Instruction, pubkey::Pubkey, system_program};

use crate::account_metas;
use crate::error::{LaunchpadError, LaunchpadResult};
use crate::schema::PlatformSchema;
use crate::types::{Platform, Side};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    ComputeUnitLimit,
    ComputeUnitPrice,
    CreateAssociatedTokenAccount,
    SystemTransfer,
    SyncNative,
    CloseAccount,
    Trade(Platform),
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstructionKind::ComputeUnitLimit => f.write_str("compute unit limit"),
            InstructionKind::ComputeUnitPrice => f.write_str("compute unit price"),
            InstructionKind::CreateAssociatedTokenAccount => f.write_str("create token account"),
            InstructionKind::SystemTransfer => f.write_str("system transfer"),
            InstructionKind::SyncNative => f.write_str("sync native"),
            InstructionKind::CloseAccount => f.write_str("close account"),
            InstructionKind::Trade(platform) => write!(f, "{platform} trade"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccountFlags {
    pub writable: bool,
    pub signer: bool,
}

impl AccountFlags {
    pub const READONLY: AccountFlags = AccountFlags::new(false, false);
    pub const WRITABLE: AccountFlags = AccountFlags::new(true, false);
    pub const SIGNER: AccountFlags = AccountFlags::new(false, true);
    pub const WRITABLE_SIGNER: AccountFlags = AccountFlags::new(true, true);

    pub const fn new(writable: bool, signer: bool) -> Self {
        Self { writable, signer }
    }
}

/// Expected shape of one instruction kind
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstructionTemplate {
    pub kind: InstructionKind,
    pub program_id: Pubkey,
    pub accounts: Vec<AccountFlags>,
    pub data_prefix: Vec<u8>,
    pub min_data_len: usize,
    /// Canonical payload length, anything past it is dropped on sanitize
    pub data_len: Option<usize>,
    /// Account index ranges whose order has no meaning to the program
    pub interchangeable: Vec<Range<usize>>,
}

impl InstructionTemplate {
    fn fixed(
        kind: InstructionKind,
        program_id: Pubkey,
        accounts: &[AccountFlags],
        data_prefix: &[u8],
        data_len: usize,
    ) -> Self {
        Self {
            kind,
            program_id,
            accounts: accounts.to_vec(),
            data_prefix: data_prefix.to_vec(),
            min_data_len: data_len,
            data_len: Some(data_len),
            interchangeable: Vec::new(),
        }
    }

    pub fn compute_unit_limit() -> Self {
        Self::fixed(
            InstructionKind::ComputeUnitLimit,
            compute_budget::id(),
            &[],
            &[2],
            5,
        )
    }

    pub fn compute_unit_price() -> Self {
        Self::fixed(
            InstructionKind::ComputeUnitPrice,
            compute_budget::id(),
            &[],
            &[3],
            9,
        )
    }

    pub fn create_associated_token_account() -> Self {
        use AccountFlags as F;
        Self::fixed(
            InstructionKind::CreateAssociatedTokenAccount,
            spl_associated_token_account::ID,
            &[
                F::WRITABLE_SIGNER,
                F::WRITABLE,
                F::READONLY,
                F::READONLY,
                F::READONLY,
                F::READONLY,
            ],
            &[1],
            1,
        )
    }

    pub fn system_transfer() -> Self {
        Self::fixed(
            InstructionKind::SystemTransfer,
            system_program::id(),
            &[AccountFlags::WRITABLE_SIGNER, AccountFlags::WRITABLE],
            &[2, 0, 0, 0],
            12,
        )
    }

    pub fn sync_native() -> Self {
        Self::fixed(
            InstructionKind::SyncNative,
            spl_token::ID,
            &[AccountFlags::WRITABLE],
            &[17],
            1,
        )
    }

    pub fn close_account() -> Self {
        Self::fixed(
            InstructionKind::CloseAccount,
            spl_token::ID,
            &[
                AccountFlags::WRITABLE,
                AccountFlags::WRITABLE,
                AccountFlags::SIGNER,
            ],
            &[9],
            1,
        )
    }

    pub fn trade(schema: &PlatformSchema, side: Side) -> Self {
        let layout = &schema.trade(side).layout;
        Self::fixed(
            InstructionKind::Trade(schema.platform),
            schema.program_id,
            account_metas::trade_flags(schema),
            &layout.discriminator,
            layout.data_len(),
        )
    }

    pub fn with_interchangeable(mut self, range: Range<usize>) -> Self {
        self.interchangeable.push(range);
        self
    }
}

/// Structural check of `ix` against `template`
pub fn validate(template: &InstructionTemplate, ix: &Instruction) -> LaunchpadResult<()> {
    let reject = |reason: String| {
        log::warn!("rejected {} instruction: {reason}", template.kind);
        Err(LaunchpadError::InvalidInstructionShape {
            kind: template.kind,
            reason,
        })
    };

    if ix.program_id != template.program_id {
        return reject(format!(
            "targets {}, expected {}",
            ix.program_id, template.program_id
        ));
    }
    if ix.accounts.len() != template.accounts.len() {
        return reject(format!(
            "{} accounts, expected {}",
            ix.accounts.len(),
            template.accounts.len()
        ));
    }
    for (index, (meta, flags)) in ix.accounts.iter().zip(&template.accounts).enumerate() {
        let (writable, signer) = (meta.is_writable, meta.is_signer);
        if writable != flags.writable {
            return reject(format!("account {index} writable flag is {writable}"));
        }
        if signer != flags.signer {
            return reject(format!("account {index} signer flag is {signer}"));
        }
    }
    if !ix.data.starts_with(&template.data_prefix) {
        return reject("payload prefix does not match".to_string());
    }
    if ix.data.len() < template.min_data_len {
        return reject(format!(
            "payload of {} bytes, expected at least {}",
            ix.data.len(),
            template.min_data_len
        ));
    }
    Ok(())
}
