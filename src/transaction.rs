use std::collections::BTreeSet;
use std::time::Duration;

use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::{VersionedMessage, v0},
    packet::PACKET_DATA_SIZE,
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};

use crate::codec::{read_u32, read_u64};
use crate::error::{LaunchpadError, LaunchpadResult};
use crate::safety::{AdmittedInstruction, InstructionKind, InstructionTemplate, SafetyGate};
use crate::types::{Platform, Quote};

/// Ordered, gate-admitted instructions plus their fee metadata.
///
/// Holds no key material. Signing happens outside the crate on the
/// compiled [`VersionedTransaction`].
#[derive(Clone, Debug, PartialEq)]
pub struct UnsignedTransaction {
    platform: Platform,
    fee_payer: Pubkey,
    instructions: Vec<AdmittedInstruction>,
    compute_unit_limit: u32,
    compute_unit_price: u64,
    quotes: Vec<Quote>,
    timing_jitter: Option<Duration>,
}

impl UnsignedTransaction {
    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn fee_payer(&self) -> &Pubkey {
        &self.fee_payer
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().map(AdmittedInstruction::instruction)
    }

    pub fn instruction_kinds(&self) -> Vec<InstructionKind> {
        self.instructions.iter().map(AdmittedInstruction::kind).collect()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn compute_unit_limit(&self) -> u32 {
        self.compute_unit_limit
    }

    /// Micro-lamports per compute unit
    pub fn compute_unit_price(&self) -> u64 {
        self.compute_unit_price
    }

    /// Quotes the trade instructions were encoded from, one per slice
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    /// Advisory delay for the scheduler that submits this transaction
    pub fn timing_jitter(&self) -> Option<Duration> {
        self.timing_jitter
    }

    /// Fee payer plus every account an instruction marks writable, sorted
    pub fn writable_accounts(&self) -> Vec<Pubkey> {
        let mut accounts = BTreeSet::from([self.fee_payer]);
        for ix in self.instructions() {
            for meta in ix.accounts.iter().filter(|m| m.is_writable) {
                accounts.insert(meta.pubkey);
            }
        }
        accounts.into_iter().collect()
    }

    /// Compile a v0 message with placeholder signatures for each required
    /// signer, ready for an external signer to fill in.
    pub fn to_versioned(&self, recent_blockhash: Hash) -> LaunchpadResult<VersionedTransaction> {
        let instructions: Vec<Instruction> = self.instructions().cloned().collect();
        let message_v0 =
            v0::Message::try_compile(&self.fee_payer, &instructions, &[], recent_blockhash)
                .map_err(|e| LaunchpadError::Internal(format!("message compile failed: {e}")))?;
        let signers = message_v0.header.num_required_signatures as usize;

        Ok(VersionedTransaction {
            signatures: vec![Signature::default(); signers],
            message: VersionedMessage::V0(message_v0),
        })
    }

    /// Wire size of the signed transaction
    pub fn serialized_size(&self) -> LaunchpadResult<usize> {
        let tx = self.to_versioned(Hash::default())?;
        bincode::serialized_size(&tx)
            .map(|size| size as usize)
            .map_err(|e| LaunchpadError::Internal(e.to_string()))
    }
}

/// Assembles an [`UnsignedTransaction`], admitting each instruction through
/// the [`SafetyGate`] as it is added.
pub struct TransactionBuilder<'a> {
    gate: &'a SafetyGate,
    platform: Platform,
    fee_payer: Pubkey,
    instructions: Vec<AdmittedInstruction>,
    compute_unit_limit: u32,
    compute_unit_price: u64,
    quotes: Vec<Quote>,
    timing_jitter: Option<Duration>,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(gate: &'a SafetyGate, platform: Platform, fee_payer: Pubkey) -> Self {
        Self {
            gate,
            platform,
            fee_payer,
            instructions: Vec::new(),
            compute_unit_limit: 0,
            compute_unit_price: 0,
            quotes: Vec::new(),
            timing_jitter: None,
        }
    }

    /// Unit limit always, unit price only when non-zero
    pub fn compute_budget(&mut self, limit: u32, price: u64) -> LaunchpadResult<()> {
        use solana_sdk::compute_budget::ComputeBudgetInstruction;

        let admitted = self.gate.admit(
            &InstructionTemplate::compute_unit_limit(),
            &ComputeBudgetInstruction::set_compute_unit_limit(limit),
        )?;
        self.compute_unit_limit = read_u32(&admitted.instruction().data, 1).unwrap_or(limit);
        self.instructions.push(admitted);

        if price > 0 {
            let admitted = self.gate.admit(
                &InstructionTemplate::compute_unit_price(),
                &ComputeBudgetInstruction::set_compute_unit_price(price),
            )?;
            self.compute_unit_price = read_u64(&admitted.instruction().data, 1).unwrap_or(price);
            self.instructions.push(admitted);
        }
        Ok(())
    }

    pub fn push(
        &mut self,
        template: &InstructionTemplate,
        ix: &Instruction,
    ) -> LaunchpadResult<()> {
        let admitted = self.gate.admit(template, ix)?;
        self.instructions.push(admitted);
        Ok(())
    }

    pub fn record_quote(&mut self, quote: Quote) {
        self.quotes.push(quote);
    }

    pub fn timing_jitter(&mut self, jitter: Option<Duration>) {
        self.timing_jitter = jitter;
    }

    /// Fails if the transaction would not fit in one packet
    pub fn build(self) -> LaunchpadResult<UnsignedTransaction> {
        let tx = UnsignedTransaction {
            platform: self.platform,
            fee_payer: self.fee_payer,
            instructions: self.instructions,
            compute_unit_limit: self.compute_unit_limit,
            compute_unit_price: self.compute_unit_price,
            quotes: self.quotes,
            timing_jitter: self.timing_jitter,
        };

        let size = tx.serialized_size()?;
        if size > PACKET_DATA_SIZE {
            return Err(LaunchpadError::InvalidTradeArgs(format!(
                "transaction of {size} bytes exceeds the {PACKET_DATA_SIZE} byte packet limit"
            )));
        }
        Ok(tx)
    }
}
