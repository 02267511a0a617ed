//! The only way an instruction reaches an [`UnsignedTransaction`].
//!
//! Every instruction goes through the allowlist, then structural
//! validation against its template, then sanitization. The first failure
//! ends the build.
//!
//! [`UnsignedTransaction`]: crate::transaction::UnsignedTransaction

mod allowlist;
mod sanitizer;
mod validator;

use std::sync::Arc;

use solana_sdk::instruction::Instruction;

use crate::error::LaunchpadResult;

pub use allowlist::ProgramAllowlist;
pub use sanitizer::sanitize;
pub use validator::{AccountFlags, InstructionKind, InstructionTemplate, validate};

/// An instruction that passed every gate check
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdmittedInstruction {
    kind: InstructionKind,
    instruction: Instruction,
}

impl AdmittedInstruction {
    pub fn kind(&self) -> InstructionKind {
        self.kind
    }

    pub fn instruction(&self) -> &Instruction {
        &self.instruction
    }

    pub fn into_instruction(self) -> Instruction {
        self.instruction
    }
}

#[derive(Clone, Debug)]
pub struct SafetyGate {
    allowlist: Arc<ProgramAllowlist>,
}

impl SafetyGate {
    pub fn new(allowlist: Arc<ProgramAllowlist>) -> Self {
        Self { allowlist }
    }

    pub fn allowlist(&self) -> &Arc<ProgramAllowlist> {
        &self.allowlist
    }

    pub fn admit(
        &self,
        template: &InstructionTemplate,
        ix: &Instruction,
    ) -> LaunchpadResult<AdmittedInstruction> {
        self.allowlist.check(&ix.program_id)?;
        validate(template, ix)?;
        let instruction = sanitize(template, ix);
        Ok(AdmittedInstruction {
            kind: template.kind,
            instruction,
        })
    }
}
