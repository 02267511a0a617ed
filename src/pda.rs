use solana_sdk::pubkey::{Pubkey, PubkeyError};

use crate::constants::{METADATA_PROGRAM_ID, METADATA_SEED, WSOL_MINT};
use crate::error::{LaunchpadError, LaunchpadResult};
use crate::schema::{PlatformSchema, SeedPart};

/// Bump seeds tried, 255 down to 0
pub const MAX_BUMP_ATTEMPTS: usize = 256;

/// Bounded bump search returning the first off-curve address and its bump.
///
/// Fails with `DerivationExhausted` once every bump has been tried. Inputs no
/// bump can fix are reported the same way without walking the remaining bumps:
/// a seed over 32 bytes, more than 15 seeds (the bump is the sixteenth), or a
/// program id the runtime refuses as a PDA owner.
pub fn derive_program_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> LaunchpadResult<(Pubkey, u8)> {
    for bump in (0..MAX_BUMP_ATTEMPTS).rev() {
        let bump_seed = [bump as u8];
        let mut with_bump: Vec<&[u8]> = seeds.to_vec();
        with_bump.push(&bump_seed);
        match Pubkey::create_program_address(&with_bump, program_id) {
            Ok(address) => return Ok((address, bump_seed[0])),
            Err(PubkeyError::InvalidSeeds) => continue,
            Err(e) => {
                log::debug!("program address search for {program_id} aborted: {e}");
                break;
            }
        }
    }
    Err(LaunchpadError::DerivationExhausted(*program_id))
}

/// Address of the account holding `mint`'s curve on this platform
pub fn curve_address(schema: &PlatformSchema, mint: &Pubkey) -> LaunchpadResult<Pubkey> {
    let seeds: Vec<&[u8]> = schema
        .curve_seeds
        .iter()
        .map(|part| match part {
            SeedPart::Literal(bytes) => *bytes,
            SeedPart::Mint => mint.as_ref(),
            SeedPart::QuoteMint => WSOL_MINT.as_ref(),
        })
        .collect();
    let (address, _) = derive_program_address(&seeds, &schema.program_id)?;
    Ok(address)
}

pub fn program_pda(seeds: &[&[u8]], program_id: &Pubkey) -> LaunchpadResult<Pubkey> {
    derive_program_address(seeds, program_id).map(|(address, _)| address)
}

pub fn associated_token_address(
    wallet: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> LaunchpadResult<Pubkey> {
    program_pda(
        &[wallet.as_ref(), token_program.as_ref(), mint.as_ref()],
        &spl_associated_token_account::ID,
    )
}

pub fn metadata_address(mint: &Pubkey) -> LaunchpadResult<Pubkey> {
    program_pda(
        &[METADATA_SEED, METADATA_PROGRAM_ID.as_ref(), mint.as_ref()],
        &METADATA_PROGRAM_ID,
    )
}
