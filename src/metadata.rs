use anchor_lang::AnchorDeserialize;
use solana_sdk::pubkey::Pubkey;

use crate::error::{LaunchpadError, LaunchpadResult};
use crate::types::TokenInfo;

/// Leading fields of a Metaplex token metadata account
#[derive(AnchorDeserialize, Clone)]
struct MetadataHeader {
    _key: u8,
    _update_authority: [u8; 32],
    mint: [u8; 32],
    name: String,
    symbol: String,
    uri: String,
}

pub fn decode_token_metadata(
    account: &Pubkey,
    expected_mint: &Pubkey,
    data: &[u8],
) -> LaunchpadResult<TokenInfo> {
    let malformed = |reason: String| LaunchpadError::MalformedAccountData {
        account: *account,
        reason,
    };
    let header = MetadataHeader::deserialize(&mut &data[..])
        .map_err(|e| malformed(format!("metadata: {e}")))?;

    let mint = Pubkey::new_from_array(header.mint);
    if mint != *expected_mint {
        return Err(malformed(format!("metadata describes mint {mint}")));
    }

    Ok(TokenInfo {
        mint,
        name: trim_padding(&header.name),
        symbol: trim_padding(&header.symbol),
        uri: trim_padding(&header.uri),
    })
}

fn trim_padding(value: &str) -> String {
    value.trim_end_matches('\0').trim().to_string()
}
