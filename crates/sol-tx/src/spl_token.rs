//! SPL Token instructions.
//!
//! Builds the token program instructions a wallet needs (transfer and
//! set-authority) and derives associated token account addresses, without
//! the `spl-token` crate.

use crate::error::TransactionError;
use crate::instruction::{AccountMeta, Instruction};
use crate::pubkey::Pubkey;

// ---------------------------------------------------------------------------
// Well-known program IDs
// ---------------------------------------------------------------------------

/// SPL Token Program ID: `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79, 0xac,
    0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff, 0x00, 0xa9,
]);

/// Associated Token Account Program ID: `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e, 0x0d, 0x83,
    0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8, 0xdb, 0xe9, 0xf8, 0x59,
]);

// Token instruction tags (first data byte).
const TRANSFER_IX_TAG: u8 = 3;
const SET_AUTHORITY_IX_TAG: u8 = 6;

/// Which authority a `SetAuthority` instruction replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AuthorityType {
    /// Authority to mint new tokens.
    MintTokens = 0,
    /// Authority to freeze any account of the mint.
    FreezeAccount = 1,
    /// Owner of a token account.
    AccountOwner = 2,
    /// Authority to close a token account.
    CloseAccount = 3,
}

/// The owner signs directly, or (multisig) is a read-only account and each
/// of `signers` signs.
fn push_authority(accounts: &mut Vec<AccountMeta>, owner: &Pubkey, signers: &[Pubkey]) {
    if signers.is_empty() {
        accounts.push(AccountMeta::new_readonly(*owner, true));
    } else {
        accounts.push(AccountMeta::new_readonly(*owner, false));
        accounts.extend(signers.iter().map(|s| AccountMeta::new_readonly(*s, true)));
    }
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// Build an SPL Token `Transfer` instruction.
///
/// `amount` is in the token's smallest unit. `multisig_signers` is empty
/// unless `owner` is a multisig account.
///
/// Data: tag 3, then u64 LE amount (9 bytes).
pub fn transfer(
    source: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
    amount: u64,
    multisig_signers: &[Pubkey],
) -> Result<Instruction, TransactionError> {
    if amount == 0 {
        return Err(TransactionError::InvalidInstruction(
            "token transfer amount must be > 0".into(),
        ));
    }

    let mut data = Vec::with_capacity(9);
    data.push(TRANSFER_IX_TAG);
    data.extend_from_slice(&amount.to_le_bytes());

    let mut accounts = vec![
        AccountMeta::new(*source, false),
        AccountMeta::new(*destination, false),
    ];
    push_authority(&mut accounts, owner, multisig_signers);

    Ok(Instruction::new(TOKEN_PROGRAM_ID, accounts, data))
}

/// Build an SPL Token `SetAuthority` instruction on a mint or token account.
///
/// `new_authority = None` removes the authority. The option is encoded with
/// an explicit tag byte: `[6, type, 0]` or `[6, type, 1, key (32 bytes)]`.
pub fn set_authority(
    account: &Pubkey,
    current_authority: &Pubkey,
    authority_type: AuthorityType,
    new_authority: Option<&Pubkey>,
    multisig_signers: &[Pubkey],
) -> Instruction {
    let mut data = Vec::with_capacity(35);
    data.push(SET_AUTHORITY_IX_TAG);
    data.push(authority_type as u8);
    match new_authority {
        Some(key) => {
            data.push(1);
            data.extend_from_slice(key.as_ref());
        }
        None => data.push(0),
    }

    let mut accounts = vec![AccountMeta::new(*account, false)];
    push_authority(&mut accounts, current_authority, multisig_signers);

    Instruction::new(TOKEN_PROGRAM_ID, accounts, data)
}

// ---------------------------------------------------------------------------
// Associated Token Account (PDA) derivation
// ---------------------------------------------------------------------------

/// Derive the associated token account address for a wallet + mint pair.
///
/// Seeds are `[wallet, token_program_id, mint]` under the associated token
/// account program.
pub fn associated_token_address(wallet: &Pubkey, mint: &Pubkey) -> Result<Pubkey, TransactionError> {
    Pubkey::find_program_address(
        &[wallet.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .map(|(address, _bump)| address)
}
