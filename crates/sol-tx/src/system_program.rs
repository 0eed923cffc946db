//! System program instructions used by the envelope itself: lamport
//! transfers and the advance-nonce instruction a durable-nonce transaction
//! starts with.

use crate::instruction::{AccountMeta, Instruction};
use crate::pubkey::Pubkey;

/// The system program: 32 zero bytes.
/// Base58: `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new_from_array([0u8; 32]);

/// The recent-blockhashes sysvar read by `AdvanceNonceAccount`.
/// Base58: `SysvarRecentB1ockHashes11111111111111111111`
pub const RECENT_BLOCKHASHES_SYSVAR_ID: Pubkey = Pubkey::new_from_array([
    0x06, 0xa7, 0xd5, 0x17, 0x19, 0x2c, 0x56, 0x8e, 0xe0, 0x8a, 0x84, 0x5f, 0x73, 0xd2, 0x97, 0x88,
    0xcf, 0x03, 0x5c, 0x31, 0x45, 0xb2, 0x1a, 0xb3, 0x44, 0xd8, 0x06, 0x2e, 0xa9, 0x40, 0x00, 0x00,
]);

// System instruction indices (little-endian u32 on the wire).
const ADVANCE_NONCE_ACCOUNT_IX_INDEX: u32 = 4;
const TRANSFER_IX_INDEX: u32 = 2;

/// Move `lamports` from `from` (writable signer) to `to` (writable).
pub fn transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    // u32 LE instruction index + u64 LE lamports.
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&TRANSFER_IX_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    Instruction::new(
        SYSTEM_PROGRAM_ID,
        vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
        data,
    )
}

/// Consume the stored nonce of `nonce_account` and store a fresh one.
///
/// Must be the first instruction of a durable-nonce transaction;
/// `authority` signs.
pub fn advance_nonce_account(nonce_account: &Pubkey, authority: &Pubkey) -> Instruction {
    Instruction::new(
        SYSTEM_PROGRAM_ID,
        vec![
            AccountMeta::new(*nonce_account, false),
            AccountMeta::new_readonly(RECENT_BLOCKHASHES_SYSVAR_ID, false),
            AccountMeta::new_readonly(*authority, true),
        ],
        ADVANCE_NONCE_ACCOUNT_IX_INDEX.to_le_bytes().to_vec(),
    )
}
