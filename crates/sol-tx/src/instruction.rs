use crate::hash::Blockhash;
use crate::pubkey::Pubkey;

/// A single account reference in an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    /// The transaction must carry a signature from this key.
    pub is_signer: bool,
    /// The instruction may mutate this account.
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// An instruction before compilation: a program to invoke, the accounts it
/// touches and opaque input data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new(program_id: Pubkey, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program_id,
            accounts,
            data,
        }
    }
}

/// A compiled instruction where account references are replaced by u8 indices
/// into the message's `account_keys` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    /// Index into `account_keys` for the program to invoke.
    pub program_id_index: u8,
    /// Indices into `account_keys` for each account the instruction reads/writes.
    pub accounts: Vec<u8>,
    /// Opaque instruction data.
    pub data: Vec<u8>,
}

/// Durable nonce parameters. When present on a transaction, `nonce` replaces
/// the recent blockhash and `nonce_instruction` (an advance-nonce instruction)
/// runs first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceInformation {
    pub nonce: Blockhash,
    pub nonce_instruction: Instruction,
}
