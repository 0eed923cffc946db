use thiserror::Error;

use crate::pubkey::Pubkey;

/// Errors raised while compiling, signing, encoding or decoding transactions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    // -- structural ---------------------------------------------------------
    #[error("malformed compact length encoding")]
    MalformedLength,

    #[error("message truncated: {0}")]
    TruncatedMessage(String),

    #[error("account index {index} out of range for {len} account keys")]
    IndexOutOfRange { index: u8, len: usize },

    #[error("invalid signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    #[error("invalid message header: {0}")]
    InvalidHeader(String),

    #[error("{0} trailing bytes after transaction")]
    TrailingBytes(usize),

    #[error("invalid instruction: {0}")]
    InvalidInstruction(String),

    // -- preconditions ------------------------------------------------------
    #[error("transaction recent blockhash required")]
    MissingBlockhash,

    #[error("no instructions provided")]
    EmptyInstructions,

    #[error("transaction fee payer required")]
    MissingFeePayer,

    #[error("unknown signer: {0}")]
    UnknownSigner(Pubkey),

    #[error("account key {0} missing from the account table")]
    UnknownAccountKey(Pubkey),

    #[error("too many account keys: {0} (max 256)")]
    TooManyAccounts(usize),

    // -- integrity ----------------------------------------------------------
    #[error("transaction has not been signed")]
    Unsigned,

    #[error("transaction has not been signed correctly")]
    BadSignature,

    #[error("transaction too large: {size} > {max}")]
    TooLarge { size: usize, max: usize },

    #[error("too many signatures to encode: {0}")]
    TooManySignatures(usize),

    // -- keys and encodings -------------------------------------------------
    #[error("invalid public key: {0}")]
    InvalidPubkey(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid seeds: {0}")]
    InvalidSeeds(String),

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
}
