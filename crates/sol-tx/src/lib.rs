//! Solana legacy transaction compiler and wire codec.
//!
//! Turns a list of instructions into the canonical signed message, signs it
//! through pluggable [`Signer`]s, and encodes / decodes the bit-exact wire
//! format RPC nodes accept. No `solana-sdk` dependency: the format is
//! implemented by hand with `ed25519-dalek` for signatures, `bs58` for key
//! text and `base64` for the RPC encoding.
//!
//! Network transport, fee estimation and versioned (v0) messages are out of
//! scope.

pub mod account_keys;
pub mod error;
pub mod hash;
pub mod instruction;
pub mod message;
pub mod pubkey;
pub mod short_vec;
pub mod signature;
pub mod spl_token;
pub mod system_program;
pub mod transaction;

// Re-export key public types for ergonomic imports.
pub use error::TransactionError;
pub use hash::{Blockhash, HASH_BYTES};
pub use instruction::{AccountMeta, CompiledInstruction, Instruction, NonceInformation};
pub use message::{Message, MessageHeader};
pub use pubkey::{Pubkey, PUBKEY_BYTES};
pub use signature::{
    Ed25519Verifier, Keypair, Signature, Signer, SignerSource, Verifier, SIGNATURE_BYTES,
};
pub use transaction::{
    SerializeConfig, SigPubkeyPair, Transaction, TransactionItem, MAX_SIGNATURES,
    PACKET_DATA_SIZE,
};

pub type Result<T> = std::result::Result<T, TransactionError>;
