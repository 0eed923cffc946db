//! Signatures and the signing / verification capabilities the envelope
//! calls out to.
//!
//! The codec treats signatures as opaque 64-byte values. Producing and
//! checking them is delegated to [`Signer`] and [`Verifier`]; [`Keypair`]
//! and [`Ed25519Verifier`] are the Ed25519 implementations backed by
//! `ed25519-dalek`.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::Signer as _;
use rand_core::OsRng;
use zeroize::Zeroize;

use crate::error::TransactionError;
use crate::pubkey::Pubkey;

/// Number of bytes in a signature.
pub const SIGNATURE_BYTES: usize = 64;

/// A 64-byte Ed25519 signature over serialized message bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_BYTES]);

impl Signature {
    pub const fn new_from_array(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }

    /// The all-zero placeholder written for a slot nobody has signed yet.
    pub fn is_default(&self) -> bool {
        self.0 == [0u8; SIGNATURE_BYTES]
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_BYTES])
    }
}

impl From<[u8; SIGNATURE_BYTES]> for Signature {
    fn from(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = TransactionError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; SIGNATURE_BYTES] = bytes
            .try_into()
            .map_err(|_| TransactionError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(arr))
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Signature {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TransactionError::InvalidEncoding(format!("base58 decode failed: {e}")))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Something that holds a private key and can sign message bytes.
pub trait Signer {
    fn pubkey(&self) -> Pubkey;

    fn sign_message(&self, message: &[u8]) -> Signature;
}

/// Checks a signature against a public key and message bytes.
pub trait Verifier {
    fn verify(&self, pubkey: &Pubkey, message: &[u8], signature: &Signature) -> bool;
}

/// Strict Ed25519 verification.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl Verifier for Ed25519Verifier {
    fn verify(&self, pubkey: &Pubkey, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = ed25519_dalek::VerifyingKey::from_bytes(pubkey.as_array()) else {
            return false;
        };
        let signature = ed25519_dalek::Signature::from_bytes(&signature.0);
        verifying_key.verify_strict(message, &signature).is_ok()
    }
}

/// An Ed25519 keypair. The signing key is wiped on drop by `ed25519-dalek`.
pub struct Keypair {
    signing_key: ed25519_dalek::SigningKey,
}

impl Keypair {
    pub fn generate() -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut OsRng),
        }
    }

    /// Build a keypair from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let mut seed = *seed;
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
        seed.zeroize();
        Self { signing_key }
    }

    /// Build a keypair from the 64-byte `secret || public` form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut keypair_bytes: [u8; 64] = bytes.try_into().map_err(|_| {
            TransactionError::InvalidPrivateKey(format!("expected 64 bytes, got {}", bytes.len()))
        })?;
        let result = ed25519_dalek::SigningKey::from_keypair_bytes(&keypair_bytes);
        keypair_bytes.zeroize();

        let signing_key = result.map_err(|e| TransactionError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { signing_key })
    }

    /// The 64-byte `secret || public` form.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.signing_key.to_keypair_bytes()
    }
}

impl Signer for Keypair {
    fn pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.signing_key.verifying_key().to_bytes())
    }

    fn sign_message(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

/// A signer slot argument: either a bare public key whose signature will be
/// supplied later, or a signer that can sign now.
pub enum SignerSource<'a> {
    Unresolved(Pubkey),
    Resolved(&'a dyn Signer),
}

impl SignerSource<'_> {
    pub fn pubkey(&self) -> Pubkey {
        match self {
            SignerSource::Unresolved(pubkey) => *pubkey,
            SignerSource::Resolved(signer) => signer.pubkey(),
        }
    }
}

impl From<Pubkey> for SignerSource<'_> {
    fn from(pubkey: Pubkey) -> Self {
        SignerSource::Unresolved(pubkey)
    }
}

impl<'a> From<&'a Keypair> for SignerSource<'a> {
    fn from(keypair: &'a Keypair) -> Self {
        SignerSource::Resolved(keypair)
    }
}

impl<'a> From<&'a dyn Signer> for SignerSource<'a> {
    fn from(signer: &'a dyn Signer) -> Self {
        SignerSource::Resolved(signer)
    }
}

impl fmt::Debug for SignerSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerSource::Unresolved(pubkey) => f.debug_tuple("Unresolved").field(pubkey).finish(),
            SignerSource::Resolved(signer) => {
                f.debug_tuple("Resolved").field(&signer.pubkey()).finish()
            }
        }
    }
}
