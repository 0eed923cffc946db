use std::fmt;
use std::str::FromStr;

use crate::error::TransactionError;

/// Number of bytes in a block hash.
pub const HASH_BYTES: usize = 32;

/// A recent block identifier: the freshness token a message is anchored to,
/// or the stored value of a durable nonce account.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Blockhash([u8; HASH_BYTES]);

impl Blockhash {
    pub const fn new_from_array(bytes: [u8; HASH_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; HASH_BYTES] {
        self.0
    }
}

impl From<[u8; HASH_BYTES]> for Blockhash {
    fn from(bytes: [u8; HASH_BYTES]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Blockhash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Blockhash {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TransactionError::InvalidEncoding(format!("base58 decode failed: {e}")))?;
        let arr: [u8; HASH_BYTES] = bytes.try_into().map_err(|v: Vec<u8>| {
            TransactionError::InvalidEncoding(format!(
                "blockhash must be 32 bytes, got {}",
                v.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
